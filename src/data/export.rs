//! CSV export of the visible timeline rows.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use super::event::DerivedEvent;

/// Column order of the exported document.
pub const CSV_HEADERS: [&str; 5] = ["timestamp", "source", "metric", "value", "severity"];

/// Errors that can occur when exporting rows.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Nothing is visible; the export is refused rather than writing headers only.
    #[error("No rows to export")]
    Empty,

    /// Writing the export file failed.
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Render rows as CSV in the order given.
///
/// Every field is double-quoted with embedded quotes doubled. Missing
/// fields render as `""`.
pub fn to_csv(rows: &[DerivedEvent]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for row in rows {
        let value = row.event.value.map(|v| v.to_string());
        let fields = [
            row.event.timestamp.as_deref(),
            row.event.source.as_deref(),
            row.event.metric.as_deref(),
            value.as_deref(),
            Some(row.severity()),
        ];
        let line: Vec<String> = fields.iter().map(|f| quote(f.unwrap_or(""))).collect();
        lines.push(line.join(","));
    }

    Ok(lines.join("\n"))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// File name for an export taken at `now`.
///
/// `anomaly_timeline_` followed by the ISO timestamp with `:` and `T`
/// replaced by `-`, cut to 19 characters.
pub fn export_filename(now: DateTime<Utc>) -> String {
    let stamp: String = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', 'T'], "-")
        .chars()
        .take(19)
        .collect();
    format!("anomaly_timeline_{}.csv", stamp)
}

/// Write rows as CSV into `dir`, returning the created file's path.
pub fn write_export(
    dir: &Path,
    rows: &[DerivedEvent],
    now: DateTime<Utc>,
) -> Result<PathBuf, ExportError> {
    let document = to_csv(rows)?;
    fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(now));
    fs::write(&path, document)?;
    Ok(path)
}
