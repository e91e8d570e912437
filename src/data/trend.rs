//! Anomaly values plotted over time.
//!
//! Built from the projected rows, so the chart follows the same filters as
//! the table. Rows without a value are left out.

use super::event::DerivedEvent;

/// Points for the anomaly trend chart, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trend {
    /// `(position, value)` pairs.
    pub points: Vec<(f64, f64)>,
    /// Timestamp of each point, same order as `points`.
    pub labels: Vec<String>,
}

impl Trend {
    /// Build from rows in projection order (newest first).
    pub fn from_rows(rows: &[DerivedEvent]) -> Self {
        let mut trend = Trend::default();
        for row in rows.iter().rev() {
            let Some(value) = row.value() else {
                continue;
            };
            trend.points.push((trend.points.len() as f64, value));
            trend.labels.push(row.timestamp().to_string());
        }
        trend
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    pub fn last_label(&self) -> Option<&str> {
        self.labels.last().map(String::as_str)
    }

    /// Upper y bound: the largest value with some headroom, never below 1.
    pub fn y_max(&self) -> f64 {
        let max = self.points.iter().map(|&(_, y)| y).fold(0.0_f64, f64::max);
        (max * 1.1).max(1.0)
    }

    /// Upper x bound; at least 1 so a single point still has an axis.
    pub fn x_max(&self) -> f64 {
        self.len().saturating_sub(1).max(1) as f64
    }
}
