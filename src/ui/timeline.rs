//! Timeline view rendering.
//!
//! A one-line filter bar above the filtered, newest-first anomaly table.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::{Dimension, UNKNOWN};

/// Render the Timeline view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Length(1), Constraint::Min(3)]).split(area);

    render_filter_bar(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
}

fn render_filter_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (key, dimension) in [('m', Dimension::Metric), ('v', Dimension::Severity), ('o', Dimension::Source)] {
        let selector = app.filter.selector(dimension);
        let style = if selector.is_all() {
            Style::default().add_modifier(Modifier::DIM)
        } else {
            Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD)
        };
        spans.push(Span::raw(format!("{}:{} ", key, dimension.label())));
        spans.push(Span::styled(format!("[{}]", selector.label()), style));
        spans.push(Span::raw("  "));
    }
    if !app.filter.is_unfiltered() {
        spans.push(Span::styled("c:clear", Style::default().add_modifier(Modifier::DIM)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.visible_rows();

    let header = Row::new(vec![
        Cell::from("Timestamp"),
        Cell::from("Source"),
        Cell::from("Metric"),
        Cell::from("Value"),
        Cell::from("Severity"),
        Cell::from("Trend"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = visible
        .iter()
        .map(|row| {
            let severity_style = app.theme.severity_style(row.severity());
            let mut severity = vec![Span::styled(row.severity().to_string(), severity_style)];
            if row.severity.is_inferred() {
                severity.push(Span::styled(" *", Style::default().add_modifier(Modifier::DIM)));
            }

            Row::new(vec![
                Cell::from(row.timestamp().to_string()),
                Cell::from(row.source().to_string()),
                Cell::from(row.metric().unwrap_or(UNKNOWN).to_string()),
                Cell::from(format_value(row.value())),
                Cell::from(Line::from(severity)),
                Cell::from(row.event.trend.clone().unwrap_or_else(|| "-".to_string())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3), // Timestamp
        Constraint::Fill(2), // Source
        Constraint::Fill(1), // Metric
        Constraint::Fill(1), // Value
        Constraint::Min(10), // Severity with inferred marker
        Constraint::Fill(1), // Trend
    ];

    let selected = app.selected_index.min(visible.len().saturating_sub(1));

    let position_info = if visible.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, visible.len())
    };
    let error_info = app
        .store
        .last_error()
        .map(|e| format!(" [stale: {}]", e))
        .unwrap_or_default();

    let title = format!(
        " Anomalies ({}/{}){}{} * inferred ",
        visible.len(),
        app.store.len(),
        position_info,
        error_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !visible.is_empty() {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

/// Render a reading the way the export does, or `-` when missing.
fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(92.0)), "92");
        assert_eq!(format_value(Some(92.5)), "92.5");
        assert_eq!(format_value(None), "-");
    }
}
