//! Live Metrics view rendering.
//!
//! Line chart of the CPU/RAM/Disk window with the latest reading below it.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::Series;

/// Render the Live Metrics view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Min(6), Constraint::Length(1)]).split(area);

    render_chart(frame, app, chunks[0]);
    render_latest(frame, app, chunks[1]);
}

fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Live Metrics ({}/{} samples) ", app.window.len(), app.window.capacity()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.window.is_empty() {
        let hint = match app.push_description() {
            Some(_) if app.push_running() => " Waiting for metrics_update...",
            Some(_) => " Push channel stopped",
            None => " No push channel configured (--push HOST:PORT)",
        };
        let paragraph = Paragraph::new(hint)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let segments: Vec<(Series, Vec<Vec<(f64, f64)>>)> = Series::ALL
        .iter()
        .map(|&series| (series, segments(&app.window.series(series))))
        .collect();

    let mut datasets = Vec::new();
    for (series, parts) in &segments {
        let style = Style::default().fg(app.theme.series_color(*series));
        for (i, points) in parts.iter().enumerate() {
            let mut dataset = Dataset::default()
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(style)
                .data(points);
            // Name only the first segment so the legend lists each series once
            if i == 0 {
                dataset = dataset.name(series.label());
            }
            datasets.push(dataset);
        }
    }

    let labels = app.window.labels();
    let x_max = app.window.capacity().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span> = match (labels.first(), labels.last()) {
        (Some(first), Some(last)) if labels.len() > 1 => {
            vec![Span::raw(first.to_string()), Span::raw(last.to_string())]
        }
        (Some(only), _) => vec![Span::raw(only.to_string())],
        _ => Vec::new(),
    };

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("%")
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, 100.0])
                .labels(["0", "50", "100"]),
        );

    frame.render_widget(chart, area);
}

fn render_latest(frame: &mut Frame, app: &App, area: Rect) {
    let Some(latest) = app.window.latest() else {
        return;
    };

    let mut spans = vec![Span::raw(format!(" {} ", latest.timestamp))];
    for series in Series::ALL {
        let reading = latest
            .value(series)
            .map(|v| format!("{:.1}", v))
            .unwrap_or_else(|| "-".to_string());
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(
            format!("{} {} ", series.label(), reading),
            Style::default().fg(app.theme.series_color(series)),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Split a series into runs of present points; a missing reading breaks the line.
fn segments(points: &[(usize, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for &(x, y) in points {
        match y {
            Some(y) => current.push((x as f64, y)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}
