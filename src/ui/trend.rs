//! Anomaly Trend view rendering.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;

/// Render the Anomaly Trend view: value of each visible anomaly, oldest first.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let trend = app.trend();

    let block = Block::default()
        .title(format!(" Anomaly Trend ({} points) ", trend.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if trend.is_empty() {
        let paragraph = Paragraph::new(" No anomaly values to plot")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let dataset = Dataset::default()
        .name("Anomaly Value")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.high))
        .data(&trend.points);

    let x_labels: Vec<Span> = match (trend.first_label(), trend.last_label()) {
        (Some(first), Some(last)) if trend.len() > 1 => vec![Span::raw(first), Span::raw(last)],
        (Some(only), _) => vec![Span::raw(only)],
        _ => Vec::new(),
    };

    let y_max = trend.y_max();
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, trend.x_max()])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, y_max])
                .labels(["0".to_string(), format!("{:.0}", y_max / 2.0), format!("{:.0}", y_max)]),
        );

    frame.render_widget(chart, area);
}
