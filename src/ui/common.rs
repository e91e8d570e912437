//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};

/// Render the header bar: collector indicator and backup job counts.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status = app.connection.status();
    let mut spans = vec![
        Span::styled(" ● ", Style::default().fg(app.theme.connection_color(status))),
        Span::styled("BACKWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(status.label()),
        Span::raw(" │ "),
    ];

    match &app.stats {
        Some(stats) => {
            spans.push(Span::styled(
                format!("{}", stats.total),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(" jobs "));
            spans.push(Span::styled(format!("{}", stats.success), Style::default().fg(app.theme.low)));
            spans.push(Span::raw(" ok "));
            spans.push(if stats.failed > 0 {
                Span::styled(
                    format!("{}", stats.failed),
                    Style::default().fg(app.theme.high).add_modifier(Modifier::BOLD),
                )
            } else {
                Span::styled("0", Style::default().add_modifier(Modifier::DIM))
            });
            spans.push(Span::raw(" failed "));
            spans.push(Span::raw(format!("{} pending │ ", stats.pending)));
            spans.push(Span::raw(format!("{:.1}% success", stats.success_rate)));
        }
        None => spans.push(Span::styled("Job stats unavailable", Style::default().add_modifier(Modifier::DIM))),
    }

    if app.alerts_received > 0 {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("{} alerts", app.alerts_received),
            Style::default().fg(app.theme.medium),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .map(|view| Line::from(format!(" {}:{} ", view.index() + 1, view.label())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the feed, time since the last applied snapshot and the controls.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Timeline => "m/v/o:filter c:clear e:export r:refresh ?:help q:quit",
        View::Metrics => "Tab:switch r:refresh ?:help q:quit",
        View::Trend => "m/v/o:filter c:clear r:refresh ?:help q:quit",
    };

    let mut status = match (app.store.last_updated(), app.store.last_error()) {
        (_, Some(err)) => format!(" {} | Error: {}", app.feed_description(), err),
        (Some(updated), None) => format!(
            " {} | Updated {:.1}s ago",
            app.feed_description(),
            updated.elapsed().as_secs_f64()
        ),
        (None, None) => format!(" {} | Loading...", app.feed_description()),
    };
    if let Some(token) = app.store.last_applied() {
        status.push_str(&format!(" (snapshot #{})", token.value()));
    }
    if app.store.has_pending() && app.store.last_updated().is_some() {
        status.push_str(" ⟳");
    }
    if app.current_view == View::Metrics && app.connection.transitions() > 1 {
        status.push_str(&format!(" | {} link changes", app.connection.transitions()));
    }
    status.push_str(" | ");
    status.push_str(controls);

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab ←/→     Switch views"),
        Line::from("  1 / 2 / 3   Timeline / Metrics / Trend"),
        Line::from("  ↑/↓ j/k     Navigate rows"),
        Line::from("  PgUp/PgDn   Jump 10 rows"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from(""),
        section(" Timeline"),
        Line::from("  m         Cycle metric filter"),
        Line::from("  v         Cycle severity filter"),
        Line::from("  o         Cycle source filter"),
        Line::from("  c         Clear filters"),
        Line::from("  e         Export visible rows to CSV"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Refresh now"),
        Line::from("  m/v/o     Filters also apply to Trend"),
        Line::from("  q / Esc   Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 26u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
