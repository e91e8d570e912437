use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, View};
use crate::data::{Dimension, ExportError};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Timeline),
        KeyCode::Char('2') => app.set_view(View::Metrics),
        KeyCode::Char('3') => app.set_view(View::Trend),

        // Timeline navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Filters
        KeyCode::Char('m') => app.cycle_filter(Dimension::Metric),
        KeyCode::Char('v') => app.cycle_filter(Dimension::Severity),
        KeyCode::Char('o') => app.cycle_filter(Dimension::Source),
        KeyCode::Char('c') => {
            if !app.filter.is_unfiltered() {
                app.clear_filters();
                app.set_status_message("Filters cleared".to_string());
            }
        }

        KeyCode::Char('r') => {
            if app.request_refresh().is_some() {
                app.set_status_message("Refreshing...".to_string());
            }
        }

        KeyCode::Char('e') => export(app),

        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}

fn export(app: &mut App) {
    let message = match app.export_visible() {
        Ok(path) => format!("Exported to {}", path.display()),
        Err(ExportError::Empty) => ExportError::Empty.to_string(),
        Err(e) => format!("Export failed: {}", e),
    };
    app.set_status_message(message);
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppOptions;
    use crate::data::{AnomalyEvent, JobStats, Selector};
    use crate::source::{AnomalyFeed, FetchError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::runtime::Handle;

    #[derive(Debug)]
    struct EmptyFeed;

    #[async_trait]
    impl AnomalyFeed for EmptyFeed {
        async fn fetch_events(&self) -> Result<Vec<AnomalyEvent>, FetchError> {
            Ok(Vec::new())
        }

        async fn fetch_stats(&self) -> Result<Option<JobStats>, FetchError> {
            Ok(None)
        }

        fn description(&self) -> &str {
            "empty"
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new(Arc::new(EmptyFeed), AppOptions::new(Handle::current()))
    }

    #[tokio::test]
    async fn test_view_keys() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.current_view, View::Metrics);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Trend);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Timeline);
        handle_key_event(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.current_view, View::Trend);
        handle_key_event(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.current_view, View::Metrics);
    }

    #[tokio::test]
    async fn test_filter_keys_cycle_presets() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('v')));
        assert_eq!(app.filter.severity, Selector::only("High"));
        handle_key_event(&mut app, key(KeyCode::Char('o')));
        assert_eq!(app.filter.source, Selector::only("Rule-Based"));

        handle_key_event(&mut app, key(KeyCode::Char('c')));
        assert!(app.filter.is_unfiltered());
    }

    #[tokio::test]
    async fn test_export_with_no_rows_reports() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('e')));
        assert_eq!(app.get_status_message(), Some("No rows to export"));
    }

    #[tokio::test]
    async fn test_help_swallows_next_key() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);

        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }
}
