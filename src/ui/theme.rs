//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::{ConnectionStatus, Series, Severity};

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    pub low: Color,
    pub medium: Color,
    pub high: Color,
    /// Colors of the CPU, RAM and Disk chart lines.
    pub series: [Color; 3],
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            low: Color::Green,
            medium: Color::Yellow,
            high: Color::Red,
            series: [Color::LightBlue, Color::LightMagenta, Color::LightYellow],
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            low: Color::Green,
            medium: Color::Rgb(200, 120, 0),
            high: Color::Red,
            series: [Color::Blue, Color::Magenta, Color::Rgb(160, 110, 0)],
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a severity label. Labels outside Low/Medium/High stay unstyled.
    pub fn severity_style(&self, label: &str) -> Style {
        match Severity::from_label(label) {
            Some(Severity::Low) => Style::default().fg(self.low),
            Some(Severity::Medium) => Style::default().fg(self.medium),
            Some(Severity::High) => Style::default().fg(self.high).add_modifier(Modifier::BOLD),
            None => Style::default(),
        }
    }

    /// Indicator color for the push channel state.
    pub fn connection_color(&self, status: ConnectionStatus) -> Color {
        match status.color_tag() {
            "green" => Color::Green,
            "orange" => Color::Rgb(255, 165, 0),
            _ => Color::Gray,
        }
    }

    pub fn series_color(&self, series: Series) -> Color {
        match series {
            Series::Cpu => self.series[0],
            Series::Ram => self.series[1],
            Series::Disk => self.series[2],
        }
    }
}
