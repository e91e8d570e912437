use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use backwatch::app::{App, AppOptions, View};
use backwatch::data::{project, write_export, DerivedEvent, FilterState};
use backwatch::settings::Settings;
use backwatch::source::{AnomalyFeed, FeedKind, FileFeed, HttpFeed, PushHub, TcpConnector};
use backwatch::ui::{self, Theme};
use backwatch::events;

#[derive(Parser, Debug)]
#[command(name = "backwatch")]
#[command(about = "Terminal dashboard for backup anomaly timelines and live resource metrics")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (e.g. http://localhost:5000)
    #[arg(short, long)]
    url: Option<String>,

    /// Push channel address for live metrics and alerts (host:port)
    #[arg(short, long)]
    push: Option<String>,

    /// Read anomalies from a JSON file instead of the REST API
    #[arg(short, long, conflicts_with = "url")]
    file: Option<PathBuf>,

    /// Anomaly listing to show: timeline or log
    #[arg(long)]
    feed: Option<FeedKind>,

    /// Poll interval in seconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Directory CSV exports are written to
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Log file (the terminal is taken by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "backwatch=trace" (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Fetch once, export the full timeline to CSV and exit
    #[arg(short, long)]
    export: bool,
}

impl Args {
    /// Command-line values win over every other source.
    fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.url {
            settings.base_url = url.clone();
        }
        if let Some(push) = &self.push {
            settings.push_addr = Some(push.clone());
        }
        if let Some(file) = &self.file {
            settings.file = Some(file.clone());
        }
        if let Some(feed) = self.feed {
            settings.feed = feed;
        }
        if let Some(refresh) = self.refresh {
            settings.poll_interval_secs = refresh;
        }
        if let Some(dir) = &self.export_dir {
            settings.export_dir = dir.clone();
        }
        if let Some(log_file) = &self.log_file {
            settings.log_file = log_file.clone();
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply(&mut settings);
    settings.validate()?;

    init_logging(&settings, args.log_level.is_some())?;
    info!(?settings, "starting backwatch");

    let rt = Runtime::new()?;
    let feed = build_feed(&settings);

    // Handle export mode (non-interactive)
    if args.export {
        return export_once(&rt, feed.as_ref(), &settings);
    }

    let hub = settings.push_addr.as_deref().map(|addr| {
        PushHub::connect(TcpConnector::new(addr), rt.handle().clone(), settings.reconnect_delay())
    });

    let options = AppOptions {
        runtime: rt.handle().clone(),
        hub,
        poll_interval: settings.poll_interval(),
        export_dir: settings.export_dir.clone(),
        theme: Theme::auto_detect(),
    };

    let result = run_tui(App::new(feed, options));

    // Stops the push reader and any fetch still in flight
    rt.shutdown_timeout(Duration::from_secs(1));
    result
}

/// Log to a file so the alternate screen stays clean.
///
/// `--log-level` beats `RUST_LOG`, which beats the configured level.
fn init_logging(settings: &Settings, level_from_cli: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
        .with_context(|| format!("Failed to open log file {}", settings.log_file.display()))?;

    let filter = if level_from_cli {
        EnvFilter::try_new(&settings.log_level)?
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&settings.log_level))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn build_feed(settings: &Settings) -> Arc<dyn AnomalyFeed> {
    match &settings.file {
        Some(path) => Arc::new(FileFeed::new(path)),
        None => Arc::new(
            HttpFeed::builder()
                .endpoint(settings.base_url.clone())
                .feed(settings.feed)
                .build(),
        ),
    }
}

/// Fetch the current anomaly set once and write it as CSV.
fn export_once(rt: &Runtime, feed: &dyn AnomalyFeed, settings: &Settings) -> Result<()> {
    let events = rt
        .block_on(feed.fetch_events())
        .with_context(|| format!("Failed to fetch from {}", feed.description()))?;

    let rows = project(&DerivedEvent::derive_all(&events), &FilterState::new());
    let path = write_export(&settings.export_dir, &rows, Utc::now())?;

    info!(path = %path.display(), rows = rows.len(), "exported timeline");
    println!("Exported {} rows to: {}", rows.len(), path.display());
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);
    app.teardown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.tick();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered =
                    ratatui::layout::Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Timeline => ui::timeline::render(frame, app, chunks[2]),
                View::Metrics => ui::metrics::render(frame, app, chunks[2]),
                View::Trend => ui::trend::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                _ => {}
            }
        }
    }

    Ok(())
}
