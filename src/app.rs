//! Application state and the refresh cycle.
//!
//! `App` owns every piece of aggregation state and is only touched from the
//! UI loop. Fetches run on the tokio runtime and report back over a channel
//! that [`App::tick`] drains; push events arrive through
//! [`PushSubscription`]s drained the same way.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::data::{
    filter_options, project, write_export, AnomalyEvent, Completion, ConnectionTracker,
    DerivedEvent, Dimension, EventStore, ExportError, FilterState, JobStats, RequestToken,
    SampleWindow, Trend,
};
use crate::source::{AnomalyFeed, FetchError, PushEvent, PushHub, PushKind, PushSubscription};
use crate::ui::Theme;

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Filterable anomaly table.
    Timeline,
    /// Rolling CPU/RAM/Disk chart.
    Metrics,
    /// Anomaly values over time.
    Trend,
}

impl View {
    pub const ALL: [View; 3] = [View::Timeline, View::Metrics, View::Trend];

    pub fn next(self) -> Self {
        match self {
            View::Timeline => View::Metrics,
            View::Metrics => View::Trend,
            View::Trend => View::Timeline,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            View::Timeline => View::Trend,
            View::Metrics => View::Timeline,
            View::Trend => View::Metrics,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Timeline => "Timeline",
            View::Metrics => "Live Metrics",
            View::Trend => "Anomaly Trend",
        }
    }

    /// Position in the tab bar.
    pub fn index(&self) -> usize {
        match self {
            View::Timeline => 0,
            View::Metrics => 1,
            View::Trend => 2,
        }
    }
}

/// Result of background work, handed back to the UI loop.
#[derive(Debug)]
pub enum FetchOutcome {
    Events {
        token: RequestToken,
        result: Result<Vec<AnomalyEvent>, FetchError>,
    },
    Stats {
        token: RequestToken,
        result: Result<Option<JobStats>, FetchError>,
    },
}

/// Construction parameters for [`App`].
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Runtime fetches are spawned on.
    pub runtime: Handle,
    /// Push channel; without one the chart and indicator stay idle.
    pub hub: Option<PushHub>,
    pub poll_interval: Duration,
    pub export_dir: PathBuf,
    pub theme: Theme,
}

impl AppOptions {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            hub: None,
            poll_interval: Duration::from_secs(5),
            export_dir: PathBuf::from("."),
            theme: Theme::dark(),
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Inputs
    feed: Arc<dyn AnomalyFeed>,
    runtime: Handle,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: Option<mpsc::UnboundedReceiver<FetchOutcome>>,
    hub: Option<PushHub>,
    lifecycle: Option<PushSubscription>,
    metrics: Option<PushSubscription>,
    alerts: Option<PushSubscription>,

    // Aggregation state
    pub store: EventStore,
    pub window: SampleWindow,
    pub connection: ConnectionTracker,
    pub stats: Option<JobStats>,
    stats_token: Option<RequestToken>,
    pub filter: FilterState,
    pub alerts_received: u64,

    // Polling
    poll_interval: Duration,
    last_poll: Option<Instant>,

    // Navigation
    pub selected_index: usize,

    // UI
    pub theme: Theme,
    export_dir: PathBuf,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create the app and subscribe to the push channel, if any.
    ///
    /// The first fetch is issued by the first [`App::tick`].
    pub fn new(feed: Arc<dyn AnomalyFeed>, options: AppOptions) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let hub = options.hub;
        Self {
            running: true,
            current_view: View::Timeline,
            show_help: false,
            feed,
            runtime: options.runtime,
            outcome_tx,
            outcome_rx: Some(outcome_rx),
            lifecycle: hub.as_ref().map(|h| h.subscribe(PushKind::Lifecycle)),
            metrics: hub.as_ref().map(|h| h.subscribe(PushKind::Metrics)),
            alerts: hub.as_ref().map(|h| h.subscribe(PushKind::AnomalyAlert)),
            hub,
            store: EventStore::new(),
            window: SampleWindow::new(),
            connection: ConnectionTracker::new(),
            stats: None,
            stats_token: None,
            filter: FilterState::new(),
            alerts_received: 0,
            poll_interval: options.poll_interval,
            last_poll: None,
            selected_index: 0,
            theme: options.theme,
            export_dir: options.export_dir,
            status_message: None,
        }
    }

    /// Returns a description of the anomaly feed.
    pub fn feed_description(&self) -> &str {
        self.feed.description()
    }

    /// Returns a description of the push channel, if one is attached.
    pub fn push_description(&self) -> Option<&str> {
        self.hub.as_ref().map(|h| h.description())
    }

    /// Whether the push connection task is running.
    pub fn push_running(&self) -> bool {
        self.hub.as_ref().is_some_and(|h| h.is_running())
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_TTL => Some(msg),
            _ => None,
        }
    }

    /// One pass of the refresh cycle: apply pushes, apply finished fetches,
    /// then start a poll if one is due.
    pub fn tick(&mut self) {
        self.drain_pushes();
        self.drain_outcomes();

        if self.poll_due() {
            self.last_poll = Some(Instant::now());
            self.request_refresh();
        }
    }

    fn poll_due(&self) -> bool {
        !self.store.is_closed() && self.last_poll.map_or(true, |t| t.elapsed() >= self.poll_interval)
    }

    /// Start a fetch of the full anomaly set and the job counts.
    ///
    /// Returns `None` once the app has been torn down.
    pub fn request_refresh(&mut self) -> Option<RequestToken> {
        if self.store.is_closed() {
            return None;
        }

        let token = self.store.begin_fetch();
        let feed = Arc::clone(&self.feed);
        let tx = self.outcome_tx.clone();
        debug!(token = token.value(), "requesting anomaly snapshot");

        self.runtime.spawn(async move {
            let result = feed.fetch_events().await;
            // The receiver may be gone after teardown
            let _ = tx.send(FetchOutcome::Events { token, result });
            let result = feed.fetch_stats().await;
            let _ = tx.send(FetchOutcome::Stats { token, result });
        });

        Some(token)
    }

    fn drain_pushes(&mut self) {
        if let Some(sub) = self.lifecycle.as_mut() {
            for event in sub.drain() {
                if let PushEvent::Lifecycle(signal) = event {
                    self.connection.apply(signal);
                }
            }
        }

        if let Some(sub) = self.metrics.as_mut() {
            for event in sub.drain() {
                if let PushEvent::Metrics(sample) = event {
                    self.window.push(sample);
                }
            }
        }

        let alerts = self.alerts.as_mut().map(|sub| sub.drain().len()).unwrap_or(0);
        if alerts > 0 {
            self.alerts_received += alerts as u64;
            info!(count = alerts, "anomaly alert received, refreshing");
            // One fetch covers every alert drained this tick
            self.request_refresh();
        }
    }

    fn drain_outcomes(&mut self) {
        let Some(rx) = self.outcome_rx.as_mut() else {
            return;
        };

        let mut outcomes = Vec::new();
        while let Ok(outcome) = rx.try_recv() {
            outcomes.push(outcome);
        }

        for outcome in outcomes {
            match outcome {
                FetchOutcome::Events { token, result } => {
                    if let Completion::Applied { .. } = self.store.complete(token, result) {
                        self.clamp_selection();
                    }
                }
                FetchOutcome::Stats { token, result } => self.apply_stats(token, result),
            }
        }
    }

    /// Keep the job counts from the newest request that returned any.
    fn apply_stats(&mut self, token: RequestToken, result: Result<Option<JobStats>, FetchError>) {
        if self.store.is_closed() || self.stats_token.is_some_and(|t| t > token) {
            debug!(token = token.value(), "discarding stale job stats");
            return;
        }
        match result {
            Ok(Some(stats)) => {
                self.stats = Some(stats);
                self.stats_token = Some(token);
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "job stats unavailable"),
        }
    }

    /// Filtered timeline rows, newest first.
    pub fn visible_rows(&self) -> Vec<DerivedEvent> {
        project(&self.store.derived(), &self.filter)
    }

    /// Values a filter dimension can cycle through right now.
    pub fn filter_options(&self, dimension: Dimension) -> Vec<String> {
        filter_options(&self.store.derived(), dimension)
    }

    /// Advance one filter selector and reset the selection.
    pub fn cycle_filter(&mut self, dimension: Dimension) {
        let options = self.filter_options(dimension);
        self.filter.cycle(dimension, &options);
        self.selected_index = 0;
        let label = self.filter.selector(dimension).label().to_string();
        self.set_status_message(format!("{}: {}", dimension.label(), label));
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.selected_index = 0;
    }

    /// Write the visible rows to a timestamped CSV in the export directory.
    pub fn export_visible(&self) -> Result<PathBuf, ExportError> {
        write_export(&self.export_dir, &self.visible_rows(), Utc::now())
    }

    /// Anomaly values of the visible rows, oldest first.
    pub fn trend(&self) -> Trend {
        Trend::from_rows(&self.visible_rows())
    }

    /// The row under the cursor.
    pub fn selected_row(&self) -> Option<DerivedEvent> {
        self.visible_rows().into_iter().nth(self.selected_index)
    }

    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_rows().len().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.visible_rows().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_rows().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Release the push subscriptions, stop polling, and let fetches still
    /// in flight finish without writing anywhere.
    pub fn teardown(&mut self) {
        if self.store.is_closed() {
            return;
        }
        info!("tearing down dashboard state");
        self.lifecycle = None;
        self.metrics = None;
        self.alerts = None;
        self.store.close();
        self.outcome_rx = None;
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ChannelSignal, ConnectionStatus, MetricSample, Selector};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct MockFeed {
        events: Mutex<Vec<AnomalyEvent>>,
        fail: Mutex<bool>,
        calls: AtomicUsize,
    }

    impl MockFeed {
        fn with_events(events: Vec<AnomalyEvent>) -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(events),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl AnomalyFeed for MockFeed {
        async fn fetch_events(&self) -> Result<Vec<AnomalyEvent>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail.lock() {
                return Err(FetchError::Status(503));
            }
            Ok(self.events.lock().clone())
        }

        async fn fetch_stats(&self) -> Result<Option<JobStats>, FetchError> {
            Ok(Some(JobStats {
                total: 2,
                success: 1,
                failed: 1,
                ..Default::default()
            }))
        }

        fn description(&self) -> &str {
            "mock"
        }
    }

    fn options(hub: Option<PushHub>) -> AppOptions {
        AppOptions {
            hub,
            poll_interval: Duration::from_secs(60),
            ..AppOptions::new(Handle::current())
        }
    }

    /// Let spawned fetches finish and feed them back.
    async fn settle(app: &mut App) {
        for _ in 0..20 {
            tokio::task::yield_now().await;
            app.tick();
        }
    }

    fn sample_events() -> Vec<AnomalyEvent> {
        vec![
            AnomalyEvent::new("2024-01-01 10:00:00", "CPU", 95.0).with_source("ML"),
            AnomalyEvent::new("2024-01-01 11:00:00", "Disk", 50.0).with_source("Rule-Based"),
        ]
    }

    #[test]
    fn test_view_cycle() {
        assert_eq!(View::Timeline.next(), View::Metrics);
        assert_eq!(View::Metrics.next(), View::Timeline);
        assert_eq!(View::Metrics.next(), View::Trend);
        assert_eq!(View::Trend.next(), View::Timeline);
        assert_eq!(View::Timeline.prev(), View::Trend);
        assert_eq!(View::Metrics.label(), "Live Metrics");
        for view in View::ALL {
            assert_eq!(view.next().prev(), view);
            assert_eq!(View::ALL[view.index()], view);
        }
    }

    #[tokio::test]
    async fn test_first_tick_fetches_and_applies() {
        let feed = MockFeed::with_events(sample_events());
        let mut app = App::new(feed.clone(), options(None));
        assert!(app.store.is_empty());

        settle(&mut app).await;

        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
        assert_eq!(app.store.len(), 2);
        assert_eq!(app.stats.as_ref().map(|s| s.failed), Some(1));

        let rows = app.visible_rows();
        assert_eq!(rows[0].timestamp(), "2024-01-01 11:00:00");
        assert_eq!(rows[1].severity(), "High");
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_set() {
        let feed = MockFeed::with_events(sample_events());
        let mut app = App::new(feed.clone(), options(None));
        settle(&mut app).await;
        assert_eq!(app.store.len(), 2);

        *feed.fail.lock() = true;
        app.request_refresh();
        settle(&mut app).await;

        assert_eq!(app.store.len(), 2);
        assert_eq!(app.store.last_error(), Some("API returned status 503"));
    }

    #[tokio::test]
    async fn test_older_stats_cannot_overwrite_newer() {
        let mut app = App::new(MockFeed::with_events(Vec::new()), options(None));
        let older = app.store.begin_fetch();
        let newer = app.store.begin_fetch();
        let stats = |total| JobStats {
            total,
            ..Default::default()
        };

        app.apply_stats(newer, Ok(Some(stats(7))));
        app.apply_stats(older, Ok(Some(stats(3))));
        assert_eq!(app.stats.as_ref().map(|s| s.total), Some(7));

        // A failed newer request keeps the last good counts
        let latest = app.store.begin_fetch();
        app.apply_stats(latest, Err(FetchError::Timeout));
        assert_eq!(app.stats.as_ref().map(|s| s.total), Some(7));
    }

    #[tokio::test]
    async fn test_trend_follows_filters() {
        let feed = MockFeed::with_events(sample_events());
        let mut app = App::new(feed, options(None));
        settle(&mut app).await;

        let trend = app.trend();
        assert_eq!(trend.points, vec![(0.0, 95.0), (1.0, 50.0)]);

        app.cycle_filter(Dimension::Metric);
        let trend = app.trend();
        assert_eq!(trend.points, vec![(0.0, 95.0)]);
        assert_eq!(trend.first_label(), Some("2024-01-01 10:00:00"));
    }

    #[tokio::test]
    async fn test_push_events_reach_their_consumers() {
        let hub = PushHub::detached("test");
        let feed = MockFeed::with_events(Vec::new());
        let mut app = App::new(feed.clone(), options(Some(hub.clone())));
        assert_eq!(hub.subscriber_count(), 3);
        assert_eq!(app.push_description(), Some("push: test"));
        // A detached hub never runs a connection task
        assert!(!app.push_running());
        settle(&mut app).await;
        assert_eq!(app.connection.status(), ConnectionStatus::Unknown);

        hub.publish(PushEvent::Lifecycle(ChannelSignal::Open));
        hub.publish(PushEvent::Metrics(MetricSample::new("t1", 10.0, 20.0, 30.0)));
        hub.publish(PushEvent::Metrics(MetricSample::new("t2", 11.0, 21.0, 31.0)));
        app.tick();

        assert_eq!(app.connection.status(), ConnectionStatus::Connected);
        assert_eq!(app.window.len(), 2);
        assert_eq!(app.window.latest().map(|s| s.timestamp.as_str()), Some("t2"));

        hub.publish(PushEvent::Lifecycle(ChannelSignal::Error));
        app.tick();
        assert_eq!(app.connection.status(), ConnectionStatus::Disconnected);
        assert_eq!(app.window.len(), 2);
    }

    #[tokio::test]
    async fn test_alert_triggers_refetch() {
        let hub = PushHub::detached("test");
        let feed = MockFeed::with_events(sample_events());
        let mut app = App::new(feed.clone(), options(Some(hub.clone())));
        settle(&mut app).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);

        feed.events.lock().push(AnomalyEvent::new("2024-01-01 12:00:00", "RAM", 80.0));
        hub.publish(PushEvent::AnomalyAlert(serde_json::json!({"cpu": 91.0})));
        settle(&mut app).await;

        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);
        assert_eq!(app.alerts_received, 1);
        assert_eq!(app.store.len(), 3);
    }

    #[tokio::test]
    async fn test_teardown_releases_everything() {
        let hub = PushHub::detached("test");
        let feed = MockFeed::with_events(sample_events());
        let mut app = App::new(feed.clone(), options(Some(hub.clone())));

        // Fetch spawned but not yet applied
        app.tick();
        app.teardown();
        settle(&mut app).await;

        assert_eq!(hub.subscriber_count(), 0);
        assert!(app.store.is_empty());
        assert!(app.request_refresh().is_none());
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_releases_subscriptions() {
        let hub = PushHub::detached("test");
        let app = App::new(MockFeed::with_events(Vec::new()), options(Some(hub.clone())));
        assert_eq!(hub.subscriber_count(), 3);
        drop(app);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_cycle_filter_narrows_rows() {
        let feed = MockFeed::with_events(sample_events());
        let mut app = App::new(feed, options(None));
        settle(&mut app).await;

        app.cycle_filter(Dimension::Metric);
        assert_eq!(app.filter.metric, Selector::only("CPU"));
        assert_eq!(app.visible_rows().len(), 1);
        assert_eq!(app.get_status_message(), Some("Metric: CPU"));

        app.clear_filters();
        assert_eq!(app.visible_rows().len(), 2);
    }

    #[tokio::test]
    async fn test_selection_is_clamped() {
        let feed = MockFeed::with_events(sample_events());
        let mut app = App::new(feed, options(None));
        settle(&mut app).await;

        app.select_next_n(10);
        assert_eq!(app.selected_index, 1);
        app.select_prev_n(10);
        assert_eq!(app.selected_index, 0);
        app.select_last();
        assert_eq!(
            app.selected_row().map(|r| r.timestamp().to_string()),
            Some("2024-01-01 10:00:00".to_string())
        );
    }

    #[tokio::test]
    async fn test_export_visible() {
        let dir = tempfile::tempdir().unwrap();
        let feed = MockFeed::with_events(sample_events());
        let mut app = App::new(
            feed,
            AppOptions {
                export_dir: dir.path().to_path_buf(),
                ..options(None)
            },
        );

        assert!(matches!(app.export_visible(), Err(ExportError::Empty)));

        settle(&mut app).await;
        let path = app.export_visible().unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.starts_with("timestamp,source,metric,value,severity\n"));
        assert_eq!(written.lines().count(), 3);
    }
}
