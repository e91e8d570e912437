//! Shared push channel connection.
//!
//! The backend pushes newline-delimited JSON envelopes:
//!
//! ```text
//! {"event":"metrics_update","data":{"timestamp":"12:00:01","cpu":12.5,"ram":40.1,"disk":71.0}}
//! {"event":"anomaly_alert","data":{"cpu":91.2,"message":"CPU anomaly detected"}}
//! ```
//!
//! One [`PushHub`] owns the single connection for the whole process.
//! Consumers take a [`PushSubscription`] for the one kind of event they care
//! about and drop it on teardown. The connection task starts with the first
//! subscription and stops when the last one is dropped.
//!
//! Connection lifecycle is reported as [`PushEvent::Lifecycle`] signals,
//! synthesised when the socket opens, reaches EOF, or fails. Reconnecting
//! after a drop is the hub's own job.

use std::fmt::{self, Debug};
use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::data::{ChannelSignal, MetricSample};

/// Queue depth per subscriber before old events are dropped.
const CHANNEL_CAPACITY: usize = 256;

/// A readable push stream produced by a [`Connector`].
pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// An event delivered by the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// The connection opened, closed, or failed.
    Lifecycle(ChannelSignal),
    /// A `metrics_update` sample.
    Metrics(MetricSample),
    /// An `anomaly_alert`; the payload is opaque.
    AnomalyAlert(serde_json::Value),
}

impl PushEvent {
    pub fn kind(&self) -> PushKind {
        match self {
            PushEvent::Lifecycle(_) => PushKind::Lifecycle,
            PushEvent::Metrics(_) => PushKind::Metrics,
            PushEvent::AnomalyAlert(_) => PushKind::AnomalyAlert,
        }
    }
}

/// Named event types a subscription can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushKind {
    Lifecycle,
    Metrics,
    AnomalyAlert,
}

impl PushKind {
    pub fn event_name(&self) -> &'static str {
        match self {
            PushKind::Lifecycle => "connect/disconnect",
            PushKind::Metrics => "metrics_update",
            PushKind::AnomalyAlert => "anomaly_alert",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Decode one wire line. Unknown event names decode to `None`.
pub fn decode_line(line: &str) -> Result<Option<PushEvent>, serde_json::Error> {
    let envelope: Envelope = serde_json::from_str(line)?;
    let event = match envelope.event.as_str() {
        "metrics_update" => Some(PushEvent::Metrics(serde_json::from_value(envelope.data)?)),
        "anomaly_alert" => Some(PushEvent::AnomalyAlert(envelope.data)),
        _ => None,
    };
    Ok(event)
}

/// Opens the underlying push stream.
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    async fn connect(&self) -> io::Result<BoxedReader>;

    /// Returns a human-readable description of the endpoint.
    fn description(&self) -> &str;
}

/// Connects to the push channel over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    description: String,
}

impl TcpConnector {
    pub fn new(addr: &str) -> Self {
        Self {
            addr: addr.to_string(),
            description: format!("tcp://{}", addr),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> io::Result<BoxedReader> {
        let stream = TcpStream::connect(&self.addr).await?;
        Ok(Box::new(stream))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[derive(Debug)]
struct Link {
    connector: Arc<dyn Connector>,
    runtime: Handle,
    reconnect_delay: Duration,
}

/// Last reported connection state, tagged with the connection it came from.
#[derive(Debug, Default)]
struct LifecycleState {
    generation: u64,
    signal: Option<ChannelSignal>,
}

/// Delivers events for one connection task. Goes quiet once the hub has
/// released that connection.
#[derive(Debug, Clone)]
struct Emitter {
    sender: broadcast::Sender<PushEvent>,
    lifecycle: Arc<Mutex<LifecycleState>>,
    generation: u64,
}

impl Emitter {
    fn is_current(&self) -> bool {
        self.lifecycle.lock().generation == self.generation
    }

    /// Returns false, without delivering, if the connection was released.
    fn send(&self, event: PushEvent) -> bool {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.generation != self.generation {
            return false;
        }
        if let PushEvent::Lifecycle(signal) = event {
            lifecycle.signal = Some(signal);
        }
        // No receivers is fine
        let _ = self.sender.send(event);
        true
    }
}

#[derive(Debug, Default)]
struct HubState {
    subscribers: usize,
    task: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct HubInner {
    sender: broadcast::Sender<PushEvent>,
    lifecycle: Arc<Mutex<LifecycleState>>,
    link: Option<Link>,
    state: Mutex<HubState>,
    description: String,
}

/// The process-wide push connection.
///
/// Cloning is cheap and shares the same connection.
///
/// # Example
///
/// ```
/// use backwatch::{PushEvent, PushHub, PushKind};
/// use backwatch::data::MetricSample;
///
/// let hub = PushHub::detached("in-process");
/// let mut metrics = hub.subscribe(PushKind::Metrics);
///
/// hub.publish(PushEvent::Metrics(MetricSample::new("12:00:01", 10.0, 20.0, 30.0)));
/// assert!(metrics.try_next().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct PushHub {
    inner: Arc<HubInner>,
}

impl PushHub {
    /// Create a hub backed by `connector`, spawning its reader on `runtime`
    /// once the first subscription is taken.
    pub fn connect<C>(connector: C, runtime: Handle, reconnect_delay: Duration) -> Self
    where
        C: Connector + 'static,
    {
        let description = format!("push: {}", connector.description());
        Self::build(
            Some(Link {
                connector: Arc::new(connector),
                runtime,
                reconnect_delay,
            }),
            description,
        )
    }

    /// Create a hub with no network connection; events arrive via [`PushHub::publish`].
    pub fn detached(description: &str) -> Self {
        Self::build(None, format!("push: {}", description))
    }

    fn build(link: Option<Link>, description: String) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(HubInner {
                sender,
                lifecycle: Arc::new(Mutex::new(LifecycleState::default())),
                link,
                state: Mutex::new(HubState::default()),
                description,
            }),
        }
    }

    /// Take a subscription to one kind of event.
    ///
    /// Lifecycle subscriptions first see the current connection state, if
    /// the channel has reported one.
    pub fn subscribe(&self, kind: PushKind) -> PushSubscription {
        let receiver = self.inner.sender.subscribe();
        let replay = match kind {
            PushKind::Lifecycle => self.inner.lifecycle.lock().signal.map(PushEvent::Lifecycle),
            _ => None,
        };

        let mut state = self.inner.state.lock();
        state.subscribers += 1;
        if state.task.is_none() {
            if let Some(link) = &self.inner.link {
                info!(channel = %self.inner.description, "starting push connection");
                state.task = Some(link.runtime.spawn(run_connection(
                    link.connector.clone(),
                    self.emitter(),
                    link.reconnect_delay,
                )));
            }
        }
        debug!(kind = kind.event_name(), subscribers = state.subscribers, "push subscribe");

        PushSubscription {
            receiver,
            kind,
            replay,
            hub: self.clone(),
        }
    }

    /// Deliver an event to current subscribers.
    pub fn publish(&self, event: PushEvent) {
        self.emitter().send(event);
    }

    fn emitter(&self) -> Emitter {
        Emitter {
            sender: self.inner.sender.clone(),
            lifecycle: self.inner.lifecycle.clone(),
            generation: self.inner.lifecycle.lock().generation,
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers
    }

    /// Whether the connection task is running.
    pub fn is_running(&self) -> bool {
        self.inner.state.lock().task.is_some()
    }

    pub fn description(&self) -> &str {
        &self.inner.description
    }

    fn release(&self, kind: PushKind) {
        let mut state = self.inner.state.lock();
        state.subscribers = state.subscribers.saturating_sub(1);
        debug!(kind = kind.event_name(), subscribers = state.subscribers, "push unsubscribe");

        if state.subscribers == 0 {
            if let Some(task) = state.task.take() {
                info!(channel = %self.inner.description, "last subscriber released, closing push connection");
                task.abort();
                // Silence the aborted task if it is still mid-send
                let mut lifecycle = self.inner.lifecycle.lock();
                lifecycle.generation += 1;
                lifecycle.signal = None;
            }
        }
    }
}

/// A handle receiving one kind of push event. Dropping it unsubscribes.
#[derive(Debug)]
pub struct PushSubscription {
    receiver: broadcast::Receiver<PushEvent>,
    kind: PushKind,
    replay: Option<PushEvent>,
    hub: PushHub,
}

impl PushSubscription {
    pub fn kind(&self) -> PushKind {
        self.kind
    }

    /// Next queued event of this subscription's kind, without blocking.
    pub fn try_next(&mut self) -> Option<PushEvent> {
        if let Some(event) = self.replay.take() {
            return Some(event);
        }

        loop {
            match self.receiver.try_recv() {
                Ok(event) if event.kind() == self.kind => return Some(event),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(kind = self.kind.event_name(), skipped, "push subscriber lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next event of this subscription's kind.
    pub async fn next(&mut self) -> Option<PushEvent> {
        if let Some(event) = self.replay.take() {
            return Some(event);
        }

        loop {
            match self.receiver.recv().await {
                Ok(event) if event.kind() == self.kind => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(kind = self.kind.event_name(), skipped, "push subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// All queued events of this kind, in delivery order.
    pub fn drain(&mut self) -> Vec<PushEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.hub.release(self.kind);
    }
}

async fn run_connection(connector: Arc<dyn Connector>, emitter: Emitter, reconnect_delay: Duration) {
    let emit = |signal: ChannelSignal| emitter.send(PushEvent::Lifecycle(signal));

    while emitter.is_current() {
        match connector.connect().await {
            Ok(reader) => {
                info!(channel = connector.description(), "push channel connected");
                emit(ChannelSignal::Open);
                let signal = read_events(reader, &emitter).await;
                info!(channel = connector.description(), ?signal, "push channel closed");
                emit(signal);
            }
            Err(e) => {
                warn!(channel = connector.description(), error = %e, "push channel connect failed");
                emit(ChannelSignal::Error);
            }
        }

        tokio::time::sleep(reconnect_delay).await;
    }
}

/// Forward decoded events until the stream ends, returning why it ended.
async fn read_events(reader: BoxedReader, emitter: &Emitter) -> ChannelSignal {
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => return ChannelSignal::Close,
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match decode_line(trimmed) {
                    Ok(Some(event)) => {
                        debug!(kind = event.kind().event_name(), "push event");
                        if !emitter.send(event) {
                            return ChannelSignal::Close;
                        }
                    }
                    Ok(None) => debug!("ignoring unknown push event"),
                    Err(e) => warn!(error = %e, "malformed push message"),
                }
            }
            Err(e) => {
                warn!(error = %e, "push channel read error");
                return ChannelSignal::Error;
            }
        }
    }
}

impl fmt::Display for PushKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}
