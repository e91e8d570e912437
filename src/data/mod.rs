//! Data models and aggregation for the dashboard.
//!
//! Everything here is synchronous and owned by the UI loop; the async
//! sources in [`crate::source`] only hand results over.
//!
//! ## Submodules
//!
//! - [`window`]: Rolling window of the last [`WINDOW_CAPACITY`] metric samples
//! - [`connection`]: Push channel status from lifecycle signals
//! - [`event`]: Anomaly records ([`AnomalyEvent`]) and their derived form
//! - [`severity`]: Threshold classification of metric readings
//! - [`store`]: Held anomaly set with request-token reconciliation
//! - [`filter`]: Metric/severity/source selectors and the sorted projection
//! - [`export`]: CSV serialization of the projection
//! - [`trend`]: Anomaly values of the projection over time
//!
//! ## Data Flow
//!
//! ```text
//! fetch result ──▶ EventStore::complete() ──▶ DerivedEvent::derive_all()
//!                                                   │
//!                                                   ▼
//!                                         project(FilterState)
//!                                    │           │            │
//!                                    ▼           ▼            ▼
//!                                timeline  Trend::from_rows() to_csv()
//!
//! metrics_update ──▶ SampleWindow::push() ──▶ chart
//! lifecycle      ──▶ ConnectionTracker::apply() ──▶ indicator
//! ```

pub mod connection;
pub mod event;
pub mod export;
pub mod filter;
pub mod severity;
pub mod store;
pub mod trend;
pub mod window;

pub use connection::{ChannelSignal, ConnectionStatus, ConnectionTracker};
pub use event::{AnomalyEvent, DerivedEvent, JobStats, UNKNOWN};
pub use export::{export_filename, to_csv, write_export, ExportError, CSV_HEADERS};
pub use filter::{filter_options, project, Dimension, FilterState, Selector};
pub use severity::{classify, Severity, SeverityVerdict};
pub use store::{Completion, EventStore, RequestToken};
pub use trend::Trend;
pub use window::{MetricSample, SampleWindow, Series, WINDOW_CAPACITY};
