//! # backwatch
//!
//! A terminal dashboard and library for watching a backup system's anomaly
//! timeline and live resource metrics.
//!
//! The library is the aggregation layer between the backend and the screen:
//! it holds the latest anomaly set, reconciles overlapping fetches, infers
//! missing severities, filters and orders the visible rows, keeps a rolling
//! window of pushed metric samples, tracks the push channel's health, and
//! serializes the visible rows as CSV.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │(aggregate)    │(render) │    │          │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └──────────┘  │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌─────────┐                                                 │
//! │  │ source  │◀── HttpFeed | FileFeed, PushHub (TCP NDJSON)    │
//! │  │ (input) │                                                 │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, refresh cycle, view navigation
//! - **[`source`]**: The [`AnomalyFeed`] trait with HTTP and file feeds, and
//!   the shared [`PushHub`] connection
//! - **[`data`]**: Sample window, connection tracker, event store, severity
//!   classifier, filter/projection, anomaly trend and CSV export
//! - **[`settings`]**: Layered configuration
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll the REST API and listen for live metrics
//! backwatch --url http://localhost:5000 --push localhost:5001
//!
//! # Write the current timeline to CSV and exit
//! backwatch --url http://localhost:5000 --export --export-dir exports/
//! ```
//!
//! ### As a library
//!
//! ```
//! use backwatch::data::{project, to_csv, AnomalyEvent, DerivedEvent, FilterState};
//!
//! let events = vec![
//!     AnomalyEvent::new("2024-01-01 10:00:00", "CPU", 92.0),
//!     AnomalyEvent::new("2024-01-01 11:00:00", "Disk", 40.0),
//! ];
//!
//! let rows = project(&DerivedEvent::derive_all(&events), &FilterState::new());
//! assert_eq!(rows[0].severity(), "Low");
//! assert_eq!(rows[1].severity(), "High");
//!
//! let document = to_csv(&rows).unwrap();
//! assert!(document.starts_with("timestamp,source,metric,value,severity\n"));
//! ```
//!
//! ### Driving the app from a feed
//!
//! ```no_run
//! use std::sync::Arc;
//! use backwatch::{App, AppOptions, HttpFeed};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let feed = Arc::new(HttpFeed::builder().endpoint("http://localhost:5000").build());
//! let mut app = App::new(feed, AppOptions::new(rt.handle().clone()));
//!
//! app.tick();
//! ```

pub mod app;
pub mod data;
pub mod events;
pub mod settings;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, AppOptions, View};
pub use data::{
    AnomalyEvent, ConnectionStatus, DerivedEvent, EventStore, FilterState, JobStats, MetricSample,
    SampleWindow, Severity,
};
pub use settings::Settings;
pub use source::{
    AnomalyFeed, FeedKind, FetchError, FileFeed, HttpFeed, PushEvent, PushHub, PushKind,
    PushSubscription, TcpConnector,
};
