//! Data sources for the dashboard.
//!
//! Two kinds of input feed the aggregation layer:
//!
//! - an [`AnomalyFeed`], polled for full snapshots of the anomaly set
//!   ([`HttpFeed`] against the backend REST API, [`FileFeed`] for a local
//!   JSON file);
//! - the [`PushHub`], a single shared push connection delivering metric
//!   samples, anomaly alerts and connection lifecycle signals.

mod error;
mod file;
mod http;
pub mod push;

pub use error::FetchError;
pub use file::FileFeed;
pub use http::{HttpFeed, HttpFeedBuilder};
pub use push::{Connector, PushEvent, PushHub, PushKind, PushSubscription, TcpConnector};

use std::fmt::{self, Debug};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::data::{AnomalyEvent, JobStats};

/// Which backend listing the timeline is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// `/api/anomaly_timeline`, the curated timeline.
    #[default]
    Timeline,
    /// `/api/anomalies`, the raw anomaly log (latest 50 entries).
    Log,
}

impl FeedKind {
    /// REST path serving this listing.
    pub fn path(&self) -> &'static str {
        match self {
            FeedKind::Timeline => "/api/anomaly_timeline",
            FeedKind::Log => "/api/anomalies",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FeedKind::Timeline => "timeline",
            FeedKind::Log => "log",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timeline" => Ok(FeedKind::Timeline),
            "log" | "anomalies" => Ok(FeedKind::Log),
            other => Err(format!("unknown feed '{}', expected 'timeline' or 'log'", other)),
        }
    }
}

/// Trait for fetching full anomaly snapshots.
///
/// Each call returns the complete current set; callers replace what they
/// hold rather than merging.
#[async_trait]
pub trait AnomalyFeed: Send + Sync + Debug {
    /// Fetch the full anomaly listing.
    async fn fetch_events(&self) -> Result<Vec<AnomalyEvent>, FetchError>;

    /// Fetch backup job counts, if this feed can provide them.
    async fn fetch_stats(&self) -> Result<Option<JobStats>, FetchError>;

    /// Returns a human-readable description of the feed.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_kind_paths() {
        assert_eq!(FeedKind::Timeline.path(), "/api/anomaly_timeline");
        assert_eq!(FeedKind::Log.path(), "/api/anomalies");
    }

    #[test]
    fn test_feed_kind_parse() {
        assert_eq!("timeline".parse::<FeedKind>(), Ok(FeedKind::Timeline));
        assert_eq!("LOG".parse::<FeedKind>(), Ok(FeedKind::Log));
        assert_eq!("anomalies".parse::<FeedKind>(), Ok(FeedKind::Log));
        assert!("stats".parse::<FeedKind>().is_err());
    }
}
