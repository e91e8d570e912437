//! HTTP feed against the backup backend's REST API.
//!
//! ## Endpoints
//!
//! - `GET /api/anomaly_timeline` or `GET /api/anomalies` for the anomaly set
//! - `GET /api/stats` for backup job counts
//!
//! ## Example
//!
//! ```rust,no_run
//! use backwatch::{AnomalyFeed, FeedKind, HttpFeed};
//!
//! # tokio_test::block_on(async {
//! let feed = HttpFeed::builder()
//!     .endpoint("http://localhost:5000")
//!     .feed(FeedKind::Timeline)
//!     .build();
//!
//! let events = feed.fetch_events().await.unwrap();
//! println!("{} anomalies", events.len());
//! # });
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{AnomalyFeed, FeedKind, FetchError};
use crate::data::{AnomalyEvent, JobStats};

/// Feed that polls the backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    endpoint: String,
    feed: FeedKind,
    description: String,
}

impl HttpFeed {
    /// Create a new builder for configuring the feed.
    pub fn builder() -> HttpFeedBuilder {
        HttpFeedBuilder::default()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn feed(&self) -> FeedKind {
        self.feed
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(%url, "fetching");

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response.json::<T>().await.map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl AnomalyFeed for HttpFeed {
    async fn fetch_events(&self) -> Result<Vec<AnomalyEvent>, FetchError> {
        // The backend answers with a bare array; anything else reads as empty
        let body: serde_json::Value = self.get_json(self.feed.path()).await?;
        match body {
            serde_json::Value::Array(_) => Ok(serde_json::from_value(body)?),
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_stats(&self) -> Result<Option<JobStats>, FetchError> {
        self.get_json("/api/stats").await.map(Some)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`HttpFeed`].
#[derive(Debug, Default)]
pub struct HttpFeedBuilder {
    endpoint: Option<String>,
    feed: FeedKind,
    timeout: Option<Duration>,
}

impl HttpFeedBuilder {
    /// Set the backend base URL (default: `http://localhost:5000`).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Select the anomaly listing to poll.
    pub fn feed(mut self, feed: FeedKind) -> Self {
        self.feed = feed;
        self
    }

    /// Set the request timeout (default: 4 seconds, under one poll period).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the feed.
    pub fn build(self) -> HttpFeed {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(4));
        let client = Client::builder().timeout(timeout).build().unwrap_or_default();
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:5000".to_string())
            .trim_end_matches('/')
            .to_string();
        let description = format!("http: {}{}", endpoint, self.feed.path());

        HttpFeed {
            client,
            endpoint,
            feed: self.feed,
            description,
        }
    }
}
