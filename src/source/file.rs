//! File-based feed.
//!
//! Reads the anomaly set from a local JSON file, re-read on every poll.
//! The file holds either a bare array of events (the shape the REST API
//! returns) or an object with `events` and an optional `stats` section.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::{AnomalyFeed, FetchError};
use crate::data::{AnomalyEvent, JobStats};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileSnapshot {
    Events(Vec<AnomalyEvent>),
    Full {
        #[serde(default)]
        events: Vec<AnomalyEvent>,
        #[serde(default)]
        stats: Option<JobStats>,
    },
}

/// A feed that reads anomaly snapshots from a JSON file.
#[derive(Debug)]
pub struct FileFeed {
    path: PathBuf,
    description: String,
}

impl FileFeed {
    /// Create a new file feed for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<FileSnapshot, FetchError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl AnomalyFeed for FileFeed {
    async fn fetch_events(&self) -> Result<Vec<AnomalyEvent>, FetchError> {
        Ok(match self.read().await? {
            FileSnapshot::Events(events) => events,
            FileSnapshot::Full { events, .. } => events,
        })
    }

    async fn fetch_stats(&self) -> Result<Option<JobStats>, FetchError> {
        Ok(match self.read().await? {
            FileSnapshot::Events(_) => None,
            FileSnapshot::Full { stats, .. } => stats,
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_feed_new() {
        let feed = FileFeed::new("/tmp/anomalies.json");
        assert_eq!(feed.path(), Path::new("/tmp/anomalies.json"));
        assert_eq!(feed.description(), "file: /tmp/anomalies.json");
    }

    #[tokio::test]
    async fn test_reads_bare_array() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[{{"timestamp":"2024-01-01 00:00:00","metric":"Disk","value":97}}]"#
        )
        .unwrap();

        let feed = FileFeed::new(file.path());
        let events = feed.fetch_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].metric.as_deref(), Some("Disk"));
        assert!(feed.fetch_stats().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reads_object_with_stats() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"events":[{{"metric":"CPU","value":10}}],"stats":{{"total":3,"success":3,"failed":0,"pending":0}}}}"#
        )
        .unwrap();

        let feed = FileFeed::new(file.path());
        assert_eq!(feed.fetch_events().await.unwrap().len(), 1);
        assert_eq!(feed.fetch_stats().await.unwrap().map(|s| s.total), Some(3));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let feed = FileFeed::new("/nonexistent/path/anomalies.json");
        let err = feed.fetch_events().await.unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
        assert!(err.to_string().contains("Read error"));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let feed = FileFeed::new(file.path());
        let err = feed.fetch_events().await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
