//! Layered configuration.
//!
//! Values are resolved in order, later sources winning:
//!
//! 1. built-in defaults
//! 2. an optional TOML file (`--config`)
//! 3. `BACKWATCH_*` environment variables (`BACKWATCH_BASE_URL`, ...)
//! 4. command-line flags, applied by the binary
//!
//! ```toml
//! base_url = "http://backup-host:5000"
//! push_addr = "backup-host:5001"
//! feed = "log"
//! poll_interval_secs = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::source::FeedKind;

const ENV_PREFIX: &str = "BACKWATCH";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Base URL of the backend REST API.
    pub base_url: String,
    /// `host:port` of the push channel; no live metrics when unset.
    #[serde(default)]
    pub push_addr: Option<String>,
    pub feed: FeedKind,
    pub poll_interval_secs: u64,
    pub reconnect_delay_secs: u64,
    /// Directory CSV exports are written to.
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    /// Read anomalies from a local JSON file instead of the REST API.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Settings {
    /// Load defaults, then `path` if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", "http://localhost:5000")?
            .set_default("feed", "timeline")?
            .set_default("poll_interval_secs", 5_i64)?
            .set_default("reconnect_delay_secs", 2_i64)?
            .set_default("export_dir", ".")?
            .set_default("log_file", "backwatch.log")?
            .set_default("log_level", "info")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the dashboard cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_prefix(None, "BACKWATCH_TEST_DEFAULTS").unwrap();
        assert_eq!(settings.base_url, "http://localhost:5000");
        assert_eq!(settings.feed, FeedKind::Timeline);
        assert_eq!(settings.poll_interval(), Duration::from_secs(5));
        assert_eq!(settings.reconnect_delay(), Duration::from_secs(2));
        assert_eq!(settings.log_file, PathBuf::from("backwatch.log"));
        assert_eq!(settings.push_addr, None);
        assert_eq!(settings.file, None);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "base_url = \"http://backup:8080\"\npush_addr = \"backup:8081\"\nfeed = \"log\"\npoll_interval_secs = 10"
        )
        .unwrap();

        let settings =
            Settings::load_with_prefix(Some(file.path()), "BACKWATCH_TEST_FILE").unwrap();
        assert_eq!(settings.base_url, "http://backup:8080");
        assert_eq!(settings.push_addr.as_deref(), Some("backup:8081"));
        assert_eq!(settings.feed, FeedKind::Log);
        assert_eq!(settings.poll_interval_secs, 10);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "poll_interval_secs = 10").unwrap();

        std::env::set_var("BACKWATCH_TEST_ENV_POLL_INTERVAL_SECS", "30");
        let settings =
            Settings::load_with_prefix(Some(file.path()), "BACKWATCH_TEST_ENV").unwrap();
        std::env::remove_var("BACKWATCH_TEST_ENV_POLL_INTERVAL_SECS");

        assert_eq!(settings.poll_interval_secs, 30);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "poll_interval_secs = 0").unwrap();

        let err = Settings::load_with_prefix(Some(file.path()), "BACKWATCH_TEST_ZERO").unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result =
            Settings::load_with_prefix(Some(Path::new("/nonexistent/backwatch.toml")), "BACKWATCH_TEST_MISSING");
        assert!(result.is_err());
    }
}
