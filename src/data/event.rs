//! Anomaly records as returned by the backend, and their derived form.

use serde::{Deserialize, Serialize};

use super::severity::{classify, SeverityVerdict};

/// Label used for a missing source or metric.
pub const UNKNOWN: &str = "Unknown";

/// One anomaly record from `/api/anomaly_timeline` or `/api/anomalies`.
///
/// Records have no identity beyond their position in a fetch; every fetch
/// replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub severity: Option<String>,
    /// Display-only trend hint from the backend ("Stable", "Rising", ...).
    #[serde(default)]
    pub trend: Option<String>,
}

impl AnomalyEvent {
    pub fn new(timestamp: &str, metric: &str, value: f64) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            metric: Some(metric.to_string()),
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_severity(mut self, severity: &str) -> Self {
        self.severity = Some(severity.to_string());
        self
    }
}

/// An [`AnomalyEvent`] with a guaranteed severity.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedEvent {
    pub event: AnomalyEvent,
    pub severity: SeverityVerdict,
}

impl DerivedEvent {
    /// Attach a severity, inferring one only when the backend gave none.
    ///
    /// An empty severity string counts as missing.
    pub fn derive(event: &AnomalyEvent) -> Self {
        let severity = match event.severity.as_deref() {
            Some(label) if !label.is_empty() => SeverityVerdict::FromSource(label.to_string()),
            _ => SeverityVerdict::Inferred(classify(
                event.metric.as_deref().unwrap_or(UNKNOWN),
                event.value.unwrap_or(0.0),
            )),
        };

        Self {
            event: event.clone(),
            severity,
        }
    }

    /// Derive every event in order.
    pub fn derive_all(events: &[AnomalyEvent]) -> Vec<Self> {
        events.iter().map(Self::derive).collect()
    }

    /// Timestamp used for ordering; missing sorts as the empty string.
    pub fn timestamp(&self) -> &str {
        self.event.timestamp.as_deref().unwrap_or("")
    }

    /// Source as shown and filtered; missing reads as "Unknown".
    pub fn source(&self) -> &str {
        self.event.source.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn metric(&self) -> Option<&str> {
        self.event.metric.as_deref()
    }

    pub fn value(&self) -> Option<f64> {
        self.event.value
    }

    pub fn severity(&self) -> &str {
        self.severity.label()
    }
}

/// Backup job counts from `/api/stats`, shown in the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub success: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub success_rate: f64,
    #[serde(default)]
    pub fail_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Severity;

    #[test]
    fn test_missing_severity_is_inferred() {
        let event = AnomalyEvent::new("2024-01-01T00:00:00", "CPU", 92.0);
        let derived = DerivedEvent::derive(&event);
        assert_eq!(derived.severity, SeverityVerdict::Inferred(Severity::High));
        assert_eq!(derived.severity(), "High");
    }

    #[test]
    fn test_source_severity_never_overridden() {
        let event = AnomalyEvent::new("2024-01-01T00:00:00", "CPU", 99.0).with_severity("Low");
        let derived = DerivedEvent::derive(&event);
        assert_eq!(derived.severity, SeverityVerdict::FromSource("Low".to_string()));
        assert_eq!(derived.event, event);
    }

    #[test]
    fn test_empty_severity_counts_as_missing() {
        let event = AnomalyEvent::new("t", "Disk", 90.0).with_severity("");
        assert_eq!(DerivedEvent::derive(&event).severity(), "Medium");
    }

    #[test]
    fn test_missing_metric_and_value_default_to_low() {
        let derived = DerivedEvent::derive(&AnomalyEvent::default());
        assert_eq!(derived.severity, SeverityVerdict::Inferred(Severity::Low));
        assert_eq!(derived.timestamp(), "");
        assert_eq!(derived.source(), "Unknown");
        assert_eq!(derived.metric(), None);
    }

    #[test]
    fn test_deserialize_timeline_row() {
        let json = r#"[
            {"timestamp":"2024-05-01 10:00:00","source":"ML","metric":"RAM",
             "value":81.5,"severity":null,"trend":"Rising"},
            {"timestamp":"2024-05-01 10:00:05","metric":"Disk","value":null,
             "cpu_percent":12.0}
        ]"#;
        let events: Vec<AnomalyEvent> = serde_json::from_str(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].trend.as_deref(), Some("Rising"));
        assert_eq!(events[0].severity, None);
        assert_eq!(events[1].source, None);
        assert_eq!(events[1].value, None);

        let derived = DerivedEvent::derive_all(&events);
        assert_eq!(derived[0].severity(), "Medium");
        assert_eq!(derived[1].severity(), "Low");
    }

    #[test]
    fn test_deserialize_stats_without_rates() {
        let stats: JobStats =
            serde_json::from_str(r#"{"total":10,"success":7,"failed":2,"pending":1}"#).unwrap();
        assert_eq!(stats.total, 10);
        assert_eq!(stats.success_rate, 0.0);
    }
}
