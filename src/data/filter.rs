//! Filtering and ordering of the visible anomaly rows.

use std::fmt;

use super::event::DerivedEvent;

/// One filter selector: everything, or a single concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    pub fn only(value: &str) -> Self {
        Selector::Only(value.to_string())
    }

    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Selector::All => true,
            Selector::Only(wanted) => value == Some(wanted.as_str()),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selector::All)
    }

    pub fn label(&self) -> &str {
        match self {
            Selector::All => "All",
            Selector::Only(value) => value,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The three filterable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Metric,
    Severity,
    Source,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Metric => "Metric",
            Dimension::Severity => "Severity",
            Dimension::Source => "Source",
        }
    }

    /// Values always offered, whether or not they appear in the data.
    pub fn presets(&self) -> &'static [&'static str] {
        match self {
            Dimension::Metric => &["CPU", "RAM", "Disk"],
            Dimension::Severity => &["High", "Medium", "Low"],
            Dimension::Source => &["Rule-Based", "ML"],
        }
    }

    fn value_of<'a>(&self, event: &'a DerivedEvent) -> Option<&'a str> {
        match self {
            Dimension::Metric => event.metric(),
            Dimension::Severity => Some(event.severity()),
            Dimension::Source => Some(event.source()),
        }
    }
}

/// Independent selectors applied conjunctively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub metric: Selector,
    pub severity: Selector,
    pub source: Selector,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selector(&self, dimension: Dimension) -> &Selector {
        match dimension {
            Dimension::Metric => &self.metric,
            Dimension::Severity => &self.severity,
            Dimension::Source => &self.source,
        }
    }

    pub fn set(&mut self, dimension: Dimension, selector: Selector) {
        match dimension {
            Dimension::Metric => self.metric = selector,
            Dimension::Severity => self.severity = selector,
            Dimension::Source => self.source = selector,
        }
    }

    /// Advance one selector through `All` followed by `options`.
    ///
    /// A current value missing from `options` wraps back to `All`.
    pub fn cycle(&mut self, dimension: Dimension, options: &[String]) {
        let next = match self.selector(dimension) {
            Selector::All => options.first().map(|v| Selector::Only(v.clone())),
            Selector::Only(current) => options
                .iter()
                .position(|v| v == current)
                .and_then(|i| options.get(i + 1))
                .map(|v| Selector::Only(v.clone())),
        };
        self.set(dimension, next.unwrap_or(Selector::All));
    }

    pub fn is_unfiltered(&self) -> bool {
        self.metric.is_all() && self.severity.is_all() && self.source.is_all()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether an event passes all three selectors.
    pub fn matches(&self, event: &DerivedEvent) -> bool {
        self.metric.matches(Dimension::Metric.value_of(event))
            && self.severity.matches(Dimension::Severity.value_of(event))
            && self.source.matches(Dimension::Source.value_of(event))
    }
}

/// Keep the events passing `filter`, newest first.
///
/// Timestamps are compared as raw strings. The sort is stable, so events
/// with equal timestamps keep their input order.
pub fn project(events: &[DerivedEvent], filter: &FilterState) -> Vec<DerivedEvent> {
    let mut visible: Vec<DerivedEvent> =
        events.iter().filter(|e| filter.matches(e)).cloned().collect();
    visible.sort_by(|a, b| b.timestamp().cmp(a.timestamp()));
    visible
}

/// Selectable values for a dimension: presets, then any other values seen.
pub fn filter_options(events: &[DerivedEvent], dimension: Dimension) -> Vec<String> {
    let mut options: Vec<String> = dimension.presets().iter().map(|s| s.to_string()).collect();
    for event in events {
        if let Some(value) = dimension.value_of(event) {
            if !value.is_empty() && !options.iter().any(|o| o == value) {
                options.push(value.to_string());
            }
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AnomalyEvent;

    fn derived(events: Vec<AnomalyEvent>) -> Vec<DerivedEvent> {
        DerivedEvent::derive_all(&events)
    }

    fn sample() -> Vec<DerivedEvent> {
        derived(vec![
            AnomalyEvent::new("2024-01-01 10:00:00", "CPU", 92.0).with_source("Rule-Based"),
            AnomalyEvent::new("2024-01-01 12:00:00", "RAM", 80.0).with_source("ML"),
            AnomalyEvent::new("2024-01-01 11:00:00", "Disk", 10.0),
            AnomalyEvent::new("2024-01-01 11:00:00", "CPU", 50.0)
                .with_source("ML")
                .with_severity("High"),
        ])
    }

    fn stamps(rows: &[DerivedEvent]) -> Vec<(&str, &str)> {
        rows.iter().map(|r| (r.timestamp(), r.metric().unwrap_or("-"))).collect()
    }

    #[test]
    fn test_all_filters_returns_everything_sorted_desc() {
        let rows = project(&sample(), &FilterState::new());
        assert_eq!(
            stamps(&rows),
            vec![
                ("2024-01-01 12:00:00", "RAM"),
                // Ties keep input order
                ("2024-01-01 11:00:00", "Disk"),
                ("2024-01-01 11:00:00", "CPU"),
                ("2024-01-01 10:00:00", "CPU"),
            ]
        );
    }

    #[test]
    fn test_project_is_idempotent() {
        let events = sample();
        let mut filter = FilterState::new();
        filter.source = Selector::only("ML");

        let once = project(&events, &filter);
        let twice = project(&once, &filter);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let mut filter = FilterState::new();
        filter.metric = Selector::only("CPU");
        filter.severity = Selector::only("High");

        let rows = project(&sample(), &filter);
        assert_eq!(rows.len(), 2);

        filter.source = Selector::only("ML");
        let rows = project(&sample(), &filter);
        assert_eq!(stamps(&rows), vec![("2024-01-01 11:00:00", "CPU")]);
    }

    #[test]
    fn test_missing_source_filters_as_unknown() {
        let mut filter = FilterState::new();
        filter.source = Selector::only("Unknown");
        let rows = project(&sample(), &filter);
        assert_eq!(stamps(&rows), vec![("2024-01-01 11:00:00", "Disk")]);
    }

    #[test]
    fn test_missing_metric_only_matches_all() {
        let events = derived(vec![AnomalyEvent::default()]);
        let mut filter = FilterState::new();
        assert_eq!(project(&events, &filter).len(), 1);

        filter.metric = Selector::only("Unknown");
        assert!(project(&events, &filter).is_empty());
    }

    #[test]
    fn test_inferred_severity_filtering() {
        let events = derived(vec![AnomalyEvent::new("t", "CPU", 92.0)]);
        let mut filter = FilterState::new();

        filter.severity = Selector::only("Medium");
        assert!(project(&events, &filter).is_empty());

        filter.severity = Selector::All;
        assert_eq!(project(&events, &filter).len(), 1);
    }

    #[test]
    fn test_timestamps_compare_lexicographically() {
        let events = derived(vec![
            AnomalyEvent::new("9:00", "CPU", 1.0),
            AnomalyEvent::new("10:00", "CPU", 1.0),
        ]);
        let rows = project(&events, &FilterState::new());
        assert_eq!(rows[0].timestamp(), "9:00");
    }

    #[test]
    fn test_cycle_walks_options_and_wraps() {
        let options = filter_options(&sample(), Dimension::Metric);
        assert_eq!(options, vec!["CPU", "RAM", "Disk"]);

        let mut filter = FilterState::new();
        filter.cycle(Dimension::Metric, &options);
        assert_eq!(filter.metric, Selector::only("CPU"));
        filter.cycle(Dimension::Metric, &options);
        filter.cycle(Dimension::Metric, &options);
        assert_eq!(filter.metric, Selector::only("Disk"));
        filter.cycle(Dimension::Metric, &options);
        assert!(filter.metric.is_all());
        assert!(filter.is_unfiltered());
    }

    #[test]
    fn test_options_include_discovered_values() {
        let events = derived(vec![
            AnomalyEvent::new("t", "CPU", 1.0).with_severity("Critical").with_source("LSTM"),
        ]);
        assert_eq!(
            filter_options(&events, Dimension::Severity),
            vec!["High", "Medium", "Low", "Critical"]
        );
        assert_eq!(
            filter_options(&events, Dimension::Source),
            vec!["Rule-Based", "ML", "LSTM"]
        );
    }

    #[test]
    fn test_clear_resets_selectors() {
        let mut filter = FilterState::new();
        filter.set(Dimension::Source, Selector::only("ML"));
        assert!(!filter.is_unfiltered());
        filter.clear();
        assert!(filter.is_unfiltered());
    }
}
