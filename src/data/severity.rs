//! Fallback severity classification for anomaly events.
//!
//! The backend's verdict is authoritative. [`classify`] is only consulted
//! when an event arrives without one.

use std::fmt;

/// Severity levels the classifier can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }

    /// Parse one of the canonical labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "High" => Some(Severity::High),
            "Medium" => Some(Severity::Medium),
            "Low" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a reading by metric name and value.
///
/// | metric   | High  | Medium | else |
/// |----------|-------|--------|------|
/// | CPU, RAM | >= 90 | >= 75  | Low  |
/// | Disk     | >= 95 | >= 85  | Low  |
/// | other    |       |        | Low  |
pub fn classify(metric: &str, value: f64) -> Severity {
    let (high, medium) = match metric {
        "CPU" | "RAM" => (90.0, 75.0),
        "Disk" => (95.0, 85.0),
        _ => return Severity::Low,
    };

    if value >= high {
        Severity::High
    } else if value >= medium {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Where an event's severity came from.
///
/// Kept separate so the table can mark inferred verdicts; collapses to a
/// plain label via [`SeverityVerdict::label`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeverityVerdict {
    /// Provided by the backend, passed through untouched.
    FromSource(String),
    /// Computed locally because the backend omitted it.
    Inferred(Severity),
}

impl SeverityVerdict {
    pub fn label(&self) -> &str {
        match self {
            SeverityVerdict::FromSource(label) => label,
            SeverityVerdict::Inferred(severity) => severity.label(),
        }
    }

    pub fn is_inferred(&self) -> bool {
        matches!(self, SeverityVerdict::Inferred(_))
    }

    /// The canonical level, if the label is one of High/Medium/Low.
    pub fn level(&self) -> Option<Severity> {
        match self {
            SeverityVerdict::FromSource(label) => Severity::from_label(label),
            SeverityVerdict::Inferred(severity) => Some(*severity),
        }
    }
}
