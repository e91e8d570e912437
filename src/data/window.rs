//! Rolling window of live resource samples for the metrics chart.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Number of samples retained by the window.
pub const WINDOW_CAPACITY: usize = 15;

/// One `metrics_update` reading from the push channel.
///
/// A series missing from the payload is kept as `None` and rendered as a gap,
/// rather than dropping the whole sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub cpu: Option<f64>,
    #[serde(default)]
    pub ram: Option<f64>,
    #[serde(default)]
    pub disk: Option<f64>,
}

impl MetricSample {
    pub fn new(timestamp: impl Into<String>, cpu: f64, ram: f64, disk: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            cpu: Some(cpu),
            ram: Some(ram),
            disk: Some(disk),
        }
    }

    /// Value of the given series, if the sample carried one.
    pub fn value(&self, series: Series) -> Option<f64> {
        match series {
            Series::Cpu => self.cpu,
            Series::Ram => self.ram,
            Series::Disk => self.disk,
        }
    }
}

/// The three series plotted by the live metrics chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    Cpu,
    Ram,
    Disk,
}

impl Series {
    pub const ALL: [Series; 3] = [Series::Cpu, Series::Ram, Series::Disk];

    /// Legend label for this series.
    pub fn label(&self) -> &'static str {
        match self {
            Series::Cpu => "CPU %",
            Series::Ram => "RAM %",
            Series::Disk => "Disk %",
        }
    }
}

/// Fixed-capacity FIFO of the most recent samples.
///
/// Push order is sample order; the oldest sample is evicted once the window
/// is full.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl Default for SampleWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleWindow {
    /// Create an empty window holding [`WINDOW_CAPACITY`] samples.
    pub fn new() -> Self {
        Self::with_capacity(WINDOW_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a sample at the tail, evicting from the head past capacity.
    pub fn push(&mut self, sample: MetricSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Retained samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter()
    }

    /// Points for one series as `(position, value)`, oldest first.
    ///
    /// Positions are stable within a render pass so the x axis lines up
    /// across series even when one of them has gaps.
    pub fn series(&self, series: Series) -> Vec<(usize, Option<f64>)> {
        self.samples.iter().enumerate().map(|(i, s)| (i, s.value(series))).collect()
    }

    /// Timestamp labels in window order.
    pub fn labels(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.timestamp.as_str()).collect()
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
