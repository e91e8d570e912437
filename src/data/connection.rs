//! Push channel connection status.

/// Lifecycle signals reported by the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelSignal {
    Open,
    Close,
    Error,
}

/// Current state of the push channel as shown in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// The channel has not reported yet.
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn color_tag(&self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "gray",
            ConnectionStatus::Connected => "green",
            ConnectionStatus::Disconnected => "orange",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "Collector: Unknown",
            ConnectionStatus::Connected => "Collector: Connected",
            ConnectionStatus::Disconnected => "Collector: Disconnected",
        }
    }
}

/// Tracks the push channel state. Data events never change it.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    status: ConnectionStatus,
    transitions: u64,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a lifecycle signal.
    pub fn apply(&mut self, signal: ChannelSignal) {
        let next = match signal {
            ChannelSignal::Open => ConnectionStatus::Connected,
            ChannelSignal::Close | ChannelSignal::Error => ConnectionStatus::Disconnected,
        };
        if next != self.status {
            self.transitions += 1;
        }
        self.status = next;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// `(color_tag, label)` for display.
    pub fn display(&self) -> (&'static str, &'static str) {
        (self.status.color_tag(), self.status.label())
    }

    /// Number of state changes since creation.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_unknown() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.status(), ConnectionStatus::Unknown);
        assert_eq!(tracker.display(), ("gray", "Collector: Unknown"));
    }

    #[test]
    fn test_open_close_error_transitions() {
        let mut tracker = ConnectionTracker::new();

        tracker.apply(ChannelSignal::Open);
        assert_eq!(tracker.display(), ("green", "Collector: Connected"));

        tracker.apply(ChannelSignal::Close);
        assert_eq!(tracker.status(), ConnectionStatus::Disconnected);

        tracker.apply(ChannelSignal::Open);
        tracker.apply(ChannelSignal::Error);
        assert_eq!(tracker.display(), ("orange", "Collector: Disconnected"));
        assert_eq!(tracker.transitions(), 4);
    }

    #[test]
    fn test_repeated_signal_is_not_a_transition() {
        let mut tracker = ConnectionTracker::new();
        tracker.apply(ChannelSignal::Open);
        tracker.apply(ChannelSignal::Open);
        assert_eq!(tracker.transitions(), 1);
        assert_eq!(tracker.status(), ConnectionStatus::Connected);
    }
}
