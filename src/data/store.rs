//! Held anomaly set and reconciliation of fetch completions.
//!
//! Every successful fetch replaces the whole set. Fetches are started from
//! two places (the poll timer and `anomaly_alert` pushes) and may finish in
//! any order, so each one carries a [`RequestToken`] and only the most
//! recently issued token may write.

use std::time::Instant;

use tracing::{debug, warn};

use super::event::{AnomalyEvent, DerivedEvent};
use crate::source::FetchError;

/// Monotonically increasing identifier of one fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What happened to a fetch completion handed to [`EventStore::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The result replaced the held set.
    Applied { count: usize },
    /// A newer request was issued after this one; the result was dropped.
    Stale,
    /// The fetch failed; the held set is unchanged.
    Failed,
    /// The store was closed; nothing was written.
    Discarded,
}

/// Holds the current anomaly set.
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<AnomalyEvent>,
    issued: u64,
    pending: Option<RequestToken>,
    applied: Option<RequestToken>,
    last_error: Option<String>,
    last_updated: Option<Instant>,
    closed: bool,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held set wholesale.
    pub fn replace_all(&mut self, events: Vec<AnomalyEvent>) {
        self.events = events;
        self.last_updated = Some(Instant::now());
    }

    /// Issue the token for a new fetch.
    pub fn begin_fetch(&mut self) -> RequestToken {
        self.issued += 1;
        let token = RequestToken(self.issued);
        self.pending = Some(token);
        token
    }

    /// Apply a fetch outcome if it is still the latest request.
    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<Vec<AnomalyEvent>, FetchError>,
    ) -> Completion {
        if self.closed {
            debug!(token = token.0, "store closed, discarding completion");
            return Completion::Discarded;
        }

        if token.0 < self.issued {
            debug!(token = token.0, latest = self.issued, "discarding stale completion");
            return Completion::Stale;
        }

        if self.pending == Some(token) {
            self.pending = None;
        }

        match result {
            Ok(events) => {
                let count = events.len();
                debug!(token = token.0, count, "applying anomaly snapshot");
                self.replace_all(events);
                self.applied = Some(token);
                self.last_error = None;
                Completion::Applied { count }
            }
            Err(e) => {
                warn!(token = token.0, error = %e, "anomaly fetch failed, keeping previous set");
                self.last_error = Some(e.to_string());
                Completion::Failed
            }
        }
    }

    /// Stop accepting completions. Fetches still in flight finish into the void.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn events(&self) -> &[AnomalyEvent] {
        &self.events
    }

    /// Derived view of the held set, recomputed on every call.
    pub fn derived(&self) -> Vec<DerivedEvent> {
        DerivedEvent::derive_all(&self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Error from the latest failed fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Token of the last applied fetch.
    pub fn last_applied(&self) -> Option<RequestToken> {
        self.applied
    }

    pub fn last_updated(&self) -> Option<Instant> {
        self.last_updated
    }

    /// Whether the latest issued request has not completed yet.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some() && !self.closed
    }
}
