use careerline_protocol::TimelineId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SourceError;

/// Tags one fetch. Only the most recently issued ticket is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadTicket {
    pub timeline: TimelineId,
    pub generation: u64,
}

/// Loading status shown by the surrounding UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LoadState {
    #[default]
    Idle,
    Loading { timeline: TimelineId },
    Ready { timeline: TimelineId },
    Failed { timeline: TimelineId, message: String },
}

/// Single-flight bookkeeping for event fetches.
///
/// Each [`begin`](LoadTracker::begin) supersedes the previous request, and a
/// result carrying an older ticket is dropped when it arrives.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    generation: u64,
    current: Option<LoadTicket>,
    state: LoadState,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, timeline: TimelineId) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket {
            timeline,
            generation: self.generation,
        };
        self.current = Some(ticket);
        self.state = LoadState::Loading { timeline };
        debug!(%timeline, generation = ticket.generation, "load started");
        ticket
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.current == Some(ticket)
    }

    /// Record the outcome of `ticket`'s fetch.
    ///
    /// Returns the payload only for the current ticket on success. Failures
    /// move the tracker to [`LoadState::Failed`]; stale results change nothing.
    pub fn complete<T>(&mut self, ticket: LoadTicket, result: Result<T, SourceError>) -> Option<T> {
        if !self.is_current(ticket) {
            warn!(
                timeline = %ticket.timeline,
                generation = ticket.generation,
                "discarding stale load result"
            );
            return None;
        }
        match result {
            Ok(value) => {
                self.state = LoadState::Ready {
                    timeline: ticket.timeline,
                };
                Some(value)
            }
            Err(err) => {
                warn!(timeline = %ticket.timeline, %err, "load failed");
                self.state = LoadState::Failed {
                    timeline: ticket.timeline,
                    message: err.to_string(),
                };
                None
            }
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn current(&self) -> Option<LoadTicket> {
        self.current
    }
}
