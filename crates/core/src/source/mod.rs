//! Where timeline events come from.
//!
//! The engine only needs `fetch_events(timeline)`. Hosts with a REST backend
//! implement [`EventSource`] themselves; the terminal viewer and the tests use
//! [`JsonFileSource`] and [`MemorySource`].

pub mod json;
pub mod load;

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use careerline_protocol::{TimelineEvent, TimelineId};
use thiserror::Error;
use tracing::debug;

pub use json::{Payload, parse_document, parse_payload};
pub use load::{LoadState, LoadTicket, LoadTracker};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} not found")]
    NotFound(TimelineId),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid timeline JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a timeline document or an array of nodes")]
    UnknownShape,
    #[error("document holds {found}, expected {expected}")]
    Mismatch {
        expected: TimelineId,
        found: TimelineId,
    },
    /// Failure reported by a host-side fetch (network, auth, ...).
    #[error("{0}")]
    Remote(String),
}

/// Read access to stored timelines.
pub trait EventSource {
    /// All nodes of a timeline, hierarchical or flat.
    fn fetch_events(&self, timeline: TimelineId) -> Result<Vec<TimelineEvent>, SourceError>;
}

/// In-memory timelines, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    timelines: HashMap<TimelineId, Vec<TimelineEvent>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeline(mut self, timeline: TimelineId, events: Vec<TimelineEvent>) -> Self {
        self.insert(timeline, events);
        self
    }

    pub fn insert(&mut self, timeline: TimelineId, events: Vec<TimelineEvent>) {
        self.timelines.insert(timeline, events);
    }
}

impl EventSource for MemorySource {
    fn fetch_events(&self, timeline: TimelineId) -> Result<Vec<TimelineEvent>, SourceError> {
        self.timelines
            .get(&timeline)
            .cloned()
            .ok_or(SourceError::NotFound(timeline))
    }
}

/// A directory of `<id>.json` files, each a timeline document or a bare node
/// array.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, timeline: TimelineId) -> PathBuf {
        self.dir.join(format!("{}.json", timeline.0))
    }
}

impl EventSource for JsonFileSource {
    fn fetch_events(&self, timeline: TimelineId) -> Result<Vec<TimelineEvent>, SourceError> {
        let path = self.path_for(timeline);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(timeline));
            }
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        debug!(path = %path.display(), bytes = data.len(), "read timeline file");

        match parse_payload(&data)? {
            Payload::Document(doc) if doc.id != timeline => Err(SourceError::Mismatch {
                expected: timeline,
                found: doc.id,
            }),
            payload => Ok(payload.into_events()),
        }
    }
}
