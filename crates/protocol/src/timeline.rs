//! The timeline IR every data source produces and every layout pass consumes.
//!
//! The field names follow the JSON emitted by the timelines REST backend
//! (`snake_case`, `type` for the node kind, `is_current` for ongoing events).
//! The camelCase spellings used by browser clients are accepted as aliases.
//!
//! ```text
//!   REST backend ─┐
//!   JSON file    ─┼─▶ TimelineEvent[] ─▶ EventTree ─▶ Layout ─▶ RenderCommand[]
//!   wasm host    ─┘       (this)       (blocks +   (geometry, (DrawRect,
//!                                       children)   ticks)     DrawText…)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a timeline node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a whole timeline (one user's career history).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimelineId(pub u64);

impl std::fmt::Display for TimelineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timeline {}", self.0)
    }
}

/// What kind of career event a node records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Work,
    Education,
    Project,
    Certification,
    Blog,
    Milestone,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Work => write!(f, "Work"),
            Self::Education => write!(f, "Education"),
            Self::Project => write!(f, "Project"),
            Self::Certification => write!(f, "Certification"),
            Self::Blog => write!(f, "Blog"),
            Self::Milestone => write!(f, "Milestone"),
        }
    }
}

/// How precisely the user knows the dates of an event. Informational only;
/// layout always uses the stored instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateGranularity {
    #[default]
    Exact,
    Month,
    Year,
    Season,
}

/// A single timeline node: a top-level block when `parent_id` is `None`,
/// otherwise a child of that block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: NodeId,
    #[serde(default, alias = "timelineId")]
    pub timeline_id: Option<TimelineId>,
    #[serde(default, alias = "parentId")]
    pub parent_id: Option<NodeId>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(rename = "start_date", alias = "startDate")]
    pub start: DateTime<Utc>,
    #[serde(default, rename = "end_date", alias = "endDate")]
    pub end: Option<DateTime<Utc>>,
    /// Still running ("current position"). An ongoing event extends to "now".
    #[serde(default, rename = "is_current", alias = "isCurrent")]
    pub is_ongoing: bool,
    #[serde(default, alias = "dateGranularity")]
    pub date_granularity: DateGranularity,
    #[serde(default, alias = "shortSummary")]
    pub short_summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Nested nodes, present when the source returns the hierarchical shape.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TimelineEvent>,
}

impl TimelineEvent {
    /// Start instant in milliseconds since the Unix epoch.
    pub fn start_ms(&self) -> f64 {
        self.start.timestamp_millis() as f64
    }

    /// Stored end instant in milliseconds, ignoring the ongoing flag.
    pub fn end_ms(&self) -> Option<f64> {
        self.end.map(|end| end.timestamp_millis() as f64)
    }

    /// The instant this event is drawn up to.
    ///
    /// Ongoing events run until `now_ms` (never before their own start).
    /// A finished event without an end date collapses onto its start.
    pub fn effective_end_ms(&self, now_ms: f64) -> f64 {
        if self.is_ongoing {
            now_ms.max(self.start_ms())
        } else {
            self.end_ms().unwrap_or_else(|| self.start_ms())
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A timeline as returned by the backend's detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDocument {
    pub id: TimelineId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "isPublic")]
    pub is_public: bool,
    #[serde(default = "default_zoom_level", alias = "defaultZoomLevel")]
    pub default_zoom_level: u32,
    #[serde(default)]
    pub nodes: Vec<TimelineEvent>,
}

fn default_zoom_level() -> u32 {
    1
}
