use serde::{Deserialize, Serialize};

use crate::timeline::{EventKind, NodeId};
use crate::types::TimeWindow;

/// Calendar unit a tick strategy steps in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickUnit {
    Hour,
    Day,
    Month,
    Year,
}

/// A primary axis mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Absolute instant (ms since epoch).
    pub instant: f64,
    pub label: String,
    /// Canvas x position (pixels from the view origin).
    pub left: f64,
}

/// A secondary, coarser grouping over several primary ticks, `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub start: f64,
    pub end: f64,
    pub label: String,
    pub left: f64,
    pub width: f64,
}

/// Which tick granularity produced the axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisInfo {
    pub unit: TickUnit,
    pub step: u32,
}

/// Geometry for a top-level event ("block").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockLayout {
    pub event_id: NodeId,
    pub title: String,
    pub kind: EventKind,
    pub ongoing: bool,
    /// Canvas x of the block's start.
    pub left: f64,
    pub width: f64,
    pub lane: usize,
    /// Vertical offset of the lane from the top of the block area.
    pub top: f64,
    pub height: f64,
    pub children: Vec<ChildLayout>,
}

/// Geometry for a child event, relative to its block's left edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildLayout {
    pub event_id: NodeId,
    pub title: String,
    pub kind: EventKind,
    pub left: f64,
    pub width: f64,
    /// The child's span leaves its parent's span; it is drawn as-is.
    pub out_of_bounds: bool,
}

/// Why an event is flagged by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyIssue {
    /// Non-ongoing event without an end, or ending before it starts.
    MalformedSpan,
    StartsBeforeParent,
    EndsAfterParent,
    /// Ongoing child under a parent with a fixed end.
    OngoingUnderFinishedParent,
    /// Parent id does not name a top-level event in this timeline.
    OrphanedChild,
    /// Child of a child; the timeline only nests one level deep.
    NestedTooDeep,
    DuplicateId,
}

impl std::fmt::Display for HierarchyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedSpan => write!(f, "span is malformed"),
            Self::StartsBeforeParent => write!(f, "starts before its parent"),
            Self::EndsAfterParent => write!(f, "ends after its parent"),
            Self::OngoingUnderFinishedParent => {
                write!(f, "is ongoing but its parent has a fixed end")
            }
            Self::OrphanedChild => write!(f, "references a missing parent"),
            Self::NestedTooDeep => write!(f, "is nested more than one level deep"),
            Self::DuplicateId => write!(f, "reuses an id already in the timeline"),
        }
    }
}

/// A data inconsistency surfaced to the editing UI. Layout never fails on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutWarning {
    pub event_id: NodeId,
    pub parent_id: Option<NodeId>,
    pub issue: HierarchyIssue,
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.parent_id {
            Some(parent) => write!(f, "node {} (parent {}) {}", self.event_id, parent, self.issue),
            None => write!(f, "node {} {}", self.event_id, self.issue),
        }
    }
}

/// Everything a renderer needs for one frame of the timeline.
///
/// Positions are canvas pixels measured from the view origin; renderers
/// subtract the scroll offset to get viewport coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub blocks: Vec<BlockLayout>,
    pub ticks: Vec<Tick>,
    pub brackets: Vec<Bracket>,
    /// `None` until the viewport has known dimensions.
    pub axis: Option<AxisInfo>,
    /// Visible time window including the virtualization buffer.
    pub window: Option<TimeWindow>,
    pub lane_count: usize,
    pub content_width: f64,
    pub content_height: f64,
    /// Canvas x of "now".
    pub now_left: f64,
    pub warnings: Vec<LayoutWarning>,
}

impl Layout {
    pub fn block(&self, id: NodeId) -> Option<&BlockLayout> {
        self.blocks.iter().find(|b| b.event_id == id)
    }
}
