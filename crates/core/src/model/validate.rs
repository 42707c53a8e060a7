use careerline_protocol::{HierarchyIssue, NodeId, TimelineEvent};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A single event whose own time span cannot be laid out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("node {id}: finished events need an end date")]
    MissingEnd { id: NodeId },
    #[error("node {id}: end {end} is before start {start}")]
    EndBeforeStart {
        id: NodeId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Check an event's own span.
///
/// Ongoing events are always valid: they extend to "now" and any stored end
/// date is ignored. Finished events need an end that is not before the start.
pub fn validate_span(event: &TimelineEvent) -> Result<(), EventError> {
    if event.is_ongoing {
        return Ok(());
    }
    let Some(end) = event.end else {
        return Err(EventError::MissingEnd { id: event.id });
    };
    if end < event.start {
        return Err(EventError::EndBeforeStart {
            id: event.id,
            start: event.start,
            end,
        });
    }
    Ok(())
}

/// Check a child's span against its parent's.
///
/// - the child may not start before the parent;
/// - an ongoing parent has no upper bound;
/// - under a finished parent the child must be finished too and end no later.
///
/// A finished child without an end is a malformed span, reported by
/// [`validate_span`] rather than here.
pub fn check_child_bounds(
    parent: &TimelineEvent,
    child: &TimelineEvent,
) -> Option<HierarchyIssue> {
    if child.start < parent.start {
        return Some(HierarchyIssue::StartsBeforeParent);
    }
    if parent.is_ongoing {
        return None;
    }
    let parent_end = parent.end?;
    match child.end {
        _ if child.is_ongoing => Some(HierarchyIssue::OngoingUnderFinishedParent),
        None => None,
        Some(end) if end > parent_end => Some(HierarchyIssue::EndsAfterParent),
        Some(_) => None,
    }
}
