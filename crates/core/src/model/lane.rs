use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use careerline_protocol::{NodeId, TimelineEvent};
use tracing::{debug, warn};

use super::validate::validate_span;

/// Lane index per top-level event.
///
/// Derived from the current block set and recomputed whenever it changes;
/// panning and zooming never touch it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneAssignment {
    lanes: HashMap<NodeId, usize>,
    lane_count: usize,
}

impl LaneAssignment {
    /// Lane of `id`, or `None` if the event was not assigned (malformed span).
    pub fn lane_of(&self, id: NodeId) -> Option<usize> {
        self.lanes.get(&id).copied()
    }

    /// Number of lanes in use.
    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    /// Number of assigned events.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.lanes.iter().map(|(&id, &lane)| (id, lane))
    }
}

/// An open lane keyed by the instant it becomes free again.
#[derive(Debug, Clone, Copy)]
struct LaneEnd {
    end: f64,
    lane: usize,
}

impl PartialEq for LaneEnd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LaneEnd {}

impl PartialOrd for LaneEnd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LaneEnd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.end
            .total_cmp(&other.end)
            .then(self.lane.cmp(&other.lane))
    }
}

/// Greedy interval partitioning over top-level events.
///
/// Events are taken in `(start, id)` order and each goes to the lowest-indexed
/// lane whose last event ended strictly before it starts, so back-to-back
/// events (one ends exactly when the next starts) land in different lanes.
/// When no lane is free a new one opens. Ongoing events occupy their lane
/// until `now_ms`.
///
/// Because starts are visited in order, a lane that is free for one event is
/// free for every later one. Lanes therefore move from a min-heap of busy
/// lanes (by end) into an ordered free set exactly once, which gives the same
/// lowest-index-first choice as a linear scan in O(n log n). The lane count
/// equals the maximum number of simultaneously active events.
///
/// Malformed events (finished without an end, or ending before they start)
/// are skipped and get no lane.
pub fn assign_lanes<'a>(
    events: impl IntoIterator<Item = &'a TimelineEvent>,
    now_ms: f64,
) -> LaneAssignment {
    let mut spans: Vec<(f64, f64, NodeId)> = Vec::new();
    for event in events {
        if let Err(err) = validate_span(event) {
            warn!(%err, "skipping event in lane assignment");
            continue;
        }
        spans.push((event.start_ms(), event.effective_end_ms(now_ms), event.id));
    }
    spans.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.2.cmp(&b.2)));

    let mut busy: BinaryHeap<Reverse<LaneEnd>> = BinaryHeap::new();
    let mut free: BTreeSet<usize> = BTreeSet::new();
    let mut lanes = HashMap::with_capacity(spans.len());
    let mut lane_count = 0;

    for (start, end, id) in spans {
        while let Some(Reverse(top)) = busy.peek() {
            if top.end < start {
                free.insert(top.lane);
                busy.pop();
            } else {
                break;
            }
        }

        let lane = match free.pop_first() {
            Some(lane) => lane,
            None => {
                lane_count += 1;
                lane_count - 1
            }
        };
        busy.push(Reverse(LaneEnd { end, lane }));
        lanes.insert(id, lane);
    }

    debug!(events = lanes.len(), lanes = lane_count, "assigned lanes");
    LaneAssignment { lanes, lane_count }
}
