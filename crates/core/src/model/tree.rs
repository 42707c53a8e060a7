use std::collections::{HashMap, HashSet};

use careerline_protocol::{HierarchyIssue, LayoutWarning, NodeId, TimeWindow, TimelineEvent};
use tracing::{debug, warn};

use super::validate::{check_child_bounds, validate_span};

/// A top-level event and the children it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// The block's own event; its `children` field is always empty.
    pub event: TimelineEvent,
    /// Owned children, ordered by `(start, id)`.
    pub children: Vec<TimelineEvent>,
}

impl Block {
    pub fn id(&self) -> NodeId {
        self.event.id
    }
}

/// Two-tier event container: top-level blocks, each owning a flat child list.
///
/// The timeline never nests deeper than one level, so there is no recursive
/// graph here. Nodes that cannot be placed (orphans, grandchildren, duplicate
/// ids) are set aside and reported as warnings rather than rendered.
#[derive(Debug, Clone, Default)]
pub struct EventTree {
    blocks: Vec<Block>,
    index: HashMap<NodeId, usize>,
    unplaced: Vec<TimelineEvent>,
    warnings: Vec<LayoutWarning>,
}

impl EventTree {
    /// Build from the hierarchical shape (top-level events carrying `children`).
    ///
    /// Nested nodes inherit their container as parent when they do not name
    /// one, then everything goes through [`EventTree::from_flat`].
    pub fn from_hierarchy(events: Vec<TimelineEvent>) -> Self {
        let mut flat = Vec::with_capacity(events.len());
        for event in events {
            flatten_into(event, None, &mut flat);
        }
        Self::from_flat(flat)
    }

    /// Build from a flat node list.
    ///
    /// 1. Sort every node by `(start, id)`.
    /// 2. Top-level nodes (no parent) become blocks.
    /// 3. Children attach to their block; anything else is set aside.
    pub fn from_flat(mut nodes: Vec<TimelineEvent>) -> Self {
        nodes.sort_by(|a, b| a.start.cmp(&b.start).then(a.id.cmp(&b.id)));

        let mut tree = Self::default();
        let mut seen = HashSet::with_capacity(nodes.len());
        let mut children = Vec::new();

        for mut node in nodes {
            node.children.clear();
            if !seen.insert(node.id) {
                tree.flag(&node, HierarchyIssue::DuplicateId);
                tree.unplaced.push(node);
                continue;
            }
            if validate_span(&node).is_err() {
                tree.flag(&node, HierarchyIssue::MalformedSpan);
            }
            if node.is_top_level() {
                tree.index.insert(node.id, tree.blocks.len());
                tree.blocks.push(Block {
                    event: node,
                    children: Vec::new(),
                });
            } else {
                children.push(node);
            }
        }

        // Children come second so a parent that sorts after its child is
        // still found.
        let child_ids: HashSet<NodeId> = children.iter().map(|c| c.id).collect();
        for child in children {
            let Some(parent_id) = child.parent_id else {
                continue;
            };
            match tree.index.get(&parent_id).copied() {
                Some(slot) => {
                    if let Some(issue) = check_child_bounds(&tree.blocks[slot].event, &child) {
                        tree.flag(&child, issue);
                    }
                    tree.blocks[slot].children.push(child);
                }
                None => {
                    let issue = if child_ids.contains(&parent_id) {
                        HierarchyIssue::NestedTooDeep
                    } else {
                        HierarchyIssue::OrphanedChild
                    };
                    warn!(
                        node = %child.id,
                        parent = %parent_id,
                        %issue,
                        "timeline node not placed"
                    );
                    tree.flag(&child, issue);
                    tree.unplaced.push(child);
                }
            }
        }

        debug!(
            blocks = tree.blocks.len(),
            children = tree.child_count(),
            unplaced = tree.unplaced.len(),
            "built event tree"
        );
        tree
    }

    fn flag(&mut self, event: &TimelineEvent, issue: HierarchyIssue) {
        self.warnings.push(LayoutWarning {
            event_id: event.id,
            parent_id: event.parent_id,
            issue,
        });
    }

    /// Top-level blocks ordered by `(start, id)`.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: NodeId) -> Option<&Block> {
        self.index.get(&id).map(|&slot| &self.blocks[slot])
    }

    /// Nodes that could not be attached anywhere.
    pub fn unplaced(&self) -> &[TimelineEvent] {
        &self.unplaced
    }

    pub fn warnings(&self) -> &[LayoutWarning] {
        &self.warnings
    }

    /// Number of top-level blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.blocks.iter().map(|b| b.children.len()).sum()
    }

    /// Earliest start and latest effective end over all placed events.
    pub fn time_extent(&self, now_ms: f64) -> Option<TimeWindow> {
        let events = self
            .blocks
            .iter()
            .flat_map(|b| std::iter::once(&b.event).chain(b.children.iter()));
        let mut extent: Option<TimeWindow> = None;
        for event in events {
            let start = event.start_ms();
            let end = event.effective_end_ms(now_ms).max(start);
            extent = Some(match extent {
                Some(w) => TimeWindow::new(w.start.min(start), w.end.max(end)),
                None => TimeWindow::new(start, end),
            });
        }
        extent
    }
}

fn flatten_into(mut event: TimelineEvent, container: Option<NodeId>, out: &mut Vec<TimelineEvent>) {
    if event.parent_id.is_none() {
        event.parent_id = container;
    }
    let id = event.id;
    let nested = std::mem::take(&mut event.children);
    out.push(event);
    for child in nested {
        flatten_into(child, Some(id), out);
    }
}
