use careerline_protocol::{BlockLayout, ChildLayout, Layout, TimeWindow, TimelineEvent};
use tracing::debug;

use crate::config::EngineConfig;
use crate::model::{Block, EventTree, LaneAssignment, check_child_bounds};
use crate::scale::{Scale, YEAR_MS, to_pixel, width_of};
use crate::viewport::ViewportState;

use super::time_axis::{TickStrategy, generate_brackets, generate_ticks};

/// Time range the canvas covers.
///
/// Starts `padding_ms` before the earliest event and ends `padding_ms` after
/// the latest effective end. An empty timeline spans a year either side of
/// `now_ms`.
pub fn view_bounds(tree: &EventTree, now_ms: f64, padding_ms: f64) -> TimeWindow {
    match tree.time_extent(now_ms) {
        Some(extent) => TimeWindow::new(extent.start - padding_ms, extent.end + padding_ms),
        None => TimeWindow::new(now_ms - YEAR_MS, now_ms + YEAR_MS),
    }
}

/// Geometry for one frame.
///
/// Pure: the same tree, lanes, viewport and `now_ms` always give the same
/// layout. Without a measured viewport there is no axis and nothing is culled;
/// otherwise blocks outside the buffered window are dropped.
pub fn compute_layout(
    tree: &EventTree,
    lanes: &LaneAssignment,
    state: &ViewportState,
    config: &EngineConfig,
    now_ms: f64,
) -> Layout {
    let scale = state.scale;
    let origin = state.view_origin;
    let window = state.buffered_window(config.buffer_screens);

    let blocks: Vec<BlockLayout> = tree
        .blocks()
        .iter()
        .filter_map(|block| {
            let lane = lanes.lane_of(block.id())?;
            let start = block.event.start_ms();
            let end = block.event.effective_end_ms(now_ms);
            if window.is_some_and(|w| !w.intersects(start, end)) {
                return None;
            }
            Some(block_layout(block, lane, origin, scale, config, now_ms))
        })
        .collect();

    let (ticks, brackets, axis) = match window {
        Some(window) => {
            let strategy = TickStrategy::select(scale);
            (
                generate_ticks(&strategy, window, origin, scale, config.max_ticks),
                generate_brackets(&strategy, window, origin, scale, config.max_ticks),
                Some(strategy.axis_info()),
            )
        }
        None => (Vec::new(), Vec::new(), None),
    };

    let bounds = view_bounds(tree, now_ms, config.origin_padding_ms);
    let lane_count = lanes.lane_count();
    let layout = Layout {
        blocks,
        ticks,
        brackets,
        axis,
        window,
        lane_count,
        content_width: width_of(origin, bounds.end, scale),
        content_height: lane_count as f64 * config.lane_pitch(),
        now_left: to_pixel(origin, now_ms, scale),
        warnings: tree.warnings().to_vec(),
    };
    debug!(
        blocks = layout.blocks.len(),
        ticks = layout.ticks.len(),
        brackets = layout.brackets.len(),
        lanes = lane_count,
        "computed layout"
    );
    layout
}

fn block_layout(
    block: &Block,
    lane: usize,
    origin: f64,
    scale: Scale,
    config: &EngineConfig,
    now_ms: f64,
) -> BlockLayout {
    let event = &block.event;
    let start = event.start_ms();
    let left = to_pixel(origin, start, scale);
    let width = width_of(start, event.effective_end_ms(now_ms), scale).max(config.min_block_width);

    BlockLayout {
        event_id: event.id,
        title: event.title.clone(),
        kind: event.kind,
        ongoing: event.is_ongoing,
        left,
        width,
        lane,
        top: lane as f64 * config.lane_pitch(),
        height: config.lane_height,
        children: block
            .children
            .iter()
            .map(|child| child_layout(event, child, left, origin, scale, now_ms))
            .collect(),
    }
}

/// Children are drawn with their raw span, even when it leaves the parent's.
fn child_layout(
    parent: &TimelineEvent,
    child: &TimelineEvent,
    parent_left: f64,
    origin: f64,
    scale: Scale,
    now_ms: f64,
) -> ChildLayout {
    let start = child.start_ms();
    ChildLayout {
        event_id: child.id,
        title: child.title.clone(),
        kind: child.kind,
        left: to_pixel(origin, start, scale) - parent_left,
        width: width_of(start, child.effective_end_ms(now_ms), scale),
        out_of_bounds: check_child_bounds(parent, child).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::assign_lanes;
    use crate::scale::DAY_MS;
    use careerline_protocol::{DateGranularity, EventKind, NodeId, TickUnit};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn ms(y: i32, m: u32, d: u32) -> f64 {
        at(y, m, d).timestamp_millis() as f64
    }

    fn event(
        id: u64,
        parent: Option<u64>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> TimelineEvent {
        TimelineEvent {
            id: NodeId(id),
            timeline_id: None,
            parent_id: parent.map(NodeId),
            title: format!("event {id}"),
            kind: EventKind::Work,
            start,
            end,
            is_ongoing: end.is_none(),
            date_granularity: DateGranularity::Exact,
            short_summary: None,
            description: None,
            children: vec![],
        }
    }

    fn scenario() -> EventTree {
        EventTree::from_flat(vec![
            event(1, None, at(2024, 1, 1), Some(at(2024, 3, 1))),
            event(2, None, at(2024, 2, 1), Some(at(2024, 2, 15))),
            event(3, None, at(2024, 3, 2), Some(at(2024, 4, 1))),
            event(10, Some(1), at(2024, 1, 11), Some(at(2024, 1, 21))),
        ])
    }

    const NOW: f64 = 1_735_689_600_000.0; // 2025-01-01

    fn layout_for(tree: &EventTree, state: &ViewportState, config: &EngineConfig) -> Layout {
        let lanes = assign_lanes(tree.blocks().iter().map(|b| &b.event), NOW);
        compute_layout(tree, &lanes, state, config, NOW)
    }

    #[test]
    fn blocks_get_lanes_and_pixel_geometry() {
        let tree = scenario();
        let config = EngineConfig::default();
        let state = ViewportState::new(Scale::per_day(1.0).unwrap(), ms(2024, 1, 1));
        let layout = layout_for(&tree, &state, &config);

        let a = layout.block(NodeId(1)).unwrap();
        let b = layout.block(NodeId(2)).unwrap();
        let c = layout.block(NodeId(3)).unwrap();
        assert_eq!((a.lane, b.lane, c.lane), (0, 1, 0));
        assert!((a.left - 0.0).abs() < 1e-9);
        assert!((a.width - 60.0).abs() < 1e-9);
        assert!((b.left - 31.0).abs() < 1e-9);
        assert_eq!(b.top, config.lane_pitch());
        assert_eq!(layout.lane_count, 2);
        assert_eq!(layout.content_height, 2.0 * config.lane_pitch());
    }

    #[test]
    fn children_are_positioned_relative_to_their_block() {
        let tree = scenario();
        let state = ViewportState::new(Scale::per_day(1.0).unwrap(), ms(2023, 12, 1));
        let layout = layout_for(&tree, &state, &EngineConfig::default());
        let block = layout.block(NodeId(1)).unwrap();
        assert_eq!(block.children.len(), 1);
        let child = &block.children[0];
        assert!((child.left - 10.0).abs() < 1e-9);
        assert!((child.width - 10.0).abs() < 1e-9);
        assert!(!child.out_of_bounds);
    }

    #[test]
    fn unmeasured_viewport_has_no_axis_and_no_culling() {
        let tree = scenario();
        let state = ViewportState::new(Scale::per_day(1.0).unwrap(), ms(2024, 1, 1));
        let layout = layout_for(&tree, &state, &EngineConfig::default());
        assert_eq!(layout.blocks.len(), 3);
        assert!(layout.ticks.is_empty());
        assert!(layout.brackets.is_empty());
        assert!(layout.axis.is_none());
        assert!(layout.window.is_none());
    }

    #[test]
    fn measured_viewport_culls_to_buffered_window_and_builds_axis() {
        let tree = scenario();
        let config = EngineConfig {
            buffer_screens: 0.0,
            ..EngineConfig::default()
        };
        let state = ViewportState {
            viewport_width: Some(20.0),
            ..ViewportState::new(Scale::per_day(1.0).unwrap(), ms(2024, 1, 1))
        };
        // Days 0..20: only block 1 is on screen.
        let layout = layout_for(&tree, &state, &config);
        let ids: Vec<_> = layout.blocks.iter().map(|b| b.event_id).collect();
        assert_eq!(ids, [NodeId(1)]);
        assert_eq!(layout.axis.map(|a| a.unit), Some(TickUnit::Year));
        assert!(layout.window.is_some());
    }

    #[test]
    fn out_of_bounds_children_render_with_raw_span() {
        let tree = EventTree::from_flat(vec![
            event(1, None, at(2024, 1, 1), Some(at(2024, 2, 1))),
            event(2, Some(1), at(2023, 12, 22), Some(at(2024, 1, 5))),
        ]);
        let state = ViewportState::new(Scale::per_day(1.0).unwrap(), ms(2023, 12, 1));
        let layout = layout_for(&tree, &state, &EngineConfig::default());
        let child = &layout.block(NodeId(1)).unwrap().children[0];
        assert!(child.out_of_bounds);
        assert!((child.left + 10.0).abs() < 1e-9);
        assert!((child.width - 14.0).abs() < 1e-9);
        assert_eq!(layout.warnings.len(), 1);
    }

    #[test]
    fn ongoing_blocks_run_to_now() {
        let tree = EventTree::from_flat(vec![event(1, None, at(2024, 12, 1), None)]);
        let state = ViewportState::new(Scale::per_day(1.0).unwrap(), ms(2024, 12, 1));
        let layout = layout_for(&tree, &state, &EngineConfig::default());
        let block = layout.block(NodeId(1)).unwrap();
        assert!(block.ongoing);
        assert!((block.width - 31.0).abs() < 1e-9);
        assert!((layout.now_left - 31.0).abs() < 1e-9);
    }

    #[test]
    fn min_block_width_applies() {
        let tree = EventTree::from_flat(vec![event(1, None, at(2024, 1, 1), Some(at(2024, 1, 1)))]);
        let config = EngineConfig {
            min_block_width: 4.0,
            ..EngineConfig::default()
        };
        let state = ViewportState::new(Scale::per_day(1.0).unwrap(), ms(2024, 1, 1));
        let layout = layout_for(&tree, &state, &config);
        assert_eq!(layout.blocks[0].width, 4.0);
    }

    #[test]
    fn malformed_blocks_are_not_laid_out() {
        let mut broken = event(2, None, at(2024, 5, 1), Some(at(2024, 4, 1)));
        broken.is_ongoing = false;
        let tree = EventTree::from_flat(vec![
            event(1, None, at(2024, 1, 1), Some(at(2024, 2, 1))),
            broken,
        ]);
        let state = ViewportState::new(Scale::per_day(1.0).unwrap(), ms(2024, 1, 1));
        let layout = layout_for(&tree, &state, &EngineConfig::default());
        assert_eq!(layout.blocks.len(), 1);
        assert_eq!(layout.warnings.len(), 1);
    }

    #[test]
    fn bounds_pad_the_extent() {
        let tree = scenario();
        let bounds = view_bounds(&tree, NOW, 10.0 * DAY_MS);
        assert_eq!(bounds.start, ms(2023, 12, 22));
        assert_eq!(bounds.end, ms(2024, 4, 11));
    }

    #[test]
    fn empty_timeline_spans_a_year_around_now() {
        let bounds = view_bounds(&EventTree::default(), NOW, DAY_MS);
        assert_eq!(bounds.start, NOW - YEAR_MS);
        assert_eq!(bounds.end, NOW + YEAR_MS);
    }
}
