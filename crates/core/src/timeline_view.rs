//! The per-timeline orchestrator hosts talk to.

use careerline_protocol::{Layout, RenderCommand, TimeWindow, TimelineEvent, TimelineId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{ConfigError, EngineConfig};
use crate::model::{EventTree, LaneAssignment, assign_lanes};
use crate::source::{EventSource, LoadState, LoadTicket, LoadTracker, SourceError};
use crate::viewport::{ViewportAction, ViewportController, ViewportState, ZoomAnchor};
use crate::views::{compute_layout, render_layout, view_bounds};

/// Raw input from the host, before it is turned into a viewport action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    /// The scroll container moved to `offset`.
    Scroll { offset: f64 },
    /// Wheel with a zoom modifier zooms about the pointer; without one it pans.
    #[serde(rename_all = "camelCase")]
    Wheel {
        delta_y: f64,
        with_modifier: bool,
        pointer_x: Option<f64>,
    },
    ZoomIn,
    ZoomOut,
    ResetZoom,
    PanBy { delta: f64 },
    /// Pan by a fraction of the viewport width; negative goes back in time.
    PanScreens { screens: f64 },
    Resize { width: f64 },
    JumpTo { instant: f64 },
}

/// One open timeline: its events, lane packing and viewport.
#[derive(Debug)]
pub struct TimelineView {
    config: EngineConfig,
    timeline: Option<TimelineId>,
    tree: EventTree,
    lanes: LaneAssignment,
    bounds: TimeWindow,
    viewport: ViewportController,
    loads: LoadTracker,
}

impl TimelineView {
    pub fn new(config: EngineConfig, now_ms: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        let tree = EventTree::default();
        let bounds = view_bounds(&tree, now_ms, config.origin_padding_ms);
        let viewport =
            ViewportController::new(config.scale_limits()?, config.initial_scale()?, bounds.start);
        Ok(Self {
            config,
            timeline: None,
            tree,
            lanes: LaneAssignment::default(),
            bounds,
            viewport,
            loads: LoadTracker::new(),
        })
    }

    /// Start loading `timeline`.
    ///
    /// Switching to a different timeline starts a new session: events are
    /// cleared and the viewport returns to its initial zoom. Reopening the same
    /// timeline keeps both until the new data arrives.
    pub fn open(&mut self, timeline: TimelineId) -> LoadTicket {
        if self.timeline != Some(timeline) {
            info!(%timeline, "opening timeline");
            self.timeline = Some(timeline);
            self.tree = EventTree::default();
            self.lanes = LaneAssignment::default();
            self.viewport.reset_session(self.bounds.start);
        }
        self.loads.begin(timeline)
    }

    /// Deliver the result of a fetch started with [`open`](Self::open).
    ///
    /// Returns `true` when the events were accepted. Results for superseded
    /// tickets are dropped.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<TimelineEvent>, SourceError>,
        now_ms: f64,
    ) -> bool {
        let Some(events) = self.loads.complete(ticket, result) else {
            return false;
        };
        self.set_events(events, now_ms);
        self.viewport.request_initial_center(now_ms);
        true
    }

    /// Open `timeline` and fetch it synchronously from `source`.
    pub fn load_from<S>(&mut self, source: &S, timeline: TimelineId, now_ms: f64) -> bool
    where
        S: EventSource + ?Sized,
    {
        let ticket = self.open(timeline);
        let result = source.fetch_events(timeline);
        self.finish_load(ticket, result, now_ms)
    }

    /// Replace the event set, e.g. after an edit.
    ///
    /// Lanes and bounds are recomputed; the view origin moves with the new
    /// bounds without shifting what is on screen.
    pub fn set_events(&mut self, events: Vec<TimelineEvent>, now_ms: f64) {
        self.tree = EventTree::from_hierarchy(events);
        self.lanes = assign_lanes(self.tree.blocks().iter().map(|b| &b.event), now_ms);
        self.bounds = view_bounds(&self.tree, now_ms, self.config.origin_padding_ms);
        self.viewport.apply(ViewportAction::Rebase {
            origin: self.bounds.start,
        });
        debug!(
            blocks = self.tree.len(),
            lanes = self.lanes.lane_count(),
            warnings = self.tree.warnings().len(),
            "events replaced"
        );
    }

    /// Apply host input. Returns whether the viewport changed.
    pub fn handle(&mut self, input: InputEvent) -> bool {
        let action = self.action_for(input);
        self.viewport.apply(action)
    }

    fn action_for(&self, input: InputEvent) -> ViewportAction {
        match input {
            InputEvent::Scroll { offset } => ViewportAction::Pan { offset },
            InputEvent::Wheel {
                delta_y,
                with_modifier: true,
                pointer_x,
            } => ViewportAction::Zoom {
                factor: 2.0_f64.powf(-delta_y * self.config.wheel_sensitivity),
                anchor: pointer_x.map_or(ZoomAnchor::Center, ZoomAnchor::Pointer),
            },
            InputEvent::Wheel { delta_y, .. } => ViewportAction::PanBy { delta: delta_y },
            InputEvent::ZoomIn => ViewportAction::Zoom {
                factor: self.config.zoom_step,
                anchor: ZoomAnchor::Center,
            },
            InputEvent::ZoomOut => ViewportAction::Zoom {
                factor: self.config.zoom_step.recip(),
                anchor: ZoomAnchor::Center,
            },
            InputEvent::ResetZoom => ViewportAction::ResetZoom,
            InputEvent::PanBy { delta } => ViewportAction::PanBy { delta },
            InputEvent::PanScreens { screens } => ViewportAction::PanBy {
                delta: screens * self.viewport.state().width().unwrap_or(0.0),
            },
            InputEvent::Resize { width } => ViewportAction::Resize { width },
            InputEvent::JumpTo { instant } => ViewportAction::CenterOn { instant },
        }
    }

    pub fn layout(&self, now_ms: f64) -> Layout {
        compute_layout(
            &self.tree,
            &self.lanes,
            self.viewport.state(),
            &self.config,
            now_ms,
        )
    }

    pub fn render(&self, now_ms: f64) -> Vec<RenderCommand> {
        render_layout(&self.layout(now_ms), self.viewport.state())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn timeline(&self) -> Option<TimelineId> {
        self.timeline
    }

    pub fn tree(&self) -> &EventTree {
        &self.tree
    }

    pub fn lanes(&self) -> &LaneAssignment {
        &self.lanes
    }

    /// Time range the canvas covers.
    pub fn bounds(&self) -> TimeWindow {
        self.bounds
    }

    pub fn viewport(&self) -> &ViewportState {
        self.viewport.state()
    }

    pub fn controller(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn load_state(&self) -> &LoadState {
        self.loads.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{DAY_MS, Scale};
    use careerline_protocol::{DateGranularity, EventKind, NodeId};
    use chrono::{TimeZone, Utc};

    const NOW: f64 = 1_717_200_000_000.0; // 2024-06-01

    fn job(id: u64, year: i32) -> TimelineEvent {
        TimelineEvent {
            id: NodeId(id),
            timeline_id: None,
            parent_id: None,
            title: format!("job {id}"),
            kind: EventKind::Work,
            start: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
            end: Some(Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).unwrap()),
            is_ongoing: false,
            date_granularity: DateGranularity::Year,
            short_summary: None,
            description: None,
            children: vec![],
        }
    }

    fn view() -> TimelineView {
        TimelineView::new(EngineConfig::default(), NOW).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = EngineConfig {
            zoom_step: 0.5,
            ..EngineConfig::default()
        };
        assert!(TimelineView::new(config, NOW).is_err());
    }

    #[test]
    fn wheel_with_modifier_zooms_about_pointer() {
        let mut view = view();
        view.handle(InputEvent::Resize { width: 800.0 });
        view.handle(InputEvent::Scroll { offset: 1_000.0 });
        let focus = view.viewport().instant_at(200.0);
        assert!(view.handle(InputEvent::Wheel {
            delta_y: -100.0,
            with_modifier: true,
            pointer_x: Some(200.0),
        }));
        let state = view.viewport();
        assert!((state.scale.px_per_ms() - 4.0 / DAY_MS).abs() < 1e-15);
        assert!((state.viewport_x(focus) - 200.0).abs() < 1.0);
    }

    #[test]
    fn plain_wheel_pans() {
        let mut view = view();
        view.handle(InputEvent::Resize { width: 800.0 });
        view.handle(InputEvent::Wheel {
            delta_y: 120.0,
            with_modifier: false,
            pointer_x: None,
        });
        assert_eq!(view.viewport().scroll_offset, 120.0);
        assert_eq!(view.viewport().scale, Scale::per_day(2.0).unwrap());
    }

    #[test]
    fn zoom_buttons_use_configured_step() {
        let mut view = view();
        view.handle(InputEvent::Resize { width: 800.0 });
        view.handle(InputEvent::ZoomIn);
        let zoomed = view.viewport().scale.px_per_ms();
        assert!((zoomed - 2.4 / DAY_MS).abs() < 1e-15);
        view.handle(InputEvent::ZoomOut);
        assert!((view.viewport().scale.px_per_ms() - 2.0 / DAY_MS).abs() < 1e-15);
    }

    #[test]
    fn pan_screens_moves_by_viewport_widths() {
        let mut view = view();
        view.handle(InputEvent::Resize { width: 500.0 });
        view.handle(InputEvent::PanScreens { screens: 0.5 });
        assert_eq!(view.viewport().scroll_offset, 250.0);
    }

    #[test]
    fn first_load_centers_on_now_once() {
        let mut view = view();
        view.handle(InputEvent::Resize { width: 800.0 });
        let source = crate::source::MemorySource::new()
            .with_timeline(TimelineId(1), vec![job(1, 2020), job(2, 2023)]);

        assert!(view.load_from(&source, TimelineId(1), NOW));
        assert!((view.viewport().viewport_x(NOW) - 400.0).abs() < 1e-6);
        assert_eq!(view.lanes().lane_count(), 1);

        view.handle(InputEvent::PanBy { delta: 300.0 });
        assert!(view.load_from(&source, TimelineId(1), NOW));
        assert!((view.viewport().viewport_x(NOW) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn switching_timeline_starts_new_session() {
        let mut view = view();
        view.handle(InputEvent::Resize { width: 800.0 });
        view.handle(InputEvent::ZoomIn);
        let source = crate::source::MemorySource::new()
            .with_timeline(TimelineId(1), vec![job(1, 2020)])
            .with_timeline(TimelineId(2), vec![job(5, 2022)]);
        view.load_from(&source, TimelineId(1), NOW);
        view.load_from(&source, TimelineId(2), NOW);

        assert_eq!(view.timeline(), Some(TimelineId(2)));
        assert_eq!(view.viewport().scale, Scale::per_day(2.0).unwrap());
        assert!(view.controller().is_centered());
        assert_eq!(view.tree().blocks()[0].id(), NodeId(5));
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut view = view();
        let first = view.open(TimelineId(1));
        let second = view.open(TimelineId(2));

        assert!(!view.finish_load(first, Ok(vec![job(1, 2020)]), NOW));
        assert!(view.tree().is_empty());
        assert!(view.finish_load(second, Ok(vec![job(2, 2021)]), NOW));
        assert_eq!(view.tree().len(), 1);
        assert_eq!(
            view.load_state(),
            &LoadState::Ready {
                timeline: TimelineId(2)
            }
        );
    }

    #[test]
    fn failed_load_keeps_view_usable() {
        let mut view = view();
        let empty = crate::source::MemorySource::new();
        assert!(!view.load_from(&empty, TimelineId(9), NOW));
        assert!(matches!(view.load_state(), LoadState::Failed { .. }));
        assert!(view.layout(NOW).blocks.is_empty());
    }

    #[test]
    fn input_deserializes_from_host_json() {
        let json = r#"{"type":"wheel","deltaY":-3.0,"withModifier":true,"pointerX":12.5}"#;
        let input: InputEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            input,
            InputEvent::Wheel {
                delta_y: -3.0,
                with_modifier: true,
                pointer_x: Some(12.5),
            }
        );
        let input: InputEvent = serde_json::from_str(r#"{"type":"zoomIn"}"#).unwrap();
        assert_eq!(input, InputEvent::ZoomIn);
    }
}
