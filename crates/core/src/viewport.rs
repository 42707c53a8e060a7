//! Zoom and scroll state for the horizontal timeline canvas.
//!
//! [`transition`] is the whole state machine and is a pure function;
//! [`ViewportController`] adds the per-session bookkeeping for initial
//! centering on top of it.

use careerline_protocol::TimeWindow;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scale::{Scale, ScaleLimits, to_instant, to_pixel};

/// Current zoom and scroll position.
///
/// Canvas pixel 0 is `view_origin`; the viewport shows canvas pixels
/// `[scroll_offset, scroll_offset + viewport_width)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub scale: Scale,
    pub scroll_offset: f64,
    pub view_origin: f64,
    /// `None` until the host reports the container size.
    pub viewport_width: Option<f64>,
}

impl ViewportState {
    pub fn new(scale: Scale, view_origin: f64) -> Self {
        Self {
            scale,
            scroll_offset: 0.0,
            view_origin,
            viewport_width: None,
        }
    }

    /// Width in pixels, once known and non-zero.
    pub fn width(&self) -> Option<f64> {
        self.viewport_width.filter(|w| w.is_finite() && *w > 0.0)
    }

    pub fn is_measured(&self) -> bool {
        self.width().is_some()
    }

    /// Instant under viewport-relative pixel `x`.
    pub fn instant_at(&self, x: f64) -> f64 {
        to_instant(self.view_origin, self.scroll_offset + x, self.scale)
    }

    /// Viewport-relative pixel of `instant`.
    pub fn viewport_x(&self, instant: f64) -> f64 {
        to_pixel(self.view_origin, instant, self.scale) - self.scroll_offset
    }

    /// Time range currently on screen.
    pub fn visible_window(&self) -> Option<TimeWindow> {
        self.buffered_window(0.0)
    }

    /// Time range on screen widened by `buffer_screens` viewport widths on
    /// each side, for virtualization.
    pub fn buffered_window(&self, buffer_screens: f64) -> Option<TimeWindow> {
        let width = self.width()?;
        let pad = width * buffer_screens.max(0.0);
        let left = self.scroll_offset - pad;
        let right = self.scroll_offset + width + pad;
        Some(TimeWindow::new(
            to_instant(self.view_origin, left, self.scale),
            to_instant(self.view_origin, right, self.scale),
        ))
    }
}

/// Where a zoom keeps its fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZoomAnchor {
    /// Viewport-relative pixel under the pointer.
    Pointer(f64),
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewportAction {
    /// Scroll container reported a new offset.
    Pan { offset: f64 },
    PanBy { delta: f64 },
    /// Multiply the scale by `factor`; `> 1` zooms in.
    Zoom { factor: f64, anchor: ZoomAnchor },
    Resize { width: f64 },
    /// Return to the session's starting scale, anchored at the center.
    ResetZoom,
    /// Scroll so `instant` sits in the middle of the viewport.
    CenterOn { instant: f64 },
    /// Move the view origin without moving the content on screen.
    Rebase { origin: f64 },
}

impl ViewportAction {
    /// Actions that come from the user rather than from layout bookkeeping.
    pub fn is_interaction(&self) -> bool {
        matches!(
            self,
            Self::Pan { .. } | Self::PanBy { .. } | Self::Zoom { .. } | Self::ResetZoom
        )
    }
}

/// Apply `action` to `state`.
///
/// Everything except `Resize` and `Rebase` needs a measured viewport and
/// returns `state` unchanged otherwise. Scroll offsets never go below zero.
pub fn transition(
    state: ViewportState,
    action: ViewportAction,
    limits: &ScaleLimits,
    reset_scale: Scale,
) -> ViewportState {
    match action {
        ViewportAction::Resize { width } => ViewportState {
            viewport_width: Some(width).filter(|w| w.is_finite() && *w > 0.0),
            ..state
        },
        ViewportAction::Rebase { origin } if origin.is_finite() => {
            let left = state.instant_at(0.0);
            ViewportState {
                view_origin: origin,
                scroll_offset: clamp_offset(to_pixel(origin, left, state.scale)),
                ..state
            }
        }
        ViewportAction::Rebase { .. } => state,
        _ => {
            let Some(width) = state.width() else {
                return state;
            };
            measured_transition(state, action, width, limits, reset_scale)
        }
    }
}

fn measured_transition(
    state: ViewportState,
    action: ViewportAction,
    width: f64,
    limits: &ScaleLimits,
    reset_scale: Scale,
) -> ViewportState {
    match action {
        ViewportAction::Pan { offset } if offset.is_finite() => ViewportState {
            scroll_offset: clamp_offset(offset),
            ..state
        },
        ViewportAction::PanBy { delta } if delta.is_finite() => ViewportState {
            scroll_offset: clamp_offset(state.scroll_offset + delta),
            ..state
        },
        ViewportAction::Zoom { factor, anchor } => {
            let focus_x = match anchor {
                ZoomAnchor::Pointer(x) if x.is_finite() => x.clamp(0.0, width),
                _ => width / 2.0,
            };
            rescale_about(state, limits.rescale(state.scale, factor), focus_x)
        }
        ViewportAction::ResetZoom => rescale_about(state, limits.clamp(reset_scale), width / 2.0),
        ViewportAction::CenterOn { instant } if instant.is_finite() => ViewportState {
            scroll_offset: clamp_offset(
                to_pixel(state.view_origin, instant, state.scale) - width / 2.0,
            ),
            ..state
        },
        _ => state,
    }
}

/// Change the scale while keeping the instant under `focus_x` at `focus_x`.
fn rescale_about(state: ViewportState, scale: Scale, focus_x: f64) -> ViewportState {
    if scale == state.scale {
        return state;
    }
    let focus = state.instant_at(focus_x);
    let scroll_offset = clamp_offset(to_pixel(state.view_origin, focus, scale) - focus_x);
    debug!(
        from = state.scale.px_per_ms(),
        to = scale.px_per_ms(),
        focus,
        "viewport rescaled"
    );
    ViewportState {
        scale,
        scroll_offset,
        ..state
    }
}

fn clamp_offset(offset: f64) -> f64 {
    offset.max(0.0)
}

/// Owns the [`ViewportState`] for one timeline session.
///
/// On top of [`transition`] it tracks whether the user has moved the view yet,
/// so the initial "center on now" happens at most once per session and never
/// overrides the user.
#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ViewportState,
    limits: ScaleLimits,
    reset_scale: Scale,
    interacted: bool,
    centered: bool,
    pending_center: Option<f64>,
}

impl ViewportController {
    pub fn new(limits: ScaleLimits, initial_scale: Scale, view_origin: f64) -> Self {
        let reset_scale = limits.clamp(initial_scale);
        Self {
            state: ViewportState::new(reset_scale, view_origin),
            limits,
            reset_scale,
            interacted: false,
            centered: false,
            pending_center: None,
        }
    }

    pub fn state(&self) -> &ViewportState {
        &self.state
    }

    pub fn limits(&self) -> &ScaleLimits {
        &self.limits
    }

    pub fn has_interacted(&self) -> bool {
        self.interacted
    }

    pub fn is_centered(&self) -> bool {
        self.centered
    }

    /// Apply an action. Returns whether the state changed.
    pub fn apply(&mut self, action: ViewportAction) -> bool {
        let before = self.state;
        if action.is_interaction() && before.is_measured() {
            self.interacted = true;
        }
        self.state = transition(before, action, &self.limits, self.reset_scale);
        if matches!(action, ViewportAction::Resize { .. }) {
            self.try_initial_center();
        }
        self.state != before
    }

    /// Center on `instant` once the viewport is measured, unless this session
    /// was already centered or the user has moved the view.
    pub fn request_initial_center(&mut self, instant: f64) {
        if self.centered || self.interacted {
            return;
        }
        self.pending_center = Some(instant);
        self.try_initial_center();
    }

    fn try_initial_center(&mut self) {
        if self.interacted {
            self.pending_center = None;
            return;
        }
        let Some(instant) = self.pending_center else {
            return;
        };
        if !self.state.is_measured() {
            return;
        }
        self.state = transition(
            self.state,
            ViewportAction::CenterOn { instant },
            &self.limits,
            self.reset_scale,
        );
        self.pending_center = None;
        self.centered = true;
        debug!(instant, offset = self.state.scroll_offset, "initial centering");
    }

    /// Start a new session at `view_origin`. The viewport width survives.
    pub fn reset_session(&mut self, view_origin: f64) {
        let width = self.state.viewport_width;
        self.state = ViewportState {
            viewport_width: width,
            ..ViewportState::new(self.reset_scale, view_origin)
        };
        self.interacted = false;
        self.centered = false;
        self.pending_center = None;
    }
}
