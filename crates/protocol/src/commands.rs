use serde::{Deserialize, Serialize};

use crate::theme::ThemeToken;
use crate::timeline::NodeId;
use crate::types::{Point, Rect};

/// A single, stateless render instruction.
///
/// The core turns a `Layout` into a `Vec<RenderCommand>` in viewport
/// coordinates. Renderers consume the list sequentially; each command carries
/// all the data it needs, so a terminal, canvas or DOM backend can draw it
/// without knowing anything about timelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Draw a filled rectangle, optionally labelled and tied to a timeline
    /// node (for hit-testing / editing).
    DrawRect {
        rect: Rect,
        color: ThemeToken,
        border_color: Option<ThemeToken>,
        label: Option<String>,
        node_id: Option<NodeId>,
    },

    /// Draw a filled circle. Child events render as spheres inside their block.
    DrawCircle {
        center: Point,
        radius: f64,
        color: ThemeToken,
        node_id: Option<NodeId>,
    },

    /// Draw a text string at a position.
    DrawText {
        position: Point,
        text: String,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw a line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
    },

    /// Begin a logical group (axis, lanes). Renderers may use this for
    /// layering or accessibility.
    BeginGroup { id: String, label: Option<String> },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}
