//! Layout and viewport engine for a zoomable career timeline.
//!
//! Events go in, a [`Layout`](careerline_protocol::Layout) comes out:
//! lanes for concurrent blocks, pixel geometry at the current zoom, and the
//! axis ticks for the visible window. [`TimelineView`] ties the pieces to one
//! open timeline; everything underneath is usable on its own.

pub mod config;
pub mod model;
pub mod scale;
pub mod source;
pub mod timeline_view;
pub mod viewport;
pub mod views;

pub use config::{ConfigError, EngineConfig};
pub use model::{EventError, EventTree, LaneAssignment, assign_lanes};
pub use scale::{Scale, ScaleError, ScaleLimits, to_instant, to_pixel, width_of};
pub use source::{EventSource, JsonFileSource, LoadState, LoadTicket, MemorySource, SourceError};
pub use timeline_view::{InputEvent, TimelineView};
pub use viewport::{ViewportAction, ViewportController, ViewportState, ZoomAnchor, transition};
pub use views::{TickStrategy, compute_layout, render_layout, view_bounds};
