pub mod lane;
pub mod tree;
pub mod validate;

pub use lane::{LaneAssignment, assign_lanes};
pub use tree::{Block, EventTree};
pub use validate::{EventError, check_child_bounds, validate_span};
