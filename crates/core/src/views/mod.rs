pub mod layout;
pub mod render;
pub mod time_axis;

pub use layout::{compute_layout, view_bounds};
pub use render::{AXIS_HEIGHT, render_layout};
pub use time_axis::{LabelFormat, TickStrategy, generate_brackets, generate_ticks};
