pub mod commands;
pub mod layout;
pub mod theme;
pub mod timeline;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use layout::{
    AxisInfo, BlockLayout, Bracket, ChildLayout, HierarchyIssue, Layout, LayoutWarning, Tick,
    TickUnit,
};
pub use theme::ThemeToken;
pub use timeline::{DateGranularity, EventKind, NodeId, TimelineDocument, TimelineEvent, TimelineId};
pub use types::{Point, Rect, TimeWindow};
