use serde::{Deserialize, Serialize};

use crate::timeline::EventKind;

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    Background,
    Border,

    // Axis
    AxisBackground,
    AxisBorder,
    TickLine,
    TickLabel,
    BracketBorder,
    BracketLabel,
    NowMarker,

    // Blocks, one per event kind
    BlockWork,
    BlockEducation,
    BlockProject,
    BlockCertification,
    BlockBlog,
    BlockMilestone,
    BlockBorder,
    BlockText,

    // Children
    ChildSphere,
    ChildLabel,
    WarningOutline,
}

impl ThemeToken {
    /// Fill token for a block of the given kind.
    pub fn for_kind(kind: EventKind) -> Self {
        match kind {
            EventKind::Work => Self::BlockWork,
            EventKind::Education => Self::BlockEducation,
            EventKind::Project => Self::BlockProject,
            EventKind::Certification => Self::BlockCertification,
            EventKind::Blog => Self::BlockBlog,
            EventKind::Milestone => Self::BlockMilestone,
        }
    }
}
