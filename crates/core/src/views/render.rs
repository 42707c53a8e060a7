use std::collections::HashSet;

use careerline_protocol::{
    BlockLayout, Layout, NodeId, Point, Rect, RenderCommand, TextAlign, ThemeToken,
};

use crate::viewport::ViewportState;

pub const AXIS_HEIGHT: f64 = 56.0;
const BRACKET_TOP: f64 = 4.0;
const BRACKET_HEIGHT: f64 = 20.0;
const TICK_HEIGHT: f64 = 8.0;
const FONT_SIZE: f64 = 10.0;
const LANE_PADDING: f64 = 12.0;
const CHILD_RADIUS: f64 = 6.0;

/// Turn a layout into draw commands in viewport coordinates.
///
/// Two groups are emitted, `axis` then `blocks`, followed by the "now" marker
/// when it is on screen. Without a measured viewport the whole content width
/// is drawn.
pub fn render_layout(layout: &Layout, state: &ViewportState) -> Vec<RenderCommand> {
    let width = state.width().unwrap_or(layout.content_width);
    let dx = -state.scroll_offset;
    let mut commands = Vec::with_capacity(
        8 + layout.ticks.len() * 2 + layout.brackets.len() * 2 + layout.blocks.len() * 4,
    );

    render_axis(&mut commands, layout, width, dx);

    let flagged: HashSet<NodeId> = layout.warnings.iter().map(|w| w.event_id).collect();
    commands.push(RenderCommand::BeginGroup {
        id: "blocks".into(),
        label: Some("Timeline".into()),
    });
    for block in &layout.blocks {
        render_block(&mut commands, block, dx, &flagged);
    }
    commands.push(RenderCommand::EndGroup);

    let now_x = layout.now_left + dx;
    if (0.0..=width).contains(&now_x) {
        commands.push(RenderCommand::DrawLine {
            from: Point::new(now_x, 0.0),
            to: Point::new(now_x, AXIS_HEIGHT + LANE_PADDING + layout.content_height),
            color: ThemeToken::NowMarker,
            width: 2.0,
        });
    }

    commands
}

fn render_axis(commands: &mut Vec<RenderCommand>, layout: &Layout, width: f64, dx: f64) {
    commands.push(RenderCommand::BeginGroup {
        id: "axis".into(),
        label: Some("Time axis".into()),
    });

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, width, AXIS_HEIGHT),
        color: ThemeToken::AxisBackground,
        border_color: Some(ThemeToken::AxisBorder),
        label: None,
        node_id: None,
    });

    for bracket in &layout.brackets {
        let x = bracket.left + dx;
        commands.push(RenderCommand::DrawRect {
            rect: Rect::new(x, BRACKET_TOP, bracket.width, BRACKET_HEIGHT),
            color: ThemeToken::AxisBackground,
            border_color: Some(ThemeToken::BracketBorder),
            label: None,
            node_id: None,
        });
        // Keep the label readable when the bracket is wider than the screen.
        let visible_left = x.max(0.0);
        let visible_right = (x + bracket.width).min(width);
        if visible_right > visible_left {
            commands.push(RenderCommand::DrawText {
                position: Point::new(
                    (visible_left + visible_right) / 2.0,
                    BRACKET_TOP + FONT_SIZE + 2.0,
                ),
                text: bracket.label.clone(),
                color: ThemeToken::BracketLabel,
                font_size: FONT_SIZE,
                align: TextAlign::Center,
            });
        }
    }

    for tick in &layout.ticks {
        let x = tick.left + dx;
        commands.push(RenderCommand::DrawLine {
            from: Point::new(x, AXIS_HEIGHT - TICK_HEIGHT),
            to: Point::new(x, AXIS_HEIGHT),
            color: ThemeToken::TickLine,
            width: 1.0,
        });
        commands.push(RenderCommand::DrawText {
            position: Point::new(x, AXIS_HEIGHT - TICK_HEIGHT - 4.0),
            text: tick.label.clone(),
            color: ThemeToken::TickLabel,
            font_size: FONT_SIZE,
            align: TextAlign::Center,
        });
    }

    commands.push(RenderCommand::EndGroup);
}

fn render_block(
    commands: &mut Vec<RenderCommand>,
    block: &BlockLayout,
    dx: f64,
    flagged: &HashSet<NodeId>,
) {
    let x = block.left + dx;
    let y = AXIS_HEIGHT + LANE_PADDING + block.top;
    let border = if flagged.contains(&block.event_id) {
        ThemeToken::WarningOutline
    } else {
        ThemeToken::BlockBorder
    };
    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(x, y, block.width, block.height),
        color: ThemeToken::for_kind(block.kind),
        border_color: Some(border),
        label: Some(block.title.clone()),
        node_id: Some(block.event_id),
    });

    let center_y = y + block.height / 2.0;
    for child in &block.children {
        let center = Point::new(x + child.left + child.width / 2.0, center_y);
        commands.push(RenderCommand::DrawCircle {
            center,
            radius: CHILD_RADIUS,
            color: if child.out_of_bounds {
                ThemeToken::WarningOutline
            } else {
                ThemeToken::ChildSphere
            },
            node_id: Some(child.event_id),
        });
        commands.push(RenderCommand::DrawText {
            position: Point::new(center.x, center.y + CHILD_RADIUS + FONT_SIZE + 2.0),
            text: child.title.clone(),
            color: ThemeToken::ChildLabel,
            font_size: FONT_SIZE,
            align: TextAlign::Center,
        });
    }
}
