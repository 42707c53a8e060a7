use std::io::{Stdout, stdout};
use std::ops::Range;
use std::time::Duration;

use anyhow::Result;
use careerline_core::scale::DAY_MS;
use careerline_core::views::AXIS_HEIGHT;
use careerline_core::{InputEvent, LoadState, TimelineView, render_layout};
use careerline_protocol::{Layout, RenderCommand, TextAlign, ThemeToken};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders},
};

/// Canvas pixels covered by one terminal cell.
const COL_PX: f64 = 8.0;
const ROW_PX: f64 = 16.0;
const PAN_SCREENS: f64 = 0.1;
/// Wheel delta reported per notch; zoom factor is 2^(-delta * sensitivity).
const WHEEL_DELTA: f64 = 40.0;
const ROW_SCROLL: u16 = 2;

pub fn now_ms() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64
}

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::Background => Color::Black,
        ThemeToken::Border => Color::DarkGray,
        ThemeToken::AxisBackground => Color::Rgb(30, 30, 30),
        ThemeToken::AxisBorder => Color::DarkGray,
        ThemeToken::TickLine => Color::Gray,
        ThemeToken::TickLabel => Color::Gray,
        ThemeToken::BracketBorder => Color::DarkGray,
        ThemeToken::BracketLabel => Color::White,
        ThemeToken::NowMarker => Color::LightRed,
        ThemeToken::BlockWork => Color::Rgb(40, 90, 160),
        ThemeToken::BlockEducation => Color::Rgb(40, 130, 80),
        ThemeToken::BlockProject => Color::Rgb(130, 70, 150),
        ThemeToken::BlockCertification => Color::Rgb(170, 120, 30),
        ThemeToken::BlockBlog => Color::Rgb(30, 130, 140),
        ThemeToken::BlockMilestone => Color::Rgb(160, 60, 60),
        ThemeToken::BlockBorder => Color::Gray,
        ThemeToken::BlockText => Color::White,
        ThemeToken::ChildSphere => Color::LightYellow,
        ThemeToken::ChildLabel => Color::White,
        ThemeToken::WarningOutline => Color::Yellow,
    }
}

/// Map canvas pixels to cells and paint `commands` into `area`.
///
/// The `axis` group stays pinned at the top; everything else moves up by
/// `scroll_rows` and is clipped below the axis.
fn paint(buf: &mut Buffer, area: Rect, commands: &[RenderCommand], scroll_rows: u16) {
    let axis_rows = (AXIS_HEIGHT / ROW_PX).ceil() as i32;
    let mut pinned = false;
    let mut canvas = Canvas {
        buf,
        area,
        top: axis_rows,
        shift: i32::from(scroll_rows),
    };

    for cmd in commands {
        let (top, shift) = if pinned {
            (0, 0)
        } else {
            (axis_rows, i32::from(scroll_rows))
        };
        canvas.top = top;
        canvas.shift = shift;

        match cmd {
            RenderCommand::BeginGroup { id, .. } => pinned = id == "axis",
            RenderCommand::EndGroup => pinned = false,
            RenderCommand::DrawRect {
                rect,
                color,
                border_color,
                label,
                ..
            } => {
                let col0 = col(rect.x);
                let col1 = col(rect.right()).max(col0 + 1);
                let row0 = row(rect.y);
                let row1 = row(rect.y + rect.h).max(row0 + 1);
                let bg = theme_to_color(*color);
                let rows = canvas.visible_rows(row0, row1);
                let cols = canvas.visible_cols(col0, col1);
                for r in rows.clone() {
                    for c in cols.clone() {
                        canvas.cell(c, r, ' ', Color::Reset, Some(bg));
                    }
                }
                if let Some(border) = border_color {
                    let fg = theme_to_color(*border);
                    for r in rows {
                        canvas.cell(col0, r, '▏', fg, Some(bg));
                    }
                }
                if let Some(label) = label {
                    let room = (col1 - col0 - 2).max(0) as usize;
                    let text: String = label.chars().take(room).collect();
                    canvas.text(col0 + 1, row0, &text, Color::White, Some(bg));
                }
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                align,
                ..
            } => {
                let len = text.chars().count() as i32;
                let anchor = col(position.x);
                let start = match align {
                    TextAlign::Left => anchor,
                    TextAlign::Center => anchor - len / 2,
                    TextAlign::Right => anchor - len,
                };
                canvas.text(start, row(position.y), text, theme_to_color(*color), None);
            }
            RenderCommand::DrawLine {
                from, to, color, ..
            } => {
                let fg = theme_to_color(*color);
                if col(from.x) == col(to.x) {
                    let (r0, r1) = (row(from.y.min(to.y)), row(from.y.max(to.y)));
                    for r in canvas.visible_rows(r0, r1 + 1) {
                        canvas.cell(col(from.x), r, '│', fg, None);
                    }
                } else {
                    let (c0, c1) = (col(from.x.min(to.x)), col(from.x.max(to.x)));
                    for c in canvas.visible_cols(c0, c1 + 1) {
                        canvas.cell(c, row(from.y), '─', fg, None);
                    }
                }
            }
            RenderCommand::DrawCircle { center, color, .. } => {
                canvas.cell(col(center.x), row(center.y), '●', theme_to_color(*color), None);
            }
        }
    }
}

fn col(px: f64) -> i32 {
    (px / COL_PX).floor() as i32
}

fn row(px: f64) -> i32 {
    (px / ROW_PX).floor() as i32
}

struct Canvas<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    /// First row commands may draw into.
    top: i32,
    shift: i32,
}

impl Canvas<'_> {
    /// Part of `c0..c1` that lands inside the area.
    fn visible_cols(&self, c0: i32, c1: i32) -> Range<i32> {
        c0.max(0)..c1.min(i32::from(self.area.width))
    }

    /// Part of `r0..r1` that lands inside the area once shifted.
    fn visible_rows(&self, r0: i32, r1: i32) -> Range<i32> {
        r0.max(self.top + self.shift)..r1.min(i32::from(self.area.height) + self.shift)
    }

    fn cell(&mut self, c: i32, r: i32, ch: char, fg: Color, bg: Option<Color>) {
        let r = r - self.shift;
        if !(0..i32::from(self.area.width)).contains(&c)
            || !(self.top..i32::from(self.area.height)).contains(&r)
        {
            return;
        }
        let x = self.area.x + c as u16;
        let y = self.area.y + r as u16;
        let cell = &mut self.buf[(x, y)];
        cell.set_char(ch).set_fg(fg);
        if let Some(bg) = bg {
            cell.set_bg(bg);
        }
    }

    fn text(&mut self, c: i32, r: i32, text: &str, fg: Color, bg: Option<Color>) {
        for (i, ch) in text.chars().enumerate() {
            self.cell(c + i as i32, r, ch, fg, bg);
        }
    }
}

fn header(title: &str, view: &TimelineView, layout: &Layout) -> String {
    let px_per_day = view.viewport().scale.px_per(DAY_MS);
    let status = match view.load_state() {
        LoadState::Failed { message, .. } => format!(" | load failed: {message}"),
        _ if !layout.warnings.is_empty() => format!(" | {} warnings", layout.warnings.len()),
        _ => String::new(),
    };
    format!(
        " {title} | {px_per_day:.2} px/day{status} | ←→ pan  +/- zoom  0 reset  n now  q quit "
    )
}

/// Run the interactive viewer until the user quits.
pub fn run(view: &mut TimelineView, title: &str) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, view, title);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    view: &mut TimelineView,
    title: &str,
) -> Result<()> {
    let mut scroll_rows: u16 = 0;

    loop {
        let term_size = terminal.size()?;
        view.handle(InputEvent::Resize {
            width: f64::from(term_size.width) * COL_PX,
        });

        let now = now_ms();
        let layout = view.layout(now);
        let commands = render_layout(&layout, view.viewport());
        let content_rows = ((AXIS_HEIGHT + layout.content_height) / ROW_PX).ceil() as u16;
        scroll_rows = scroll_rows.min(content_rows);

        terminal.draw(|frame| {
            let area = frame.area();

            let header_area = Rect::new(0, 0, area.width, 1);
            let bar = Block::default()
                .title(header(title, view, &layout))
                .style(Style::default().fg(Color::White).bg(Color::DarkGray));
            frame.render_widget(bar, header_area);

            let content_area = Rect::new(0, 1, area.width, area.height.saturating_sub(1));
            let background = Block::default()
                .borders(Borders::NONE)
                .style(Style::default().bg(Color::Black));
            frame.render_widget(background, content_area);

            paint(frame.buffer_mut(), content_area, &commands, scroll_rows);
        })?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Left => {
                    view.handle(InputEvent::PanScreens {
                        screens: -PAN_SCREENS,
                    });
                }
                KeyCode::Right => {
                    view.handle(InputEvent::PanScreens {
                        screens: PAN_SCREENS,
                    });
                }
                KeyCode::Up => scroll_rows = scroll_rows.saturating_sub(ROW_SCROLL),
                KeyCode::Down => scroll_rows = scroll_rows.saturating_add(ROW_SCROLL),
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    view.handle(InputEvent::ZoomIn);
                }
                KeyCode::Char('-') => {
                    view.handle(InputEvent::ZoomOut);
                }
                KeyCode::Char('0') => {
                    view.handle(InputEvent::ResetZoom);
                }
                KeyCode::Char('n') => {
                    view.handle(InputEvent::JumpTo { instant: now_ms() });
                }
                _ => {}
            },
            Event::Mouse(mouse) => {
                let zoom = mouse.modifiers.contains(KeyModifiers::CONTROL);
                let pointer_x = Some(f64::from(mouse.column) * COL_PX);
                match mouse.kind {
                    MouseEventKind::ScrollUp if zoom => {
                        view.handle(InputEvent::Wheel {
                            delta_y: -WHEEL_DELTA,
                            with_modifier: true,
                            pointer_x,
                        });
                    }
                    MouseEventKind::ScrollDown if zoom => {
                        view.handle(InputEvent::Wheel {
                            delta_y: WHEEL_DELTA,
                            with_modifier: true,
                            pointer_x,
                        });
                    }
                    MouseEventKind::ScrollUp => {
                        scroll_rows = scroll_rows.saturating_sub(ROW_SCROLL);
                    }
                    MouseEventKind::ScrollDown => {
                        scroll_rows = scroll_rows.saturating_add(ROW_SCROLL);
                    }
                    MouseEventKind::ScrollLeft => {
                        view.handle(InputEvent::PanBy {
                            delta: -4.0 * COL_PX,
                        });
                    }
                    MouseEventKind::ScrollRight => {
                        view.handle(InputEvent::PanBy {
                            delta: 4.0 * COL_PX,
                        });
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    Ok(())
}
