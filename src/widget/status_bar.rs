//! Status Bar Widget: Three-section status bar.
//!
//! The left section describes the input buffer, the center the active
//! buffer, the right one the current task.

use super::traits::Widget;
use crate::actor::InputEvent;
use crate::capture::CaptureState;
use crate::layout::Rect;
use crate::process::TaskStatus;
use crate::screen::{text_width, Cell, Color, Grid, Style};

const BACKGROUND: Color = Color::Indexed(236);
/// Background and left section.
const BASE: Style = Style::new(Color::BRIGHT_WHITE, BACKGROUND);
const CENTER: Style = Style::new(Color::Indexed(250), BACKGROUND);
const RIGHT: Style = Style::new(Color::Indexed(114), BACKGROUND);

/// A three-section status bar (left, center, right).
#[derive(Debug)]
pub struct StatusBar {
    left: String,
    center: String,
    right: String,
    bounds: Rect,
}

impl StatusBar {
    /// Create an empty status bar.
    pub const fn new(bounds: Rect) -> Self {
        Self {
            left: String::new(),
            center: String::new(),
            right: String::new(),
            bounds,
        }
    }

    /// Set all sections at once.
    pub fn set_all(
        &mut self,
        left: impl Into<String>,
        center: impl Into<String>,
        right: impl Into<String>,
    ) {
        self.left = left.into();
        self.center = center.into();
        self.right = right.into();
    }

    /// Fill the sections from the buffers and task on screen.
    ///
    /// `task` is `None` while the raw input is shown.
    pub fn describe(
        &mut self,
        input_len: usize,
        input_state: CaptureState,
        shown_len: usize,
        task: Option<TaskStatus>,
    ) {
        let left = format!("input {} {}", format_size(input_len), state_label(input_state));
        let (center, right) = match task {
            None => (String::new(), String::from("no command")),
            Some(status) => (
                format!("output {}", format_size(shown_len)),
                task_label(status),
            ),
        };
        self.set_all(left, center, right);
    }

    /// Get the left section content.
    pub fn left(&self) -> &str {
        &self.left
    }

    /// Get the center section content.
    pub fn center(&self) -> &str {
        &self.center
    }

    /// Get the right section content.
    pub fn right(&self) -> &str {
        &self.right
    }
}

const fn state_label(state: CaptureState) -> &'static str {
    match state {
        CaptureState::Collecting => "(reading)",
        CaptureState::Complete => "(complete)",
        CaptureState::Full => "(full, truncated)",
    }
}

fn task_label(status: TaskStatus) -> String {
    match status {
        TaskStatus::Running => String::from("running"),
        TaskStatus::Exited(Some(code)) => format!("exit {code}"),
        TaskStatus::Exited(None) => String::from("killed by signal"),
        TaskStatus::Canceled => String::from("canceled"),
        TaskStatus::FailedToStart => String::from("failed to start"),
    }
}

/// Human-readable byte count (`512 B`, `1.5 KiB`, `40.0 MiB`).
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

impl Widget for StatusBar {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    fn render(&self, grid: &mut Grid) {
        let Rect { x, y, width, .. } = self.bounds;
        if self.bounds.is_empty() {
            return;
        }
        grid.fill_rect(x, y, width, 1, Cell::EMPTY.with_style(BASE));

        let right_edge = self.bounds.right();
        let left_end = grid.put_str(x, y, &self.left, right_edge, BASE);

        // Right and center are dropped rather than drawn over the left section
        let right_width = u16::try_from(text_width(&self.right)).unwrap_or(u16::MAX);
        let right_x = right_edge.saturating_sub(right_width);
        let limit = if right_x > left_end {
            grid.put_str(right_x, y, &self.right, right_edge, RIGHT);
            right_x
        } else {
            right_edge
        };

        let center_width = u16::try_from(text_width(&self.center)).unwrap_or(u16::MAX);
        let center_x = x + width.saturating_sub(center_width) / 2;
        if center_x > left_end && center_x.saturating_add(center_width) <= limit {
            grid.put_str(center_x, y, &self.center, limit, CENTER);
        }
    }

    fn handle_input(&mut self, _event: &InputEvent) -> bool {
        false
    }
}
