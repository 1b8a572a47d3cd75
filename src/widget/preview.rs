//! Preview Widget: draws a capture snapshot below the command line.
//!
//! Newlines start a new row and tabs advance to the next multiple of
//! [`TAB_WIDTH`]. Lines are clipped at the right edge, never wrapped. Other
//! control characters are drawn as U+FFFD so the raw bytes cannot move the
//! terminal's cursor.

use super::traits::Widget;
use crate::actor::{InputEvent, KeyCode};
use crate::capture::Snapshot;
use crate::layout::Rect;
use crate::screen::{Grid, Style};
use std::iter::Peekable;
use unicode_width::UnicodeWidthChar;

/// Tab stops every 8 columns.
pub const TAB_WIDTH: usize = 8;

/// Scrollable view of the active buffer.
#[derive(Debug)]
pub struct Preview {
    bounds: Rect,
    snapshot: Snapshot,
    /// Index of the first line shown.
    scroll: usize,
}

impl Preview {
    /// Create an empty preview.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            snapshot: Snapshot::default(),
            scroll: 0,
        }
    }

    /// Show a new snapshot; the scroll position is kept.
    pub fn set_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
    }

    /// The snapshot being shown.
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Index of the first visible line.
    pub const fn scroll(&self) -> usize {
        self.scroll
    }

    /// Jump back to the first line.
    pub const fn reset_scroll(&mut self) {
        self.scroll = 0;
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    fn scroll_down(&mut self, lines: usize) {
        let height = usize::from(self.bounds.height);
        let max = self.snapshot.line_count().saturating_sub(height);
        self.scroll = self.scroll.saturating_add(lines).min(max.max(self.scroll));
    }

    fn page(&self) -> usize {
        usize::from(self.bounds.height.max(1))
    }
}

impl Widget for Preview {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    fn render(&self, grid: &mut Grid) {
        if self.bounds.is_empty() {
            return;
        }
        let mut chars = self.snapshot.chars().peekable();
        if !skip_lines(&mut chars, self.scroll) {
            return;
        }

        let width = usize::from(self.bounds.width);
        let mut row = 0u16;
        let mut col = 0usize;
        while let Some(c) = chars.next() {
            match c {
                '\n' => {
                    row += 1;
                    col = 0;
                    if row >= self.bounds.height {
                        break;
                    }
                }
                '\r' if chars.peek() == Some(&'\n') => {}
                '\t' => col = (col / TAB_WIDTH + 1) * TAB_WIDTH,
                _ => {
                    let c = if c.is_control() {
                        char::REPLACEMENT_CHARACTER
                    } else {
                        c
                    };
                    let cells = c.width().unwrap_or(1).clamp(1, 2);
                    if col + cells <= width {
                        // col < width fits in u16
                        let x = self.bounds.x + col as u16;
                        grid.set_char(x, self.bounds.y + row, c, Style::PLAIN);
                    }
                    col += cells;
                }
            }
        }
    }

    fn handle_input(&mut self, event: &InputEvent) -> bool {
        let InputEvent::Key { code, modifiers } = event else {
            return false;
        };
        if modifiers.any() {
            return false;
        }
        match code {
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(self.page()),
            KeyCode::PageDown => self.scroll_down(self.page()),
            _ => return false,
        }
        true
    }
}

/// Consume `lines` newline-terminated lines; `false` if the text ran out.
fn skip_lines<I: Iterator<Item = char>>(chars: &mut Peekable<I>, lines: usize) -> bool {
    let mut skipped = 0;
    while skipped < lines {
        match chars.next() {
            Some('\n') => skipped += 1,
            Some(_) => {}
            None => return false,
        }
    }
    true
}
