//! Diffing Engine: Generate minimal ANSI sequences from grid changes.
//!
//! 1. Compare the displayed grid with the next one
//! 2. Emit sequences only for cells that changed
//! 3. Skip cursor moves when writes are adjacent
//! 4. Track SGR state to avoid redundant color sequences
//!
//! Output accumulates in a `Vec<u8>` and is flushed by the caller in one write.

use super::{Cell, Color, Grid, Modifiers};
use std::io::Write;

/// What the terminal currently has for cursor position and attributes.
#[derive(Debug, Clone)]
pub struct DiffState {
    cursor_x: u16,
    cursor_y: u16,
    fg: Option<Color>,
    bg: Option<Color>,
    modifiers: Option<Modifiers>,
}

impl Default for DiffState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffState {
    /// Create a diff state assuming the cursor is at home.
    pub const fn new() -> Self {
        Self {
            cursor_x: 0,
            cursor_y: 0,
            fg: None,
            bg: None,
            modifiers: None,
        }
    }

    /// Record that the cursor was moved outside the diff.
    pub const fn set_cursor(&mut self, x: u16, y: u16) {
        self.cursor_x = x;
        self.cursor_y = y;
    }

    /// Forget everything (e.g., after the cursor was moved elsewhere).
    pub const fn reset(&mut self) {
        self.fg = None;
        self.bg = None;
        self.modifiers = None;
        self.cursor_x = u16::MAX;
        self.cursor_y = u16::MAX;
    }
}

/// Result of a diff operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Number of cells that were different.
    pub cells_changed: usize,
    /// Number of cursor move sequences emitted.
    pub cursor_moves: usize,
    /// Number of color change sequences emitted.
    pub color_changes: usize,
}

/// Emit the sequences that turn `current` into `next` on screen.
pub fn render_diff(
    current: &Grid,
    next: &Grid,
    output: &mut Vec<u8>,
    state: &mut DiffState,
) -> DiffResult {
    debug_assert_eq!(current.width(), next.width());
    debug_assert_eq!(current.height(), next.height());

    let mut result = DiffResult::default();
    let width = next.width();

    for (idx, (current_cell, next_cell)) in current.cells().iter().zip(next.cells()).enumerate() {
        // Overflow indices are per-grid, so equal cells may hold different text
        if current_cell == next_cell && !next_cell.is_overflow() {
            continue;
        }
        // The wide grapheme to the left draws this column
        if next_cell.is_wide_continuation() {
            continue;
        }

        let x = (idx % width as usize) as u16;
        let y = (idx / width as usize) as u16;
        result.cells_changed += 1;

        if state.cursor_y != y || state.cursor_x != x {
            emit_cursor_move(output, x, y);
            state.cursor_x = x;
            state.cursor_y = y;
            result.cursor_moves += 1;
        }

        result.color_changes += write_cell(output, next_cell, next, state);
    }

    result
}

/// Redraw the whole grid, ignoring what is on screen.
///
/// Used for the first frame and after a resize.
pub fn render_full(grid: &Grid, output: &mut Vec<u8>, state: &mut DiffState) {
    // Hide cursor, reset attributes, clear, home
    output.extend_from_slice(b"\x1b[?25l\x1b[0m\x1b[2J\x1b[H");
    *state = DiffState::new();

    for y in 0..grid.height() {
        emit_cursor_move(output, 0, y);
        state.cursor_x = 0;
        state.cursor_y = y;
        for x in 0..grid.width() {
            if let Some(cell) = grid.get(x, y) {
                if !cell.is_wide_continuation() {
                    write_cell(output, cell, grid, state);
                }
            }
        }
    }
}

/// Emit SGR changes and the grapheme for one cell; returns color changes.
fn write_cell(output: &mut Vec<u8>, cell: &Cell, grid: &Grid, state: &mut DiffState) -> usize {
    let mut color_changes = 0;

    // Dropping any modifier needs a full reset, which also clears colors
    let next_mods = cell.modifiers();
    let removed = state.modifiers.unwrap_or_default().difference(next_mods);
    if !removed.is_empty() || state.modifiers.is_none() {
        output.extend_from_slice(b"\x1b[0m");
        state.fg = None;
        state.bg = None;
        state.modifiers = Some(Modifiers::empty());
    }

    if state.fg != Some(cell.fg()) {
        emit_color(output, cell.fg(), Layer::Foreground);
        state.fg = Some(cell.fg());
        color_changes += 1;
    }
    if state.bg != Some(cell.bg()) {
        emit_color(output, cell.bg(), Layer::Background);
        state.bg = Some(cell.bg());
        color_changes += 1;
    }

    let current_mods = state.modifiers.unwrap_or_default();
    if current_mods != next_mods {
        emit_modifier_set(output, next_mods.difference(current_mods));
        state.modifiers = Some(next_mods);
    }

    emit_grapheme(output, cell, grid);
    state.cursor_x = state
        .cursor_x
        .saturating_add(u16::from(cell.display_width().max(1)));
    color_changes
}

/// Emit a cursor move sequence.
///
/// Uses the most compact representation:
/// - `\x1b[H` for home (1,1)
/// - `\x1b[{row}H` for column 1
/// - `\x1b[{row};{col}H` otherwise
#[inline]
pub(crate) fn emit_cursor_move(output: &mut Vec<u8>, x: u16, y: u16) {
    let row = u32::from(y) + 1;
    let col = u32::from(x) + 1;

    if row == 1 && col == 1 {
        output.extend_from_slice(b"\x1b[H");
    } else if col == 1 {
        let _ = write!(output, "\x1b[{row}H");
    } else {
        let _ = write!(output, "\x1b[{row};{col}H");
    }
}

#[derive(Clone, Copy)]
enum Layer {
    Foreground,
    Background,
}

fn emit_color(output: &mut Vec<u8>, color: Color, layer: Layer) {
    let base = match layer {
        Layer::Foreground => 38,
        Layer::Background => 48,
    };
    let _ = match color {
        Color::Default => write!(output, "\x1b[{}m", base + 1),
        Color::Indexed(n) => write!(output, "\x1b[{base};5;{n}m"),
    };
}

/// Emit SGR sequences for a set of modifiers.
fn emit_modifier_set(output: &mut Vec<u8>, modifiers: Modifiers) {
    if modifiers.contains(Modifiers::BOLD) {
        output.extend_from_slice(b"\x1b[1m");
    }
    if modifiers.contains(Modifiers::DIM) {
        output.extend_from_slice(b"\x1b[2m");
    }
    if modifiers.contains(Modifiers::ITALIC) {
        output.extend_from_slice(b"\x1b[3m");
    }
    if modifiers.contains(Modifiers::UNDERLINE) {
        output.extend_from_slice(b"\x1b[4m");
    }
    if modifiers.contains(Modifiers::REVERSED) {
        output.extend_from_slice(b"\x1b[7m");
    }
}

#[inline]
fn emit_grapheme(output: &mut Vec<u8>, cell: &Cell, grid: &Grid) {
    if let Some(grapheme) = cell.grapheme() {
        output.extend_from_slice(grapheme.as_bytes());
        return;
    }
    match cell.overflow_index().and_then(|idx| grid.get_overflow(idx)) {
        Some(grapheme) => output.extend_from_slice(grapheme.as_bytes()),
        None => output.extend_from_slice(char::REPLACEMENT_CHARACTER.to_string().as_bytes()),
    }
}
