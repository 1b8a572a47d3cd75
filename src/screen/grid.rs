//! Grid: the full screen as a row-major array of cells.

use super::cell::{grapheme_width, Cell, Style};
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// A grid of cells representing the terminal screen.
///
/// Cells are stored contiguously; `index = y * width + x`. Graphemes that
/// do not fit a cell's inline storage live in `overflow`.
#[derive(Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Cell>,
    width: u16,
    height: u16,
    overflow: HashMap<u32, String>,
    next_overflow_index: u32,
}

impl Grid {
    /// Create a grid filled with empty cells.
    ///
    /// # Panics
    /// Panics if width or height is 0.
    pub fn new(width: u16, height: u16) -> Self {
        assert!(width > 0 && height > 0, "Grid dimensions must be non-zero");
        let size = (width as usize) * (height as usize);
        Self {
            cells: vec![Cell::EMPTY; size],
            width,
            height,
            overflow: HashMap::new(),
            next_overflow_index: 0,
        }
    }

    /// Grid width in columns.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Grid height in rows.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// The underlying cells in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Convert (x, y) coordinates to a linear index.
    #[inline]
    pub fn index_of(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some((y as usize) * (self.width as usize) + (x as usize))
        } else {
            None
        }
    }

    /// Get a reference to a cell at (x, y).
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        self.index_of(x, y).map(|i| &self.cells[i])
    }

    /// Set a cell at (x, y). Returns `false` if out of bounds.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, cell: Cell) -> bool {
        if let Some(idx) = self.index_of(x, y) {
            self.cells[idx] = cell;
            true
        } else {
            false
        }
    }

    /// Write one grapheme cluster at (x, y).
    ///
    /// A double-width grapheme also claims (x + 1, y) as a continuation
    /// cell; if that column is off the grid nothing is written. Returns the
    /// columns consumed, 0 when nothing was written.
    pub fn set_grapheme(&mut self, x: u16, y: u16, grapheme: &str, style: Style) -> u8 {
        let Some(idx) = self.index_of(x, y) else {
            return 0;
        };
        let width = grapheme_width(grapheme);
        if width == 2 && x + 1 >= self.width {
            return 0;
        }

        let cell = Cell::from_grapheme(grapheme).unwrap_or_else(|| {
            let index = self.next_overflow_index;
            self.next_overflow_index += 1;
            self.overflow.insert(index, grapheme.to_owned());
            Cell::overflow(index, width)
        });
        self.cells[idx] = cell.with_style(style);

        if width == 2 {
            self.cells[idx + 1] = Cell::wide_continuation().with_bg(style.bg);
        }
        width
    }

    /// Write a single character at (x, y); see [`Grid::set_grapheme`].
    pub fn set_char(&mut self, x: u16, y: u16, c: char, style: Style) -> u8 {
        let mut utf8 = [0u8; 4];
        self.set_grapheme(x, y, c.encode_utf8(&mut utf8), style)
    }

    /// Write `text` starting at (x, y), stopping before `max_x`.
    ///
    /// Returns the column after the last grapheme written.
    pub fn put_str(&mut self, x: u16, y: u16, text: &str, max_x: u16, style: Style) -> u16 {
        let max_x = max_x.min(self.width);
        let mut col = x;
        for grapheme in text.graphemes(true) {
            let width = u16::from(grapheme_width(grapheme));
            if col + width > max_x {
                break;
            }
            col += u16::from(self.set_grapheme(col, y, grapheme, style));
        }
        col
    }

    /// The grapheme at (x, y), resolving overflow cells.
    ///
    /// Returns `None` if out of bounds or on a continuation cell.
    pub fn get_grapheme(&self, x: u16, y: u16) -> Option<&str> {
        let cell = self.get(x, y)?;
        match cell.overflow_index() {
            Some(idx) => self.get_overflow(idx),
            None => cell.grapheme(),
        }
    }

    /// Look up an overflow grapheme by index.
    #[inline]
    pub fn get_overflow(&self, index: u32) -> Option<&str> {
        self.overflow.get(&index).map(String::as_str)
    }

    /// Fill a rectangular region with a cell.
    pub fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, cell: Cell) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        if x >= x_end {
            return;
        }
        for row in y..y_end {
            let start = (row as usize) * (self.width as usize);
            self.cells[start + x as usize..start + x_end as usize].fill(cell);
        }
    }

    /// Reset every cell to empty.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
        self.overflow.clear();
        self.next_overflow_index = 0;
    }

    /// Resize to new dimensions, clearing the content.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.height {
            self.clear();
            return;
        }
        *self = Self::new(width, height);
    }

    /// Copy content from a grid of the same dimensions.
    pub fn copy_from(&mut self, other: &Self) {
        debug_assert_eq!(self.width, other.width);
        debug_assert_eq!(self.height, other.height);
        self.cells.copy_from_slice(&other.cells);
        self.overflow.clone_from(&other.overflow);
        self.next_overflow_index = other.next_overflow_index;
    }

    /// The visible text of a row, continuation cells omitted.
    pub fn row_text(&self, y: u16) -> String {
        let mut text = String::new();
        for x in 0..self.width {
            if let Some(grapheme) = self.get_grapheme(x, y) {
                text.push_str(grapheme);
            }
        }
        text
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("overflow_count", &self.overflow.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Color;

    #[test]
    fn test_grid_new() {
        let grid = Grid::new(80, 24);
        assert_eq!(grid.width(), 80);
        assert_eq!(grid.height(), 24);
        assert_eq!(grid.cells().len(), 80 * 24);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_grid_zero_width() {
        Grid::new(0, 24);
    }

    #[test]
    fn test_grid_bounds() {
        let mut grid = Grid::new(80, 24);
        assert!(grid.get(79, 23).is_some());
        assert!(grid.get(80, 23).is_none());
        assert!(!grid.set(0, 24, Cell::from_char('x')));
    }

    #[test]
    fn test_wide_grapheme_claims_two_columns() {
        let mut grid = Grid::new(4, 1);
        assert_eq!(grid.set_grapheme(0, 0, "日", Style::PLAIN), 2);
        assert_eq!(grid.get_grapheme(0, 0), Some("日"));
        assert!(grid.get(1, 0).unwrap().is_wide_continuation());

        // No room for the right half in the last column
        assert_eq!(grid.set_grapheme(3, 0, "日", Style::PLAIN), 0);
        assert_eq!(grid.get_grapheme(3, 0), Some(" "));
    }

    #[test]
    fn test_overflow_grapheme() {
        let mut grid = Grid::new(10, 1);
        let family = "👨‍👩‍👧‍👦";
        assert!(grid.set_grapheme(0, 0, family, Style::PLAIN) > 0);
        assert!(grid.get(0, 0).unwrap().is_overflow());
        assert_eq!(grid.get_grapheme(0, 0), Some(family));
    }

    #[test]
    fn test_put_str_stops_at_limit() {
        let mut grid = Grid::new(10, 2);
        let end = grid.put_str(2, 0, "hello world", 8, Style::PLAIN);
        assert_eq!(end, 8);
        assert_eq!(grid.row_text(0), "  hello   ");

        let end = grid.put_str(0, 1, "a日b", 2, Style::PLAIN);
        assert_eq!(end, 1);
    }

    #[test]
    fn test_fill_and_clear() {
        let mut grid = Grid::new(5, 3);
        let blue = Cell::EMPTY.with_bg(Color::BLUE);
        grid.fill_rect(1, 1, 10, 1, blue);
        assert_eq!(grid.get(0, 1), Some(&Cell::EMPTY));
        assert_eq!(grid.get(4, 1), Some(&blue));
        assert_eq!(grid.get(1, 2), Some(&Cell::EMPTY));

        grid.clear();
        assert_eq!(grid.get(4, 1), Some(&Cell::EMPTY));
    }

    #[test]
    fn test_resize_and_copy() {
        let mut a = Grid::new(4, 2);
        a.put_str(0, 0, "ab", 4, Style::PLAIN);
        let mut b = Grid::new(4, 2);
        b.copy_from(&a);
        assert_eq!(a, b);

        b.resize(6, 3);
        assert_eq!(b.width(), 6);
        assert_eq!(b.row_text(0), "      ");
    }
}
