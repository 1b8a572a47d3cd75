//! Renderer: owns the double buffers and writes frames to the terminal.
//!
//! Runs on the main loop's thread. Each frame the widgets draw into
//! [`Renderer::frame`], then [`Renderer::flush`] diffs it against what is on
//! screen and emits the difference in a single write.

use crate::screen::diff::{emit_cursor_move, render_diff, render_full, DiffResult, DiffState};
use crate::screen::Grid;
use std::io::{self, Write};

/// Double-buffered terminal writer.
#[derive(Debug)]
pub struct Renderer<W: Write> {
    /// What the terminal currently shows.
    current: Grid,
    /// The frame being drawn.
    next: Grid,
    diff_state: DiffState,
    output: Vec<u8>,
    writer: W,
    needs_full_redraw: bool,
    cursor: Option<(u16, u16)>,
}

impl<W: Write> Renderer<W> {
    /// Create a renderer for a terminal of the given size.
    ///
    /// Zero dimensions are raised to 1 so a collapsed window still has a grid.
    pub fn new(writer: W, width: u16, height: u16) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            current: Grid::new(width, height),
            next: Grid::new(width, height),
            diff_state: DiffState::new(),
            output: Vec::with_capacity(65536),
            writer,
            needs_full_redraw: true,
            cursor: None,
        }
    }

    /// Terminal size as (columns, rows).
    pub const fn size(&self) -> (u16, u16) {
        (self.next.width(), self.next.height())
    }

    /// Start a new frame: clears and returns the grid to draw into.
    pub fn frame(&mut self) -> &mut Grid {
        self.next.clear();
        self.cursor = None;
        &mut self.next
    }

    /// Where to show the cursor after the frame, or `None` to hide it.
    pub const fn set_cursor(&mut self, cursor: Option<(u16, u16)>) {
        self.cursor = cursor;
    }

    /// Adopt a new terminal size; the next flush redraws everything.
    pub fn resize(&mut self, width: u16, height: u16) {
        let (width, height) = (width.max(1), height.max(1));
        self.current.resize(width, height);
        self.next.resize(width, height);
        self.needs_full_redraw = true;
    }

    /// Write the frame to the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn flush(&mut self) -> io::Result<DiffResult> {
        self.output.clear();

        let result = if self.needs_full_redraw {
            render_full(&self.next, &mut self.output, &mut self.diff_state);
            self.needs_full_redraw = false;
            DiffResult::default()
        } else {
            self.output.extend_from_slice(b"\x1b[?25l");
            render_diff(
                &self.current,
                &self.next,
                &mut self.output,
                &mut self.diff_state,
            )
        };

        if let Some((x, y)) = self.cursor {
            emit_cursor_move(&mut self.output, x, y);
            self.output.extend_from_slice(b"\x1b[?25h");
            self.diff_state.set_cursor(x, y);
        }

        self.writer.write_all(&self.output)?;
        self.writer.flush()?;

        self.current.copy_from(&self.next);
        Ok(result)
    }

    /// The underlying writer.
    pub const fn writer(&self) -> &W {
        &self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Style;

    fn screen(renderer: &Renderer<Vec<u8>>) -> vt100::Parser {
        let (width, height) = renderer.size();
        let mut parser = vt100::Parser::new(height, width, 0);
        parser.process(renderer.writer());
        parser
    }

    fn rows(parser: &vt100::Parser) -> Vec<String> {
        let (_, width) = parser.screen().size();
        parser
            .screen()
            .rows(0, width)
            .map(|row| row.trim_end().to_owned())
            .collect()
    }

    #[test]
    fn test_first_flush_is_full() {
        let mut renderer = Renderer::new(Vec::new(), 10, 3);
        renderer.frame().put_str(0, 1, "hello", 10, Style::PLAIN);
        renderer.flush().unwrap();

        let parser = screen(&renderer);
        assert_eq!(rows(&parser), ["", "hello", ""]);
    }

    #[test]
    fn test_unchanged_frame_writes_only_cursor_state() {
        let mut renderer = Renderer::new(Vec::new(), 10, 3);
        renderer.frame().put_str(0, 0, "same", 10, Style::PLAIN);
        renderer.flush().unwrap();
        let before = renderer.writer().len();

        renderer.frame().put_str(0, 0, "same", 10, Style::PLAIN);
        let result = renderer.flush().unwrap();
        assert_eq!(result.cells_changed, 0);
        assert_eq!(&renderer.writer()[before..], b"\x1b[?25l");
    }

    #[test]
    fn test_incremental_frames() {
        let mut renderer = Renderer::new(Vec::new(), 10, 3);
        renderer.frame().put_str(0, 0, "one", 10, Style::PLAIN);
        renderer.flush().unwrap();

        renderer.frame().put_str(0, 2, "two", 10, Style::PLAIN);
        let result = renderer.flush().unwrap();
        assert_eq!(result.cells_changed, 6);

        let parser = screen(&renderer);
        assert_eq!(rows(&parser), ["", "", "two"]);
    }

    #[test]
    fn test_cursor_position() {
        let mut renderer = Renderer::new(Vec::new(), 10, 3);
        renderer.frame().put_str(0, 0, "| sort", 10, Style::PLAIN);
        renderer.set_cursor(Some((6, 0)));
        renderer.flush().unwrap();

        let parser = screen(&renderer);
        assert_eq!(parser.screen().cursor_position(), (0, 6));
        assert!(!parser.screen().hide_cursor());

        // Drawing after a cursor move still lands in the right place
        renderer.frame().put_str(0, 0, "| sort -r", 10, Style::PLAIN);
        renderer.set_cursor(Some((9, 0)));
        renderer.flush().unwrap();
        let parser = screen(&renderer);
        assert_eq!(rows(&parser)[0], "| sort -r");
    }

    #[test]
    fn test_resize_redraws() {
        let mut renderer = Renderer::new(Vec::new(), 10, 3);
        renderer.frame().put_str(0, 0, "abc", 10, Style::PLAIN);
        renderer.flush().unwrap();

        renderer.resize(5, 2);
        assert_eq!(renderer.size(), (5, 2));
        renderer.frame().put_str(0, 1, "xyz", 5, Style::PLAIN);
        renderer.flush().unwrap();

        let mut parser = vt100::Parser::new(2, 5, 0);
        parser.process(renderer.writer());
        assert_eq!(rows(&parser), ["", "xyz"]);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let renderer = Renderer::new(Vec::new(), 0, 0);
        assert_eq!(renderer.size(), (1, 1));
    }
}
