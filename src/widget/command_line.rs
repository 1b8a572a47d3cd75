//! Command Line Widget: the prompt and the single-line command editor.
//!
//! Editing works on extended grapheme clusters so a cursor step or a
//! backspace never splits an accented letter or an emoji sequence.

use super::traits::Widget;
use crate::actor::{InputEvent, KeyCode};
use crate::layout::Rect;
use crate::screen::{text_width, Cell, Color, Grid, Modifiers, Style};
use unicode_segmentation::UnicodeSegmentation;

/// White on blue, the command line's colors.
const LINE_STYLE: Style = Style::new(Color::BRIGHT_WHITE, Color::BLUE);

/// A single-line editor preceded by a prompt.
#[derive(Debug)]
pub struct CommandLine {
    /// Current command text.
    content: String,
    /// Cursor as a byte offset, always on a grapheme boundary.
    cursor: usize,
    bounds: Rect,
    prompt: String,
}

impl CommandLine {
    /// Create an empty command line.
    pub fn new(bounds: Rect, prompt: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            bounds,
            prompt: prompt.into(),
        }
    }

    /// The current command text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the content, moving the cursor to the end.
    pub fn set_content(&mut self, content: &str) {
        content.clone_into(&mut self.content);
        self.cursor = self.content.len();
    }

    /// Cursor byte offset into [`CommandLine::content`].
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Screen position of the terminal cursor, if it fits in the bounds.
    pub fn cursor_position(&self) -> Option<(u16, u16)> {
        let (text_x, offset) = self.window()?;
        let column = text_x as usize + text_width(&self.content[offset..self.cursor]);
        let column = u16::try_from(column).ok()?;
        (column < self.bounds.right()).then_some((column, self.bounds.y))
    }

    /// Insert text at the cursor. Control characters are dropped.
    pub fn insert_str(&mut self, text: &str) {
        let filtered: String = text.chars().filter(|c| !c.is_control()).collect();
        if filtered.is_empty() {
            return;
        }
        self.content.insert_str(self.cursor, &filtered);
        self.cursor += filtered.len();
        // A combining mark may have merged with the grapheme before it
        self.cursor = self.snap_to_boundary(self.cursor);
    }

    fn insert_char(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.insert_str(c.encode_utf8(&mut utf8));
    }

    fn previous_boundary(&self) -> usize {
        self.content[..self.cursor]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(i, _)| i)
    }

    fn next_boundary(&self) -> usize {
        self.content[self.cursor..]
            .graphemes(true)
            .next()
            .map_or(self.cursor, |g| self.cursor + g.len())
    }

    fn snap_to_boundary(&self, offset: usize) -> usize {
        self.content
            .grapheme_indices(true)
            .map(|(i, g)| i + g.len())
            .find(|&end| end >= offset)
            .unwrap_or(0)
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.previous_boundary();
            self.content.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    fn delete(&mut self) {
        let next = self.next_boundary();
        self.content.replace_range(self.cursor..next, "");
    }

    fn cursor_left(&mut self) {
        self.cursor = self.previous_boundary();
    }

    fn cursor_right(&mut self) {
        self.cursor = self.next_boundary();
    }

    fn kill_to_start(&mut self) {
        self.content.replace_range(..self.cursor, "");
        self.cursor = 0;
    }

    fn kill_to_end(&mut self) {
        self.content.truncate(self.cursor);
    }

    /// Where the text starts on screen and the first visible byte offset.
    ///
    /// The text scrolls horizontally so the cursor cell stays visible.
    fn window(&self) -> Option<(u16, usize)> {
        if self.bounds.is_empty() {
            return None;
        }
        let prompt_width = u16::try_from(text_width(&self.prompt)).unwrap_or(u16::MAX);
        let text_x = self.bounds.x.saturating_add(prompt_width).min(self.bounds.right());
        let available = usize::from(self.bounds.right() - text_x);
        if available == 0 {
            return None;
        }

        let mut offset = 0;
        let mut before_cursor = text_width(&self.content[..self.cursor]);
        for grapheme in self.content[..self.cursor].graphemes(true) {
            if before_cursor < available {
                break;
            }
            before_cursor -= text_width(grapheme);
            offset += grapheme.len();
        }
        Some((text_x, offset))
    }
}

impl Widget for CommandLine {
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
        grid.fill_rect(x, y, width, 1, Cell::EMPTY.with_style(LINE_STYLE));

        let right = self.bounds.right();
        grid.put_str(
            x,
            y,
            &self.prompt,
            right,
            LINE_STYLE.with_modifiers(Modifiers::BOLD),
        );
        if let Some((text_x, offset)) = self.window() {
            grid.put_str(text_x, y, &self.content[offset..], right, LINE_STYLE);
        }
    }

    fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Key { code, modifiers } if modifiers.control => match code {
                KeyCode::Char('a') => self.cursor = 0,
                KeyCode::Char('e') => self.cursor = self.content.len(),
                KeyCode::Char('u') => self.kill_to_start(),
                KeyCode::Char('k') => self.kill_to_end(),
                _ => return false,
            },
            InputEvent::Key { code, modifiers } => match code {
                KeyCode::Char(c) if !modifiers.alt => self.insert_char(*c),
                KeyCode::Backspace => self.backspace(),
                KeyCode::Delete => self.delete(),
                KeyCode::Left => self.cursor_left(),
                KeyCode::Right => self.cursor_right(),
                KeyCode::Home => self.cursor = 0,
                KeyCode::End => self.cursor = self.content.len(),
                _ => return false,
            },
            InputEvent::Paste(text) => self.insert_str(text),
            _ => return false,
        }
        true
    }
}
