//! Cell: one column of one screen row.
//!
//! # Memory Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Cell Layout (12 bytes)                                      │
//! ├─────────────┬─────────────┬─────────┬─────────┬──────┬───────┤
//! │  grapheme   │ len + width │   fg    │   bg    │ mods │ flags │
//! │  [u8; 4]    │  u8 + u8    │  Color  │  Color  │  u8  │  u8   │
//! └─────────────┴─────────────┴─────────┴─────────┴──────┴───────┘
//! ```
//!
//! Graphemes longer than four bytes spill into the owning [`Grid`]'s
//! overflow table; the cell then holds the table index.
//!
//! [`Grid`]: super::Grid

use bitflags::bitflags;
use unicode_segmentation::UnicodeSegmentation;

/// A terminal color.
///
/// `Default` leaves the choice to the user's terminal theme, which is what
/// the preview pane uses so piped text looks the way it would in a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Color {
    /// The terminal's own foreground or background.
    #[default]
    Default,
    /// One of the 256 palette entries.
    Indexed(u8),
}

impl Color {
    /// Palette blue.
    pub const BLUE: Self = Self::Indexed(4);
    /// Palette bright white.
    pub const BRIGHT_WHITE: Self = Self::Indexed(15);
}

bitflags! {
    /// Text style modifiers.
    ///
    /// ```
    /// use upview::screen::Modifiers;
    /// let style = Modifiers::BOLD | Modifiers::REVERSED;
    /// assert!(style.contains(Modifiers::BOLD));
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        /// Bold text
        const BOLD = 0b0000_0001;
        /// Dim/faint text
        const DIM = 0b0000_0010;
        /// Italic text
        const ITALIC = 0b0000_0100;
        /// Underlined text
        const UNDERLINE = 0b0000_1000;
        /// Reversed colors (fg/bg swapped)
        const REVERSED = 0b0010_0000;
    }
}

impl std::fmt::Debug for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

bitflags! {
    /// Cell-level flags for special states.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CellFlags: u8 {
        /// Grapheme lives in the grid's overflow table
        const OVERFLOW = 0b0000_0001;
        /// Right half of a double-width grapheme
        const WIDE_CONTINUATION = 0b0000_0100;
    }
}

impl std::fmt::Debug for CellFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Colors and modifiers applied to a run of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Style {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Text modifiers.
    pub modifiers: Modifiers,
}

impl Style {
    /// Terminal defaults, no modifiers.
    pub const PLAIN: Self = Self {
        fg: Color::Default,
        bg: Color::Default,
        modifiers: Modifiers::empty(),
    };

    /// A style with the given colors.
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self {
            fg,
            bg,
            modifiers: Modifiers::empty(),
        }
    }

    /// Set the modifiers (builder pattern).
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// A single terminal cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Inline grapheme storage (UTF-8), or an overflow index.
    grapheme: [u8; 4],
    /// Byte length of the inline grapheme, 0 when overflowed.
    grapheme_len: u8,
    /// Columns occupied: 0 for continuations, 1 or 2 otherwise.
    display_width: u8,
    fg: Color,
    bg: Color,
    modifiers: Modifiers,
    flags: CellFlags,
}

const _: () = assert!(
    std::mem::size_of::<Cell>() == 12,
    "Cell must stay at 12 bytes"
);

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Cell {
    /// A space in the terminal's default colors.
    pub const EMPTY: Self = Self {
        grapheme: [b' ', 0, 0, 0],
        grapheme_len: 1,
        display_width: 1,
        fg: Color::Default,
        bg: Color::Default,
        modifiers: Modifiers::empty(),
        flags: CellFlags::empty(),
    };

    /// Create a cell from any character.
    ///
    /// Zero-width characters still occupy one column so the grid never
    /// holds a cell the terminal would not advance over.
    #[inline]
    pub fn from_char(c: char) -> Self {
        let mut grapheme = [0u8; 4];
        let len = c.encode_utf8(&mut grapheme).len();
        let width = unicode_width::UnicodeWidthChar::width(c).unwrap_or(1).clamp(1, 2);

        Self {
            grapheme,
            grapheme_len: len as u8,
            display_width: width as u8,
            ..Self::EMPTY
        }
    }

    /// Create a cell from a grapheme cluster.
    ///
    /// Returns `None` when the cluster needs more than four bytes; the grid
    /// stores those in its overflow table.
    #[inline]
    pub fn from_grapheme(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 {
            return None;
        }

        let mut grapheme = [0u8; 4];
        grapheme[..bytes.len()].copy_from_slice(bytes);
        let width = grapheme_width(s);

        Some(Self {
            grapheme,
            grapheme_len: bytes.len() as u8,
            display_width: width,
            ..Self::EMPTY
        })
    }

    /// Create an overflow cell pointing at an index in the grid's table.
    #[inline]
    pub const fn overflow(index: u32, display_width: u8) -> Self {
        Self {
            grapheme: index.to_le_bytes(),
            grapheme_len: 0,
            display_width,
            fg: Color::Default,
            bg: Color::Default,
            modifiers: Modifiers::empty(),
            flags: CellFlags::OVERFLOW,
        }
    }

    /// The right half of a double-width grapheme.
    #[inline]
    pub const fn wide_continuation() -> Self {
        Self {
            grapheme: [0, 0, 0, 0],
            grapheme_len: 0,
            display_width: 0,
            fg: Color::Default,
            bg: Color::Default,
            modifiers: Modifiers::empty(),
            flags: CellFlags::WIDE_CONTINUATION,
        }
    }

    /// The inline grapheme, or `None` for overflow and continuation cells.
    #[inline]
    pub fn grapheme(&self) -> Option<&str> {
        if self.flags.intersects(CellFlags::OVERFLOW | CellFlags::WIDE_CONTINUATION) {
            return None;
        }
        std::str::from_utf8(&self.grapheme[..self.grapheme_len as usize]).ok()
    }

    /// The overflow index if this is an overflow cell.
    #[inline]
    pub const fn overflow_index(&self) -> Option<u32> {
        if self.flags.contains(CellFlags::OVERFLOW) {
            Some(u32::from_le_bytes(self.grapheme))
        } else {
            None
        }
    }

    /// Check if this cell uses overflow storage.
    #[inline]
    pub const fn is_overflow(&self) -> bool {
        self.flags.contains(CellFlags::OVERFLOW)
    }

    /// Check if this is a wide-character continuation.
    #[inline]
    pub const fn is_wide_continuation(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_CONTINUATION)
    }

    /// Get the display width (0, 1, or 2).
    #[inline]
    pub const fn display_width(&self) -> u8 {
        self.display_width
    }

    /// Get the foreground color.
    #[inline]
    pub const fn fg(&self) -> Color {
        self.fg
    }

    /// Get the background color.
    #[inline]
    pub const fn bg(&self) -> Color {
        self.bg
    }

    /// Get the modifiers.
    #[inline]
    pub const fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Colors and modifiers as one value.
    #[inline]
    pub const fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bg: self.bg,
            modifiers: self.modifiers,
        }
    }

    /// Apply a style (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.fg = style.fg;
        self.bg = style.bg;
        self.modifiers = style.modifiers;
        self
    }

    /// Set the foreground color (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_fg(mut self, fg: Color) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background color (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let grapheme = self.grapheme().unwrap_or("<overflow>");
        f.debug_struct("Cell")
            .field("grapheme", &grapheme)
            .field("width", &self.display_width)
            .field("fg", &self.fg)
            .field("bg", &self.bg)
            .field("modifiers", &self.modifiers)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Columns a grapheme cluster occupies, clamped to 1..=2.
pub(crate) fn grapheme_width(s: &str) -> u8 {
    unicode_width::UnicodeWidthStr::width(s).clamp(1, 2) as u8
}

/// Columns `text` occupies when drawn with [`Grid::put_str`].
///
/// [`Grid::put_str`]: super::Grid::put_str
pub fn text_width(text: &str) -> usize {
    text.graphemes(true).map(|g| usize::from(grapheme_width(g))).sum()
}
