//! Rect: a screen region in cell coordinates.

/// A rectangle defined by its top-left corner and size.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Column of the top-left corner.
    pub x: u16,
    /// Row of the top-left corner.
    pub y: u16,
    /// Width in columns.
    pub width: u16,
    /// Height in rows.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// The whole terminal.
    #[inline]
    pub const fn from_size(width: u16, height: u16) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Whether there is no cell to draw in.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// First column past the right edge.
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Split off the top `rows` rows; the second half is what remains below.
    pub fn split_top(&self, rows: u16) -> (Self, Self) {
        let rows = rows.min(self.height);
        (
            Self::new(self.x, self.y, self.width, rows),
            Self::new(self.x, self.y + rows, self.width, self.height - rows),
        )
    }

    /// Split off the bottom `rows` rows; the first half is what remains above.
    pub fn split_bottom(&self, rows: u16) -> (Self, Self) {
        self.split_top(self.height - rows.min(self.height))
    }
}

impl std::fmt::Debug for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rect({}, {} {}x{})", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_top_clamps() {
        let rect = Rect::from_size(80, 3);
        let (top, rest) = rect.split_top(1);
        assert_eq!(top, Rect::new(0, 0, 80, 1));
        assert_eq!(rest, Rect::new(0, 1, 80, 2));

        let (all, none) = rect.split_top(10);
        assert_eq!(all, rect);
        assert!(none.is_empty());
    }

    #[test]
    fn test_split_bottom() {
        let rect = Rect::new(0, 1, 80, 23);
        let (above, last) = rect.split_bottom(1);
        assert_eq!(above, Rect::new(0, 1, 80, 22));
        assert_eq!(last, Rect::new(0, 23, 80, 1));

        let (none, all) = rect.split_bottom(30);
        assert!(none.is_empty());
        assert_eq!(all, rect);
    }

    #[test]
    fn test_right_saturates() {
        assert_eq!(Rect::new(10, 0, 5, 1).right(), 15);
        assert_eq!(Rect::new(u16::MAX - 1, 0, 5, 1).right(), u16::MAX);
        assert!(Rect::default().is_empty());
    }
}
