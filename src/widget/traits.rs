//! The `Widget` trait shared by the command line, preview and status bar.

use crate::actor::InputEvent;
use crate::layout::Rect;
use crate::screen::Grid;

/// A screen region that draws itself into the frame and may react to keys.
pub trait Widget {
    /// The region this widget occupies.
    fn bounds(&self) -> Rect;

    /// Move or resize the widget after the screen layout changed.
    fn set_bounds(&mut self, bounds: Rect);

    /// Draw into `grid`, touching only cells inside [`Widget::bounds`].
    fn render(&self, grid: &mut Grid);

    /// Offer an input event to the widget.
    ///
    /// Returns `true` when the widget used it; otherwise the loop offers it
    /// to the next widget.
    fn handle_input(&mut self, event: &InputEvent) -> bool;
}
