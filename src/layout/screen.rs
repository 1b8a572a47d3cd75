//! Screen layout: command line on top, preview below, optional status bar.

use super::rect::Rect;

/// Regions of the full-screen view, recomputed on every resize.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenLayout {
    /// First row: prompt and command editor.
    pub command: Rect,
    /// Everything between the command line and the status bar.
    pub preview: Rect,
    /// Last row, when enabled and the terminal has room for it.
    pub status: Option<Rect>,
}

impl ScreenLayout {
    /// Compute regions for a terminal of `width` x `height`.
    ///
    /// The command line always gets the first row. The status bar is dropped
    /// before the preview loses its last row.
    pub fn compute(width: u16, height: u16, show_status: bool) -> Self {
        let (command, rest) = Rect::from_size(width, height).split_top(1);
        if show_status && rest.height >= 2 {
            let (preview, status) = rest.split_bottom(1);
            Self {
                command,
                preview,
                status: Some(status),
            }
        } else {
            Self {
                command,
                preview: rest,
                status: None,
            }
        }
    }
}
