//! Layout module: static regions, recomputed only on terminal resize.

mod rect;
mod screen;

pub use rect::Rect;
pub use screen::ScreenLayout;
