//! Screen model for double-buffered rendering.
//!
//! - [`Cell`]: one column of one row, 12 bytes
//! - [`Grid`]: the whole screen
//! - [`diff`]: turns a pair of grids into ANSI output

mod cell;
pub mod diff;
mod grid;

pub use cell::{text_width, Cell, CellFlags, Color, Modifiers, Style};
pub use grid::Grid;
