//! Widgets drawn by the main loop.
//!
//! - [`CommandLine`]: prompt plus the editable command text
//! - [`Preview`]: the active buffer's snapshot
//! - [`StatusBar`]: input and task state on the bottom row

mod command_line;
mod preview;
mod status_bar;
mod traits;

pub use command_line::CommandLine;
pub use preview::Preview;
pub use status_bar::{format_size, StatusBar};
pub use traits::Widget;
