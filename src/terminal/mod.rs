//! Terminal ownership: the full-screen session and the frame renderer.

mod renderer;
mod session;

pub use renderer::Renderer;
pub use session::{restore, TerminalSession};
