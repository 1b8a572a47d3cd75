//! Actor Model: Message-passing between background threads and the main loop.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     InputEvent      ┌──────────────┐
//! │ Input Thread │ ─────────────────▶  │              │
//! └──────────────┘                     │  Main Loop   │──▶ Renderer ──▶ tty
//!                                      │  (select!)   │
//! ┌──────────────┐        Wake         │              │
//! │  Collectors  │ ─────────────────▶  │              │
//! └──────────────┘                     └──────────────┘
//! ```
//!
//! Collectors are the stdin reader and each invocation's output reader;
//! they signal through [`crate::wake`].

mod input;
mod messages;

pub use input::InputActor;
pub use messages::{InputEvent, KeyCode, KeyModifiers};
