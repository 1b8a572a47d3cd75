//! # Upview
//!
//! Interactive pipeline preview for the terminal.
//!
//! Pipe data into `up`, type a shell command, and the command's output is
//! shown live. Every edit of the command line cancels the running command and
//! starts the new one against the same captured input, so a pipeline can be
//! built up one stage at a time.
//!
//! ## Core Concepts
//!
//! - **Capture buffers**: bounded, append-only byte stores that one producer
//!   fills while any number of threads read them ([`CaptureBuffer`])
//! - **Replay**: every command reads the captured input from the start, even
//!   while it is still arriving ([`ReplayReader`])
//! - **Process groups**: each command runs in its own group so canceling it
//!   kills the whole pipeline ([`Spawner`], [`Invocation`])
//! - **Wake-ups**: buffers nudge the foreground loop whenever they grow, and
//!   bursts collapse into a single redraw ([`wake`])
//! - **Double-buffered rendering**: the screen is a cell grid and only changed
//!   cells are written to the terminal ([`screen::diff`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use upview::{CaptureBuffer, Notifier, Spawner};
//!
//! let (mut writer, input) = CaptureBuffer::create(1024, Notifier::none());
//! writer.push(b"b\na\n");
//! writer.finish();
//!
//! let spawner = Spawner::new("sh", 1024, Notifier::none());
//! let invocation = spawner.start(&input, "sort");
//! invocation.output().wait_finished(std::time::Duration::from_secs(1));
//! assert_eq!(invocation.output().snapshot().to_vec(), b"a\nb\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod app;
pub mod capture;
pub mod config;
pub mod controller;
pub mod error;
pub mod layout;
pub mod logging;
pub mod process;
pub mod screen;
pub mod terminal;
pub mod wake;
pub mod widget;

// Re-exports for convenience
pub use actor::{InputActor, InputEvent, KeyCode, KeyModifiers};
pub use app::{run, App, Flow};
pub use capture::{CaptureBuffer, CaptureState, CaptureWriter, ReadStatus, ReplayReader, Snapshot};
pub use config::Config;
pub use controller::{Controller, ControllerState, Transition};
pub use error::{Error, Result};
pub use layout::{Rect, ScreenLayout};
pub use process::{Invocation, Spawner, TaskStatus};
pub use screen::{Cell, Color, Grid, Modifiers, Style};
pub use wake::{Notifier, WakeReceiver};
pub use widget::{CommandLine, Preview, StatusBar, Widget};
