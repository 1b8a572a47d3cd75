//! Error types.
//!
//! Only startup and input-collection failures surface here. Everything a
//! subprocess does wrong ends up as bytes in its output buffer instead.

use std::io;

/// Errors that abort the program.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Standard input is an interactive terminal instead of a pipe.
    #[error("up requires some data piped on standard input, e.g.: `echo hello world | up`")]
    InteractiveStdin,

    /// Reading the piped input failed.
    #[error("failed to read standard input: {0}")]
    InputRead(#[source] io::Error),

    /// Terminal setup, drawing or restore failed.
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    /// The OS refused to start a background thread.
    #[error("failed to spawn {name} thread: {source}")]
    Thread {
        /// Thread name.
        name: &'static str,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
