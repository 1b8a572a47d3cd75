//! Application configuration.
//!
//! Built once from command-line flags; library code never consults the
//! environment.

use crate::capture::DEFAULT_CAPACITY;
use std::path::PathBuf;

/// Configuration for a preview session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shell interpreter invoked as `<shell> -c <command>`.
    pub shell: String,
    /// Capacity in bytes of the input buffer and of every output buffer.
    pub capacity: usize,
    /// Prompt drawn before the command line.
    pub prompt: String,
    /// Whether to draw the bottom status bar.
    pub show_status: bool,
    /// Where to write diagnostics, if anywhere.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shell: String::from("bash"),
            capacity: DEFAULT_CAPACITY,
            prompt: String::from("| "),
            show_status: true,
            log_file: None,
        }
    }
}
