//! Tracing subscriber setup.
//!
//! The terminal belongs to the UI while `up` runs, so diagnostics only ever
//! go to a file, and only when one was asked for.

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber, writing to `log_file_path`.
///
/// The file is truncated. `RUST_LOG` overrides the default `info` level.
pub fn init(log_file_path: &Path) -> io::Result<()> {
    let log_file = File::create(log_file_path)?;
    build_subscriber(log_file, env_filter()).init();
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Build a plain-text subscriber over `log_file`.
pub fn build_subscriber(
    log_file: File,
    filter: EnvFilter,
) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .with_thread_names(true);

    tracing_subscriber::registry().with(fmt_layer).with(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_writes_events_at_or_above_filter() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap(), EnvFilter::new("info"));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(command = "sort", "task started");
            tracing::debug!("hidden detail");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("INFO"));
        assert!(contents.contains("task started"));
        assert!(contents.contains("command=\"sort\""));
        assert!(!contents.contains("hidden detail"));
        assert!(!contents.contains('\x1b'));
    }

    #[test]
    fn test_filter_directive_raises_level() {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap(), EnvFilter::new("debug"));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("spawned reaper");
        });

        let contents = std::fs::read_to_string(log_file.path()).unwrap();
        assert!(contents.contains("DEBUG"));
        assert!(contents.contains("spawned reaper"));
    }
}
