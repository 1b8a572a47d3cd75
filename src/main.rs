//! `up`: live preview of a shell pipeline over piped input.

use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use upview::{logging, terminal, Config};

/// Preview a shell pipeline live against data piped on stdin
#[derive(Parser, Debug)]
#[command(name = "up")]
#[command(about = "Type a shell command and watch its output against piped input", long_about = None)]
#[command(version)]
struct Args {
    /// Shell used to run commands as `<SHELL> -c <COMMAND>`
    #[arg(long, value_name = "PATH", default_value = "bash")]
    shell: String,

    /// Capacity of the input buffer and of every output buffer, in MiB
    #[arg(long, value_name = "MiB", default_value_t = 40)]
    buffer_size: usize,

    /// Prompt drawn before the command
    #[arg(long, value_name = "TEXT", default_value = "| ")]
    prompt: String,

    /// Write diagnostics to this file (filtered by RUST_LOG, default info)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Hide the status bar
    #[arg(long)]
    no_status: bool,
}

impl Args {
    fn into_config(self) -> Config {
        Config {
            shell: self.shell,
            capacity: self.buffer_size.saturating_mul(1024 * 1024),
            prompt: self.prompt,
            show_status: !self.no_status,
            log_file: self.log_file,
        }
    }
}

fn run(config: &Config) -> AnyhowResult<()> {
    if let Some(path) = &config.log_file {
        logging::init(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        terminal::restore();
        original_hook(panic);
    }));

    upview::run(config)?;
    Ok(())
}

fn main() -> ExitCode {
    let config = Args::parse().into_config();
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
