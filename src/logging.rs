//! File-based tracing setup
//!
//! The interactive host owns the terminal, so logs always go to a file:
//! `<state_dir>/quickrun/quickrun.log`, or the temp dir when no state dir
//! exists. Filtering comes from `QUICKRUN_LOG` (e.g. `QUICKRUN_LOG=debug`).

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_ENV: &str = "QUICKRUN_LOG";

/// Directory holding the log file, created on demand
pub fn log_dir() -> PathBuf {
    let dir = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|d| d.join("quickrun"))
        .unwrap_or_else(|| std::env::temp_dir().join("quickrun-logs"));

    if fs::create_dir_all(&dir).is_err() {
        return std::env::temp_dir();
    }
    dir
}

pub fn log_path() -> PathBuf {
    log_dir().join("quickrun.log")
}

/// Build the filter: `QUICKRUN_LOG` wins, otherwise `info` (or `debug` when verbose)
fn build_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. Failing to open the log file disables logging
/// rather than aborting; returns the log path when logging is active.
pub fn init(verbose: bool) -> Option<PathBuf> {
    let path = log_path();
    let file = File::create(&path).ok()?;

    let fmt_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(file));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(build_filter(verbose))
        .try_init()
        .ok()?;

    Some(path)
}
