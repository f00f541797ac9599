//! Error types for quickrun

use std::io;

/// Errors that can stop a run or the program itself.
///
/// Most runner failures never reach this type: a missing recipe or a nonzero
/// exit is reported to the host as a notification instead.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// I/O error outside of process spawning
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The shell could not be started for a run
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        /// The shell command line that was being launched
        command: String,
        #[source]
        source: io::Error,
    },

    /// Unsaved edits could not be written before a run
    #[error("could not save the active document: {0}")]
    Save(#[source] io::Error),

    /// The configuration script failed to load
    #[error("config error: {0}")]
    Config(String),

    /// The host has no file open
    #[error("no active file to run")]
    NoActiveFile,

    /// Terminal setup or rendering failed
    #[error("terminal error: {0}")]
    Terminal(#[source] io::Error),
}

/// Result type alias for quickrun operations
pub type Result<T> = std::result::Result<T, RunnerError>;
