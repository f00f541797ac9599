//! The editor side of a run
//!
//! A host owns the screen and the active document. The runner only talks to
//! it through [`Host`], so the same runner drives the interactive terminal
//! host, the plain stdout host, and test doubles.

pub mod stream;
pub mod terminal;

use std::io;
use std::path::PathBuf;

use crate::config::SplitEdge;
use crate::runner::FileType;

/// Handle to an output view owned by the host
pub type SurfaceId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}

impl NotifyLevel {
    pub fn label(&self) -> &'static str {
        match self {
            NotifyLevel::Info => "info",
            NotifyLevel::Warn => "warning",
            NotifyLevel::Error => "error",
        }
    }
}

/// Which process stream a line of output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Size and placement of a new output split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitSpec {
    pub edge: SplitEdge,
    pub size: u16,
}

/// Editor primitives the runner relies on
pub trait Host {
    fn active_file(&self) -> Option<PathBuf>;
    fn active_filetype(&self) -> FileType;

    /// Write unsaved edits of the active document to disk
    fn save_active_document(&mut self) -> io::Result<()>;

    /// Open a fixed-size split, focus it and return its handle
    fn open_split(&mut self, spec: SplitSpec) -> SurfaceId;
    /// False once the host has closed the view
    fn surface_is_valid(&self, surface: SurfaceId) -> bool;
    fn clear_surface(&mut self, surface: SurfaceId);
    fn focus_surface(&mut self, surface: SurfaceId);
    fn append_output(&mut self, surface: SurfaceId, stream: OutputStream, line: &str);

    fn notify(&mut self, level: NotifyLevel, message: &str);
}

#[cfg(test)]
pub use fake::FakeHost;
