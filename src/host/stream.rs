//! Plain stdout/stderr host for `quickrun run`

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crossterm::style::Stylize;

use super::{Host, NotifyLevel, OutputStream, SplitSpec, SurfaceId};
use crate::runner::FileType;

/// Writes output as it arrives. Every split is the same terminal, so a
/// surface stays valid for the life of the host.
pub struct StreamHost<O: Write, E: Write> {
    file: PathBuf,
    filetype: FileType,
    out: O,
    err: E,
    color: bool,
    opened: SurfaceId,
}

impl StreamHost<io::Stdout, io::Stderr> {
    pub fn stdio(file: PathBuf, filetype: FileType) -> Self {
        Self::new(file, filetype, io::stdout(), io::stderr(), true)
    }
}

impl<O: Write, E: Write> StreamHost<O, E> {
    pub fn new(file: PathBuf, filetype: FileType, out: O, err: E, color: bool) -> Self {
        Self {
            file,
            filetype,
            out,
            err,
            color,
            opened: 0,
        }
    }

    #[cfg(test)]
    fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }

    fn level_prefix(&self, level: NotifyLevel) -> String {
        let label = format!("[{}]", level.label());
        if !self.color {
            return label;
        }
        match level {
            NotifyLevel::Info => label.green().to_string(),
            NotifyLevel::Warn => label.yellow().to_string(),
            NotifyLevel::Error => label.red().bold().to_string(),
        }
    }
}

impl<O: Write, E: Write> Host for StreamHost<O, E> {
    fn active_file(&self) -> Option<PathBuf> {
        Some(self.file.clone())
    }

    fn active_filetype(&self) -> FileType {
        self.filetype.clone()
    }

    fn save_active_document(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn open_split(&mut self, _spec: SplitSpec) -> SurfaceId {
        self.opened += 1;
        let header = format!("── quickrun: {} ──", self.file.display());
        let header = if self.color {
            header.bold().to_string()
        } else {
            header
        };
        if let Err(e) = writeln!(self.out, "{}", header) {
            tracing::warn!("failed to write header: {}", e);
        }
        self.opened
    }

    fn surface_is_valid(&self, surface: SurfaceId) -> bool {
        surface != 0 && surface <= self.opened
    }

    fn clear_surface(&mut self, _surface: SurfaceId) {}

    fn focus_surface(&mut self, _surface: SurfaceId) {}

    fn append_output(&mut self, _surface: SurfaceId, stream: OutputStream, line: &str) {
        let result = match stream {
            OutputStream::Stdout => writeln!(self.out, "{}", line).and_then(|_| self.out.flush()),
            OutputStream::Stderr => writeln!(self.err, "{}", line).and_then(|_| self.err.flush()),
        };
        if let Err(e) = result {
            tracing::warn!("failed to write output: {}", e);
        }
    }

    fn notify(&mut self, level: NotifyLevel, message: &str) {
        let prefix = self.level_prefix(level);
        if let Err(e) = writeln!(self.err, "{} {}", prefix, message) {
            tracing::warn!("failed to write notification: {}", e);
        }
    }
}

/// Ask for one line of input. `None` at end of input.
pub fn prompt_line<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<Option<String>> {
    write!(output, "{}", label)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}
