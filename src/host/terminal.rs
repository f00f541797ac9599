//! State of the interactive `quickrun session` host
//!
//! Holds everything the renderer draws: the active file, the output split,
//! the command line and the last notification. Input handling mutates it and
//! the runner drives it through [`Host`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::Chars;

use unicode_width::UnicodeWidthChar;

use super::{Host, NotifyLevel, OutputStream, SplitSpec, SurfaceId};
use crate::input::KeySequenceState;
use crate::runner::FileType;

/// Maximum lines kept per output split
const SCROLLBACK: usize = 5000;

const TAB_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Command,
    /// Single-line input for run arguments
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Document,
    Output,
}

/// The output split
#[derive(Debug)]
pub struct OutputPane {
    pub id: SurfaceId,
    pub spec: SplitSpec,
    pub lines: Vec<(OutputStream, String)>,
    /// Lines scrolled up from the bottom
    pub scroll: usize,
}

impl OutputPane {
    fn new(id: SurfaceId, spec: SplitSpec) -> Self {
        Self {
            id,
            spec,
            lines: Vec::new(),
            scroll: 0,
        }
    }

    fn push(&mut self, stream: OutputStream, line: &str) {
        self.lines.push((stream, printable(line)));
        if self.lines.len() > SCROLLBACK {
            let excess = self.lines.len() - SCROLLBACK;
            self.lines.drain(..excess);
        }
    }

    /// Lines visible in a view `height` rows tall
    pub fn visible(&self, height: usize) -> &[(OutputStream, String)] {
        let end = self.lines.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        &self.lines[start..end]
    }
}

pub struct TerminalHost {
    pub file: PathBuf,
    pub filetype: FileType,
    pub root: PathBuf,

    pub mode: Mode,
    pub focus: Focus,
    pub command_buffer: String,
    pub prompt_buffer: String,
    pub message: Option<(NotifyLevel, String)>,
    pub output: Option<OutputPane>,
    pub keys: KeySequenceState,

    /// A run is still streaming into the split
    pub busy: bool,
    pub running: bool,
    next_surface: SurfaceId,
}

impl TerminalHost {
    pub fn new(file: PathBuf, filetype: FileType, root: PathBuf, keys: KeySequenceState) -> Self {
        Self {
            file,
            filetype,
            root,
            mode: Mode::Normal,
            focus: Focus::Document,
            command_buffer: String::new(),
            prompt_buffer: String::new(),
            message: None,
            output: None,
            keys,
            busy: false,
            running: true,
            next_surface: 1,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn set_message(&mut self, level: NotifyLevel, msg: impl Into<String>) {
        self.message = Some((level, msg.into()));
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// Close the output split; its id is never valid again
    pub fn close_output(&mut self) {
        if self.output.take().is_some() {
            self.focus = Focus::Document;
        }
    }

    pub fn scroll_output(&mut self, delta: isize) {
        if let Some(pane) = self.output.as_mut() {
            let max = pane.lines.len();
            pane.scroll = pane.scroll.saturating_add_signed(delta).min(max);
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn enter_command_mode(&mut self) {
        self.mode = Mode::Command;
        self.command_buffer.clear();
    }

    pub fn enter_prompt_mode(&mut self) {
        self.mode = Mode::Prompt;
        self.prompt_buffer.clear();
    }

    pub fn enter_normal_mode(&mut self) {
        self.mode = Mode::Normal;
        self.command_buffer.clear();
        self.prompt_buffer.clear();
    }
}

/// What a line of process output looks like once it is safe to draw: escape
/// sequences and other control characters dropped, tabs expanded, and only
/// the text after the last carriage return kept.
fn printable(line: &str) -> String {
    let line = line.rsplit('\r').find(|part| !part.is_empty()).unwrap_or("");

    let mut out = String::with_capacity(line.len());
    let mut col = 0;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => skip_escape(&mut chars),
            '\t' => {
                let n = TAB_WIDTH - col % TAB_WIDTH;
                out.extend(std::iter::repeat_n(' ', n));
                col += n;
            }
            c if c.is_control() => {}
            c => {
                out.push(c);
                col += c.width().unwrap_or(0);
            }
        }
    }
    out
}

/// Consume the rest of an escape sequence whose ESC was already read
fn skip_escape(chars: &mut Chars<'_>) {
    match chars.next() {
        // CSI ends with a final byte in @..~
        Some('[') => {
            for c in chars.by_ref() {
                if ('@'..='~').contains(&c) {
                    break;
                }
            }
        }
        // OSC ends with BEL or ESC \
        Some(']') => {
            while let Some(c) = chars.next() {
                if c == '\x07' {
                    break;
                }
                if c == '\x1b' {
                    chars.next();
                    break;
                }
            }
        }
        _ => {}
    }
}

impl Host for TerminalHost {
    fn active_file(&self) -> Option<PathBuf> {
        Some(self.file.clone())
    }

    fn active_filetype(&self) -> FileType {
        self.filetype.clone()
    }

    /// The session shows a file that lives on disk, so there is nothing to
    /// write; it only has to still be there.
    fn save_active_document(&mut self) -> io::Result<()> {
        fs::metadata(&self.file).map(|_| ())
    }

    fn open_split(&mut self, spec: SplitSpec) -> SurfaceId {
        let id = self.next_surface;
        self.next_surface += 1;
        self.output = Some(OutputPane::new(id, spec));
        self.focus = Focus::Output;
        id
    }

    fn surface_is_valid(&self, surface: SurfaceId) -> bool {
        self.output.as_ref().is_some_and(|pane| pane.id == surface)
    }

    fn clear_surface(&mut self, surface: SurfaceId) {
        if let Some(pane) = self.output.as_mut().filter(|pane| pane.id == surface) {
            pane.lines.clear();
            pane.scroll = 0;
        }
    }

    fn focus_surface(&mut self, surface: SurfaceId) {
        if self.surface_is_valid(surface) {
            self.focus = Focus::Output;
        }
    }

    fn append_output(&mut self, surface: SurfaceId, stream: OutputStream, line: &str) {
        if let Some(pane) = self.output.as_mut().filter(|pane| pane.id == surface) {
            pane.push(stream, line);
        }
    }

    fn notify(&mut self, level: NotifyLevel, message: &str) {
        self.set_message(level, message);
    }
}
