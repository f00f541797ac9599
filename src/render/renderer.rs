use std::io::{self, Write, stdout};

use crossterm::{
    cursor::{Hide, MoveTo, SetCursorStyle, Show},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, Clear, ClearType, DisableLineWrap, EnableLineWrap, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use unicode_width::UnicodeWidthChar;

use super::layout::{Layout, Rect};
use crate::host::terminal::{Focus, Mode, TerminalHost};
use crate::host::{NotifyLevel, OutputStream};
use crate::input::Action;

const FG: Color = Color::Reset;
const DIM: Color = Color::DarkGrey;
const ACCENT: Color = Color::Cyan;
const STDERR: Color = Color::Red;
const STATUS_BG: Color = Color::DarkBlue;
const STATUS_FG: Color = Color::White;

pub struct Renderer {
    pub width: u16,
    pub height: u16,
}

impl Renderer {
    pub fn new() -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self { width, height })
    }

    pub fn setup() -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            EnterAlternateScreen,
            DisableLineWrap,
            Hide,
            Clear(ClearType::All)
        )?;
        Ok(())
    }

    pub fn teardown() -> io::Result<()> {
        execute!(
            stdout(),
            ResetColor,
            SetCursorStyle::DefaultUserShape,
            Show,
            EnableLineWrap,
            LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn layout(&self, host: &TerminalHost) -> Layout {
        let split = host
            .output
            .as_ref()
            .map(|pane| (pane.spec.size, pane.spec.edge));
        Layout::compute(self.width, self.height, split)
    }

    pub fn render(&self, host: &TerminalHost) -> io::Result<()> {
        let mut stdout = stdout();

        // Hide cursor during redraw to prevent flicker
        queue!(stdout, Hide, ResetColor)?;

        let layout = self.layout(host);
        self.render_info(&mut stdout, host, &layout.info)?;
        if let Some(rect) = layout.output {
            self.render_output(&mut stdout, host, &rect)?;
        }
        self.render_status_line(&mut stdout, host, layout.status_row)?;
        self.position_cursor(&mut stdout, host, layout.status_row)?;

        stdout.flush()?;
        Ok(())
    }

    fn render_info(&self, stdout: &mut impl Write, host: &TerminalHost, rect: &Rect) -> io::Result<()> {
        let help = |action: Action, label: &str| {
            let keys = host.keys.keys_for(action).join("/");
            format!("{:<14} {}", label, keys)
        };

        let lines: Vec<(Color, String)> = vec![
            (ACCENT, format!(" quickrun  {}", host.file().display())),
            (FG, format!(" filetype   {}", host.filetype)),
            (FG, format!(" root       {}", host.root.display())),
            (FG, String::new()),
            (DIM, format!(" {}", help(Action::Run, "run"))),
            (DIM, format!(" {}", help(Action::RunWithArgs, "run with args"))),
            (DIM, format!(" {}", help(Action::CloseOutput, "close output"))),
            (DIM, format!(" {}", help(Action::EnterCommandMode, "command"))),
            (DIM, format!(" {}", help(Action::Quit, "quit"))),
            (FG, String::new()),
            (DIM, " :Run [args]  :RunArgs [args]  :close  :q".to_string()),
        ];

        for row in 0..rect.height {
            queue!(stdout, MoveTo(rect.x, rect.y + row))?;
            let (color, text) = lines
                .get(row as usize)
                .map(|(c, t)| (*c, t.as_str()))
                .unwrap_or((FG, ""));
            queue!(stdout, SetForegroundColor(color))?;
            queue!(stdout, Print(fit(text, rect.width)))?;
        }
        Ok(())
    }

    fn render_output(&self, stdout: &mut impl Write, host: &TerminalHost, rect: &Rect) -> io::Result<()> {
        let Some(pane) = host.output.as_ref() else {
            return Ok(());
        };

        // Title row
        let state = if host.busy { "running" } else { "done" };
        let scrolled = if pane.scroll > 0 {
            format!(" [+{}]", pane.scroll)
        } else {
            String::new()
        };
        let title = format!("─ output ({}){} ", state, scrolled);
        let title = format!("{:─<width$}", title, width = rect.width as usize);

        queue!(stdout, MoveTo(rect.x, rect.y))?;
        let title_color = if host.focus == Focus::Output { ACCENT } else { DIM };
        queue!(stdout, SetForegroundColor(title_color))?;
        queue!(stdout, Print(fit(&title, rect.width)))?;

        let body_height = rect.height.saturating_sub(1);
        let visible = pane.visible(body_height as usize);
        for row in 0..body_height {
            queue!(stdout, MoveTo(rect.x, rect.y + 1 + row))?;
            match visible.get(row as usize) {
                Some((stream, line)) => {
                    let color = match stream {
                        OutputStream::Stdout => FG,
                        OutputStream::Stderr => STDERR,
                    };
                    queue!(stdout, SetForegroundColor(color))?;
                    queue!(stdout, Print(fit(line, rect.width)))?;
                }
                None => {
                    queue!(stdout, Print(fit("", rect.width)))?;
                }
            }
        }
        Ok(())
    }

    fn render_status_line(&self, stdout: &mut impl Write, host: &TerminalHost, row: u16) -> io::Result<()> {
        queue!(stdout, MoveTo(0, row))?;
        queue!(stdout, ResetColor, Clear(ClearType::CurrentLine))?;

        // Command and prompt modes - just show the input
        match host.mode {
            Mode::Command => {
                queue!(stdout, Print(format!(":{}", host.command_buffer)))?;
                return Ok(());
            }
            Mode::Prompt => {
                queue!(stdout, Print(format!("args: {}", host.prompt_buffer)))?;
                return Ok(());
            }
            Mode::Normal => {}
        }

        // Message - show prominently
        if let Some((level, msg)) = &host.message {
            let color = match level {
                NotifyLevel::Info => Color::Green,
                NotifyLevel::Warn => Color::Yellow,
                NotifyLevel::Error => Color::Red,
            };
            queue!(stdout, SetForegroundColor(color))?;
            if *level == NotifyLevel::Error {
                queue!(stdout, SetAttribute(Attribute::Bold))?;
            }
            queue!(stdout, Print(fit(msg, self.width)))?;
            queue!(stdout, SetAttribute(Attribute::Reset))?;
            return Ok(());
        }

        // Normal status bar
        queue!(stdout, SetBackgroundColor(STATUS_BG), SetForegroundColor(STATUS_FG))?;

        let filename = host
            .file()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "[No Name]".to_string());
        let pending = host.keys.pending_display();
        let pending = if pending.is_empty() {
            String::new()
        } else {
            format!(" [{}]", pending)
        };

        let left = format!(" NORMAL | {}{} ", filename, pending);
        let right = format!(" {} ", host.filetype);
        let padding = (self.width as usize).saturating_sub(left.chars().count() + right.chars().count());
        let status = format!("{}{}{}", left, " ".repeat(padding), right);

        queue!(stdout, Print(fit(&status, self.width)))?;
        queue!(stdout, ResetColor)?;
        Ok(())
    }

    fn position_cursor(&self, stdout: &mut impl Write, host: &TerminalHost, row: u16) -> io::Result<()> {
        let col = match host.mode {
            Mode::Command => 1 + host.command_buffer.chars().count(),
            Mode::Prompt => 6 + host.prompt_buffer.chars().count(),
            Mode::Normal => return Ok(()),
        };
        let col = (col as u16).min(self.width.saturating_sub(1));
        queue!(stdout, MoveTo(col, row), SetCursorStyle::BlinkingBar, Show)?;
        Ok(())
    }
}

/// Truncate or pad `text` to exactly `width` terminal columns
fn fit(text: &str, width: u16) -> String {
    let width = width as usize;
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.extend(std::iter::repeat_n(' ', width - used));
    out
}
