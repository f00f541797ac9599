use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};

use super::keymap::{Action, KeyResult};
use crate::host::NotifyLevel;
use crate::host::terminal::{Mode, TerminalHost};

/// Work the event loop has to do after an input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Run the active file with this raw argument string
    Run(String),
    Resize(u16, u16),
}

/// A parsed `:` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(String),
    /// Prompts for arguments when none are given
    RunArgs(String),
    Close,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let (name, args) = match line.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim().to_string()),
        None => (line, String::new()),
    };

    let command = match name {
        "" => return Ok(None),
        "Run" => Command::Run(args),
        "RunArgs" => Command::RunArgs(args),
        "close" | "clo" => Command::Close,
        "q" | "quit" => Command::Quit,
        _ => return Err(format!("Unknown command: {}", name)),
    };
    Ok(Some(command))
}

pub fn handle_event(host: &mut TerminalHost, event: Event) -> Option<Intent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(host, key),
        Event::Resize(width, height) => Some(Intent::Resize(width, height)),
        _ => None,
    }
}

fn handle_key(host: &mut TerminalHost, key: KeyEvent) -> Option<Intent> {
    match host.mode {
        Mode::Normal => handle_normal_mode(host, key),
        Mode::Command => handle_command_mode(host, key),
        Mode::Prompt => handle_prompt_mode(host, key),
    }
}

fn handle_normal_mode(host: &mut TerminalHost, key: KeyEvent) -> Option<Intent> {
    match host.keys.process_key(key.into()) {
        KeyResult::Action(action) => {
            host.clear_message();
            apply_action(host, action)
        }
        KeyResult::Pending => None,
        KeyResult::Unhandled => {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => host.scroll_output(1),
                KeyCode::Down | KeyCode::Char('j') => host.scroll_output(-1),
                KeyCode::PageUp => host.scroll_output(10),
                KeyCode::PageDown => host.scroll_output(-10),
                KeyCode::Esc => host.clear_message(),
                _ => {}
            }
            None
        }
    }
}

fn apply_action(host: &mut TerminalHost, action: Action) -> Option<Intent> {
    match action {
        Action::Run => return Some(Intent::Run(String::new())),
        Action::RunWithArgs => host.enter_prompt_mode(),
        Action::CloseOutput => host.close_output(),
        Action::EnterCommandMode => host.enter_command_mode(),
        Action::Quit => host.quit(),
    }
    None
}

fn handle_command_mode(host: &mut TerminalHost, key: KeyEvent) -> Option<Intent> {
    match key.code {
        KeyCode::Esc => host.enter_normal_mode(),

        KeyCode::Enter => {
            let line = std::mem::take(&mut host.command_buffer);
            host.enter_normal_mode();
            return execute_command(host, &line);
        }

        KeyCode::Backspace => {
            host.command_buffer.pop();
            if host.command_buffer.is_empty() {
                host.enter_normal_mode();
            }
        }

        KeyCode::Char(c) => host.command_buffer.push(c),

        _ => {}
    }
    None
}

fn execute_command(host: &mut TerminalHost, line: &str) -> Option<Intent> {
    match parse_command(line) {
        Ok(Some(Command::Run(args))) => Some(Intent::Run(args)),
        Ok(Some(Command::RunArgs(args))) if args.is_empty() => {
            host.enter_prompt_mode();
            None
        }
        Ok(Some(Command::RunArgs(args))) => Some(Intent::Run(args)),
        Ok(Some(Command::Close)) => {
            host.close_output();
            None
        }
        Ok(Some(Command::Quit)) => {
            host.quit();
            None
        }
        Ok(None) => None,
        Err(msg) => {
            host.set_message(NotifyLevel::Error, msg);
            None
        }
    }
}

fn handle_prompt_mode(host: &mut TerminalHost, key: KeyEvent) -> Option<Intent> {
    match key.code {
        KeyCode::Esc => host.enter_normal_mode(),

        KeyCode::Enter => {
            let args = std::mem::take(&mut host.prompt_buffer);
            host.enter_normal_mode();
            return Some(Intent::Run(args));
        }

        KeyCode::Backspace => {
            host.prompt_buffer.pop();
        }

        KeyCode::Char(c) => host.prompt_buffer.push(c),

        _ => {}
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeySequenceState;
    use crate::runner::FileType;
    use crossterm::event::KeyModifiers;
    use std::path::PathBuf;

    fn host() -> TerminalHost {
        TerminalHost::new(
            PathBuf::from("/p/a.py"),
            FileType::Python,
            PathBuf::from("/p"),
            KeySequenceState::new(),
        )
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(host: &mut TerminalHost, s: &str) -> Option<Intent> {
        let mut last = None;
        for c in s.chars() {
            last = handle_event(host, key(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn parse_commands() {
        assert_eq!(
            parse_command("Run a 'b c'"),
            Ok(Some(Command::Run("a 'b c'".into())))
        );
        assert_eq!(parse_command("Run"), Ok(Some(Command::Run(String::new()))));
        assert_eq!(
            parse_command("RunArgs"),
            Ok(Some(Command::RunArgs(String::new())))
        );
        assert_eq!(parse_command("  q "), Ok(Some(Command::Quit)));
        assert_eq!(parse_command("close"), Ok(Some(Command::Close)));
        assert_eq!(parse_command(""), Ok(None));
        assert!(parse_command("wq").is_err());
    }

    #[test]
    fn leader_r_requests_run() {
        let mut host = host();
        assert_eq!(type_str(&mut host, " r"), Some(Intent::Run(String::new())));
    }

    #[test]
    fn command_line_run_with_args() {
        let mut host = host();
        type_str(&mut host, ":");
        assert_eq!(host.mode, Mode::Command);
        type_str(&mut host, "Run --fast");
        let intent = handle_event(&mut host, key(KeyCode::Enter));

        assert_eq!(intent, Some(Intent::Run("--fast".into())));
        assert_eq!(host.mode, Mode::Normal);
        assert!(host.command_buffer.is_empty());
    }

    #[test]
    fn run_args_without_args_prompts() {
        let mut host = host();
        type_str(&mut host, ":RunArgs");
        assert_eq!(handle_event(&mut host, key(KeyCode::Enter)), None);
        assert_eq!(host.mode, Mode::Prompt);

        type_str(&mut host, "x yy");
        handle_event(&mut host, key(KeyCode::Backspace));
        let intent = handle_event(&mut host, key(KeyCode::Enter));
        assert_eq!(intent, Some(Intent::Run("x y".into())));
        assert_eq!(host.mode, Mode::Normal);
    }

    #[test]
    fn leader_shift_r_prompts_and_esc_cancels() {
        let mut host = host();
        type_str(&mut host, " R");
        assert_eq!(host.mode, Mode::Prompt);
        type_str(&mut host, "abc");
        assert_eq!(handle_event(&mut host, key(KeyCode::Esc)), None);
        assert_eq!(host.mode, Mode::Normal);
        assert!(host.prompt_buffer.is_empty());
    }

    #[test]
    fn unknown_command_sets_error_message() {
        let mut host = host();
        type_str(&mut host, ":frobnicate");
        handle_event(&mut host, key(KeyCode::Enter));
        assert!(matches!(host.message, Some((NotifyLevel::Error, _))));
    }

    #[test]
    fn backspace_on_empty_command_leaves_command_mode() {
        let mut host = host();
        type_str(&mut host, ":q");
        handle_event(&mut host, key(KeyCode::Backspace));
        assert_eq!(host.mode, Mode::Command);
        handle_event(&mut host, key(KeyCode::Backspace));
        assert_eq!(host.mode, Mode::Normal);
    }

    #[test]
    fn quit_key_stops_host() {
        let mut host = host();
        type_str(&mut host, "q");
        assert!(!host.running);
    }

    #[test]
    fn resize_is_forwarded() {
        let mut host = host();
        assert_eq!(
            handle_event(&mut host, Event::Resize(100, 40)),
            Some(Intent::Resize(100, 40))
        );
    }
}
