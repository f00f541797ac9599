use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Key {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Shift is already part of an uppercase char, so drop it
    fn normalized(mut self) -> Self {
        if let KeyCode::Char(_) = self.code {
            self.modifiers.remove(KeyModifiers::SHIFT);
        }
        self
    }
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        Key::new(event.code, event.modifiers).normalized()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Run,
    RunWithArgs,
    CloseOutput,
    EnterCommandMode,
    Quit,
}

impl Action {
    /// Parse an action name as used by `bind(...)` in the config
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "run" => Some(Action::Run),
            "run_with_args" | "run_args" => Some(Action::RunWithArgs),
            "close_output" | "close" => Some(Action::CloseOutput),
            "command" => Some(Action::EnterCommandMode),
            "quit" => Some(Action::Quit),
            _ => None,
        }
    }
}

/// Parse `"<leader>r"`, `"<C-c>"`, `"q"`, ... into keys.
///
/// `<leader>` and `<space>` are the space bar. Anything else outside angle
/// brackets is a literal character.
pub fn parse_key_sequence(s: &str) -> Option<Vec<Key>> {
    let mut keys = Vec::new();
    let mut rest = s;

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some(end) = rest.find('>') {
                let name = &rest[1..end];
                keys.push(parse_named_key(name)?);
                rest = &rest[end + 1..];
                continue;
            }
        }
        keys.push(Key::char(c));
        rest = &rest[c.len_utf8()..];
    }

    (!keys.is_empty()).then_some(keys)
}

fn parse_named_key(name: &str) -> Option<Key> {
    let lower = name.to_lowercase();
    let key = match lower.as_str() {
        "leader" | "space" => Key::char(' '),
        "cr" | "enter" | "return" => Key::new(KeyCode::Enter, KeyModifiers::NONE),
        "esc" => Key::new(KeyCode::Esc, KeyModifiers::NONE),
        "tab" => Key::new(KeyCode::Tab, KeyModifiers::NONE),
        "bs" | "backspace" => Key::new(KeyCode::Backspace, KeyModifiers::NONE),
        _ => {
            let (prefix, c) = lower.split_once('-')?;
            let mut chars = c.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            match prefix {
                "c" => Key::ctrl(c),
                "a" | "m" => Key::new(KeyCode::Char(c), KeyModifiers::ALT),
                _ => return None,
            }
        }
    };
    Some(key)
}

fn default_bindings() -> Vec<(Vec<Key>, Action)> {
    vec![
        (vec![Key::char(' '), Key::char('r')], Action::Run),
        (vec![Key::char(' '), Key::char('R')], Action::RunWithArgs),
        (vec![Key::char(' '), Key::char('c')], Action::CloseOutput),
        (vec![Key::char(':')], Action::EnterCommandMode),
        (vec![Key::char('q')], Action::Quit),
        (vec![Key::ctrl('c')], Action::Quit),
    ]
}

pub struct KeySequenceState {
    bindings: Vec<(Vec<Key>, Action)>,
    pending: Vec<Key>,
    last_key_time: Instant,
    timeout: Duration,
}

impl KeySequenceState {
    pub fn new() -> Self {
        Self {
            bindings: default_bindings(),
            pending: Vec::new(),
            last_key_time: Instant::now(),
            timeout: Duration::from_millis(1000),
        }
    }

    /// Defaults plus user bindings (key sequence -> action name). Invalid
    /// entries are logged and skipped.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut state = Self::new();
        for (keys, action) in overrides {
            match (parse_key_sequence(keys), Action::from_name(action)) {
                (Some(keys), Some(action)) => state.bind(keys, action),
                (None, _) => tracing::warn!("ignoring binding with bad keys: {:?}", keys),
                (_, None) => tracing::warn!("ignoring binding to unknown action: {:?}", action),
            }
        }
        state
    }

    /// Bind `keys`, replacing whatever was bound to exactly that sequence
    pub fn bind(&mut self, keys: Vec<Key>, action: Action) {
        self.bindings.retain(|(bound, _)| *bound != keys);
        self.bindings.push((keys, action));
    }

    fn check_timeout(&mut self) {
        if self.last_key_time.elapsed() > self.timeout {
            self.pending.clear();
        }
    }

    pub fn process_key(&mut self, key: Key) -> KeyResult {
        self.check_timeout();
        self.last_key_time = Instant::now();

        self.pending.push(key.normalized());

        match self.match_sequence() {
            MatchResult::Complete(action) => {
                self.pending.clear();
                KeyResult::Action(action)
            }
            MatchResult::Prefix => KeyResult::Pending,
            MatchResult::NoMatch => {
                // A broken sequence may still end in the start of a new one
                if self.pending.len() > 1 {
                    let last = self.pending.pop();
                    self.pending.clear();
                    if let Some(last) = last {
                        return self.process_key(last);
                    }
                }
                self.pending.clear();
                KeyResult::Unhandled
            }
        }
    }

    fn match_sequence(&self) -> MatchResult {
        let pending = &self.pending;

        if let Some((_, action)) = self.bindings.iter().find(|(keys, _)| keys == pending) {
            return MatchResult::Complete(*action);
        }

        let is_prefix = self
            .bindings
            .iter()
            .any(|(keys, _)| keys.len() > pending.len() && keys.starts_with(pending));
        if is_prefix {
            MatchResult::Prefix
        } else {
            MatchResult::NoMatch
        }
    }

    pub fn pending_display(&self) -> String {
        self.pending.iter().map(key_to_string).collect()
    }

    /// Key sequences bound to `action`, for the help line
    pub fn keys_for(&self, action: Action) -> Vec<String> {
        self.bindings
            .iter()
            .filter(|(_, bound)| *bound == action)
            .map(|(keys, _)| keys.iter().map(key_to_string).collect())
            .collect()
    }
}

fn key_to_string(key: &Key) -> String {
    let mut s = String::new();
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        s.push_str("C-");
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        s.push_str("A-");
    }
    match key.code {
        KeyCode::Char(' ') => s.push_str("␣"),
        KeyCode::Char(c) => s.push(c),
        KeyCode::Esc => s.push_str("Esc"),
        KeyCode::Enter => s.push_str("Enter"),
        KeyCode::Tab => s.push_str("Tab"),
        KeyCode::Backspace => s.push_str("BS"),
        _ => s.push('?'),
    }
    s
}

impl Default for KeySequenceState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
enum MatchResult {
    Complete(Action),
    Prefix,
    NoMatch,
}

#[derive(Debug, PartialEq, Eq)]
pub enum KeyResult {
    Action(Action),
    Pending,
    Unhandled,
}
