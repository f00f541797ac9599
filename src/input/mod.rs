mod handler;
mod keymap;

pub use handler::{Intent, handle_event};
pub use keymap::{Action, KeySequenceState};
