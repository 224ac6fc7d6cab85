//! Host editor interface
//!
//! The engine never talks to an editor directly; everything it needs from
//! one (buffers, cursor, key bindings, messages) goes through [`Host`].
//!
//! Positions exchanged with a host use a 1-based line and a 0-based column.
//!
//! @module host

mod terminal;

pub use terminal::TerminalHost;

use crate::core::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// User actions a host can bind to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    JumpToDefinition,
    GoBack,
    GoForward,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::JumpToDefinition => "jump",
            Action::GoBack => "back",
            Action::GoForward => "forward",
        }
    }

    /// Parse an action by its short name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "jump" => Some(Action::JumpToDefinition),
            "back" => Some(Action::GoBack),
            "forward" => Some(Action::GoForward),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a line of raw host input turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A bound key was pressed
    Action(Action),
    /// The host handled the input itself
    Handled,
    Quit,
}

/// Editor-side collaborator
pub trait Host {
    /// File of the active buffer
    fn current_file(&self) -> Option<PathBuf>;

    /// Cursor as (1-based line, 0-based column)
    fn current_position(&self) -> (u32, u32);

    /// True if the buffer for `path` has unsaved changes
    fn is_modified(&self, path: &Path) -> bool;

    /// Current text of the buffer for `path`, if it is open
    fn buffer_content(&self, path: &Path) -> Option<String>;

    fn open_buffers(&self) -> Vec<PathBuf>;

    /// Open `path` in a new buffer and make it active
    fn open_file(&mut self, path: &Path) -> Result<()>;

    /// Switch to the already open buffer for `path`
    fn navigate_to_file(&mut self, path: &Path) -> Result<()>;

    fn goto_position(&mut self, line: u32, column: u32);

    fn output_message(&mut self, message: &str);

    fn subscribe_key(&mut self, key: &str, action: Action);

    /// Translate one line of raw input (a key name or a host command)
    fn interpret(&mut self, input: &str) -> Result<Input>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names_round_trip() {
        for action in [Action::JumpToDefinition, Action::GoBack, Action::GoForward] {
            assert_eq!(Action::from_name(action.as_str()), Some(action));
        }
        assert_eq!(Action::from_name("save"), None);
    }
}
