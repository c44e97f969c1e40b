use crate::complete::complete;
use crate::vfs::{NodeId, VfsTree};

/// Keys the line editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Tab,
    Up,
    Down,
}

/// Submitted command lines plus a recall cursor.
///
/// The cursor sits one past the last entry unless the user is browsing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
        self.cursor = self.entries.len();
    }

    /// Step back one entry. Stays put at the first entry.
    pub fn previous(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Step forward one entry.
    ///
    /// Moving past the last entry yields `Some("")` so the field is cleared;
    /// when already past the end nothing happens.
    pub fn next(&mut self) -> Option<&str> {
        let len = self.entries.len();
        if self.cursor + 1 < len {
            self.cursor += 1;
            self.entries.get(self.cursor).map(String::as_str)
        } else if self.cursor + 1 == len {
            self.cursor = len;
            Some("")
        } else {
            None
        }
    }
}

/// The single input field of the shell.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineEditor {
    input: String,
    history: History,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Apply one key press.
    ///
    /// Returns the trimmed line to run when Enter submits a non-empty input.
    /// The field is cleared on every Enter.
    pub fn handle(&mut self, key: Key, tree: &VfsTree, cwd: NodeId) -> Option<String> {
        match key {
            Key::Char(ch) => self.input.push(ch),
            Key::Backspace => {
                self.input.pop();
            }
            Key::Enter => {
                let line = self.input.trim().to_string();
                self.input.clear();
                if !line.is_empty() {
                    self.history.push(line.clone());
                    return Some(line);
                }
            }
            Key::Tab => {
                if let Some(completed) = complete(&self.input, tree, cwd) {
                    self.input = completed;
                }
            }
            Key::Up => {
                if let Some(entry) = self.history.previous() {
                    self.input = entry.to_string();
                }
            }
            Key::Down => {
                if let Some(entry) = self.history.next() {
                    self.input = entry.to_string();
                }
            }
        }
        None
    }
}
