//! Line-oriented terminal host
//!
//! Keeps a list of buffers in memory and reads one command per line. Key
//! presses are typed as the key name (`F12`, `M--`, ...).
//!
//! Commands:
//! - `open PATH`, `switch PATH`
//! - `goto LINE COLUMN` (column is 0-based)
//! - `set LINE TEXT...` replaces a line of the active buffer
//! - `save`, `where`, `buffers`, `keys`, `help`, `quit`

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{Action, Host, Input};
use crate::core::error::{Error, Result};
use crate::inventory::canonical_path;

#[derive(Debug, Clone)]
struct Buffer {
    path: PathBuf,
    text: String,
    modified: bool,
}

pub struct TerminalHost<W: Write> {
    buffers: Vec<Buffer>,
    current: Option<usize>,
    line: u32,
    column: u32,
    keymap: HashMap<String, Action>,
    out: W,
}

impl TerminalHost<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            buffers: Vec::new(),
            current: None,
            line: 1,
            column: 0,
            keymap: HashMap::new(),
            out,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Replace the whole text of the buffer for `path` without saving it
    pub fn edit_buffer(&mut self, path: &Path, text: impl Into<String>) -> Result<()> {
        let index = self.buffer_index(path).ok_or_else(|| not_open(path))?;
        let buffer = &mut self.buffers[index];
        buffer.text = text.into();
        buffer.modified = true;
        Ok(())
    }

    /// Replace one 1-based line of the active buffer
    pub fn set_line(&mut self, line: u32, text: &str) -> Result<()> {
        let index = self.current.ok_or_else(|| Error::ConfigError {
            message: "no active buffer".to_string(),
        })?;
        let buffer = &mut self.buffers[index];

        let mut lines: Vec<&str> = buffer.text.lines().collect();
        let at = line.saturating_sub(1) as usize;
        while lines.len() <= at {
            lines.push("");
        }
        lines[at] = text;

        let mut updated = lines.join("\n");
        updated.push('\n');
        buffer.text = updated;
        buffer.modified = true;
        Ok(())
    }

    /// Write the active buffer back to disk
    pub fn save_current(&mut self) -> Result<()> {
        let Some(index) = self.current else {
            return Ok(());
        };
        let buffer = &mut self.buffers[index];
        std::fs::write(&buffer.path, &buffer.text).map_err(|e| Error::io(&buffer.path, e))?;
        buffer.modified = false;
        Ok(())
    }

    fn buffer_index(&self, path: &Path) -> Option<usize> {
        let path = canonical_path(path);
        self.buffers.iter().position(|b| b.path == path)
    }

    fn print(&mut self, message: impl AsRef<str>) {
        let _ = writeln!(self.out, "{}", message.as_ref());
        let _ = self.out.flush();
    }

    fn help(&mut self) {
        let mut keys: Vec<String> = self
            .keymap
            .iter()
            .map(|(key, action)| format!("{} {}", key, action))
            .collect();
        keys.sort();
        self.print("commands: open PATH | switch PATH | goto LINE COLUMN | set LINE TEXT | save | where | buffers | keys | quit");
        self.print(format!("keys: {}", keys.join(", ")));
    }
}

impl<W: Write> Host for TerminalHost<W> {
    fn current_file(&self) -> Option<PathBuf> {
        self.current.map(|i| self.buffers[i].path.clone())
    }

    fn current_position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    fn is_modified(&self, path: &Path) -> bool {
        self.buffer_index(path)
            .map(|i| self.buffers[i].modified)
            .unwrap_or(false)
    }

    fn buffer_content(&self, path: &Path) -> Option<String> {
        self.buffer_index(path).map(|i| self.buffers[i].text.clone())
    }

    fn open_buffers(&self) -> Vec<PathBuf> {
        self.buffers.iter().map(|b| b.path.clone()).collect()
    }

    fn open_file(&mut self, path: &Path) -> Result<()> {
        if let Some(index) = self.buffer_index(path) {
            self.current = Some(index);
        } else {
            let path = canonical_path(path);
            let text = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            self.buffers.push(Buffer {
                path,
                text,
                modified: false,
            });
            self.current = Some(self.buffers.len() - 1);
        }
        self.line = 1;
        self.column = 0;
        Ok(())
    }

    fn navigate_to_file(&mut self, path: &Path) -> Result<()> {
        let index = self.buffer_index(path).ok_or_else(|| not_open(path))?;
        self.current = Some(index);
        Ok(())
    }

    fn goto_position(&mut self, line: u32, column: u32) {
        self.line = line.max(1);
        self.column = column;
    }

    fn output_message(&mut self, message: &str) {
        self.print(message);
    }

    fn subscribe_key(&mut self, key: &str, action: Action) {
        self.keymap.insert(key.to_string(), action);
    }

    fn interpret(&mut self, input: &str) -> Result<Input> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Input::Handled);
        }
        if let Some(action) = self.keymap.get(input) {
            return Ok(Input::Action(*action));
        }

        let (command, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
        let rest = rest.trim();

        match command {
            "open" => {
                self.open_file(Path::new(rest))?;
                self.print(format!("opened {}", rest));
            }
            "switch" => self.navigate_to_file(Path::new(rest))?,
            "goto" => {
                let mut parts = rest.split_whitespace().map(str::parse::<u32>);
                match (parts.next(), parts.next()) {
                    (Some(Ok(line)), Some(Ok(column))) => self.goto_position(line, column),
                    _ => self.print("usage: goto LINE COLUMN"),
                }
            }
            "set" => {
                let (line, text) = rest.split_once(' ').unwrap_or((rest, ""));
                match line.parse::<u32>() {
                    Ok(line) => self.set_line(line, text)?,
                    Err(_) => self.print("usage: set LINE TEXT"),
                }
            }
            "save" => self.save_current()?,
            "where" => {
                let location = match self.current_file() {
                    Some(file) => format!("{}:{}:{}", file.display(), self.line, self.column),
                    None => "no active buffer".to_string(),
                };
                self.print(location);
            }
            "buffers" => {
                let listing: Vec<String> = self
                    .buffers
                    .iter()
                    .enumerate()
                    .map(|(i, b)| {
                        let marker = if Some(i) == self.current { '*' } else { ' ' };
                        let modified = if b.modified { " [modified]" } else { "" };
                        format!("{} {}{}", marker, b.path.display(), modified)
                    })
                    .collect();
                for line in listing {
                    self.print(line);
                }
            }
            "quit" | "exit" => return Ok(Input::Quit),
            other => match Action::from_name(other) {
                Some(action) => return Ok(Input::Action(action)),
                None => self.help(),
            },
        }
        Ok(Input::Handled)
    }
}

fn not_open(path: &Path) -> Error {
    Error::io(
        path,
        io::Error::new(io::ErrorKind::NotFound, "no open buffer for file"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_keys_and_commands() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.c");
        std::fs::write(&file, "int a;\nint b;\n").unwrap();

        let mut host = TerminalHost::new(Vec::new());
        host.subscribe_key("F12", Action::JumpToDefinition);

        assert_eq!(host.interpret("F12").unwrap(), Input::Action(Action::JumpToDefinition));
        assert_eq!(host.interpret("back").unwrap(), Input::Action(Action::GoBack));
        assert_eq!(host.interpret("quit").unwrap(), Input::Quit);

        host.interpret(&format!("open {}", file.display())).unwrap();
        host.interpret("goto 2 4").unwrap();
        assert_eq!(host.current_position(), (2, 4));
        assert_eq!(host.current_file(), Some(canonical_path(&file)));
    }

    #[test]
    fn test_edits_mark_buffer_modified() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.c");
        std::fs::write(&file, "int a;\nint b;\n").unwrap();

        let mut host = TerminalHost::new(Vec::new());
        host.open_file(&file).unwrap();
        assert!(!host.is_modified(&file));

        host.interpret("set 2 int c;").unwrap();
        assert!(host.is_modified(&file));
        assert_eq!(host.buffer_content(&file).unwrap(), "int a;\nint c;\n");

        host.interpret("save").unwrap();
        assert!(!host.is_modified(&file));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "int a;\nint c;\n");
    }

    #[test]
    fn test_navigate_requires_open_buffer() {
        let mut host = TerminalHost::new(Vec::new());
        assert!(host.navigate_to_file(Path::new("/nowhere/x.c")).is_err());
        assert!(host.open_buffers().is_empty());
    }
}
