//! Back/forward navigation history
//!
//! Two bounded LIFO stacks of host positions. Recording a jump clears
//! nothing: the forward stack only changes on back/forward moves.

use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::error::Result;
use crate::host::Host;
use crate::parse::Location;

/// A host position: 1-based line, 0-based column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEntry {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl NavigationEntry {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Where the host currently is, if it has an active buffer
    pub fn current(host: &dyn Host) -> Option<Self> {
        let file = host.current_file()?;
        let (line, column) = host.current_position();
        Some(Self::new(file, line, column))
    }
}

impl From<&Location> for NavigationEntry {
    /// Index locations use 1-based columns
    fn from(location: &Location) -> Self {
        Self::new(
            location.file.clone(),
            location.line,
            location.column.saturating_sub(1),
        )
    }
}

impl fmt::Display for NavigationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[derive(Debug)]
pub struct NavigationHistory {
    back: VecDeque<NavigationEntry>,
    forward: VecDeque<NavigationEntry>,
    max_depth: usize,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new(256)
    }
}

impl NavigationHistory {
    pub fn new(max_depth: usize) -> Self {
        Self {
            back: VecDeque::new(),
            forward: VecDeque::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Push `current` onto the back stack and move the host to `target`
    pub fn record_and_jump(
        &mut self,
        host: &mut dyn Host,
        current: NavigationEntry,
        target: &NavigationEntry,
    ) -> Result<()> {
        jump(host, target)?;
        push_bounded(&mut self.back, current, self.max_depth);
        Ok(())
    }

    /// Return to the previous position; no-op with an empty back stack
    pub fn go_back(&mut self, host: &mut dyn Host) -> Result<bool> {
        let Some(target) = self.back.pop_back() else {
            return Ok(false);
        };
        if let Some(current) = NavigationEntry::current(host) {
            push_bounded(&mut self.forward, current, self.max_depth);
        }
        debug!(%target, "Navigating back");
        jump(host, &target)?;
        Ok(true)
    }

    /// Undo a `go_back`; no-op with an empty forward stack
    pub fn go_forward(&mut self, host: &mut dyn Host) -> Result<bool> {
        let Some(target) = self.forward.pop_back() else {
            return Ok(false);
        };
        if let Some(current) = NavigationEntry::current(host) {
            push_bounded(&mut self.back, current, self.max_depth);
        }
        debug!(%target, "Navigating forward");
        jump(host, &target)?;
        Ok(true)
    }

    pub fn back_len(&self) -> usize {
        self.back.len()
    }

    pub fn forward_len(&self) -> usize {
        self.forward.len()
    }
}

fn push_bounded(stack: &mut VecDeque<NavigationEntry>, entry: NavigationEntry, max_depth: usize) {
    if stack.len() == max_depth {
        stack.pop_front();
    }
    stack.push_back(entry);
}

/// Move the host to `target`, opening or switching buffers as needed
pub fn jump(host: &mut dyn Host, target: &NavigationEntry) -> Result<()> {
    let current = host.current_file();
    if current.as_deref() != Some(target.file.as_path()) {
        if is_open(host, &target.file) {
            host.navigate_to_file(&target.file)?;
        } else {
            host.open_file(&target.file)?;
        }
    }
    host.goto_position(target.line, target.column);
    Ok(())
}

fn is_open(host: &dyn Host, file: &Path) -> bool {
    host.open_buffers().iter().any(|b| b == file)
}
