//! Per-file symbol tables: path -> line -> occurrences

use smallvec::SmallVec;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Occurrence;

/// An occurrence plus the translation units that contributed it
#[derive(Debug, Clone)]
pub(crate) struct Tagged {
    pub occurrence: Arc<Occurrence>,
    pub units: SmallVec<[PathBuf; 1]>,
}

impl Tagged {
    pub fn new(occurrence: Arc<Occurrence>, unit: &Path) -> Self {
        let mut units = SmallVec::new();
        units.push(unit.to_path_buf());
        Self { occurrence, units }
    }

    /// Tag with another contributing unit; false if already tagged
    pub fn add_unit(&mut self, unit: &Path) -> bool {
        if self.units.iter().any(|u| u == unit) {
            return false;
        }
        self.units.push(unit.to_path_buf());
        true
    }

    /// Drop the tag of `unit`; true when no contributor is left
    pub fn remove_unit(&mut self, unit: &Path) -> bool {
        self.units.retain(|u| u != unit);
        self.units.is_empty()
    }
}

/// Shared per-path line tables
///
/// Occurrences are filed under their own location's path, so a header's
/// symbols land under the header even when several units include it. The
/// same occurrence reached from two units is stored once with both tags.
#[derive(Debug, Default)]
pub struct SymbolTable {
    files: HashMap<PathBuf, HashMap<u32, Vec<Tagged>>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occurrence contributed by `unit`; false if it was already there
    pub fn insert(&mut self, occurrence: Arc<Occurrence>, unit: &Path) -> bool {
        let line = self
            .files
            .entry(occurrence.location.file.clone())
            .or_default()
            .entry(occurrence.location.line)
            .or_default();

        if let Some(existing) = line.iter_mut().find(|t| t.occurrence == occurrence) {
            return existing.add_unit(unit);
        }
        line.push(Tagged::new(occurrence, unit));
        true
    }

    /// Occurrences recorded on a line, in insertion order
    pub fn candidates(&self, file: &Path, line: u32) -> Vec<Arc<Occurrence>> {
        self.files
            .get(file)
            .and_then(|lines| lines.get(&line))
            .map(|entries| entries.iter().map(|t| t.occurrence.clone()).collect())
            .unwrap_or_default()
    }

    /// Remove everything `unit` contributed; returns the number of occurrences dropped
    pub fn purge_unit(&mut self, unit: &Path) -> usize {
        let mut removed = 0;
        for lines in self.files.values_mut() {
            for entries in lines.values_mut() {
                let before = entries.len();
                entries.retain_mut(|t| !t.remove_unit(unit));
                removed += before - entries.len();
            }
            lines.retain(|_, entries| !entries.is_empty());
        }
        self.files.retain(|_, lines| !lines.is_empty());
        removed
    }

    /// Number of occurrences filed under `file`
    pub fn file_len(&self, file: &Path) -> usize {
        self.files
            .get(file)
            .map(|lines| lines.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.files
            .values()
            .flat_map(|lines| lines.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
