//! Symbol index
//!
//! Shared lookup tables built from translation unit ASTs:
//! - [`SymbolTable`]: path -> line -> occurrences, for cursor lookups
//! - [`DeclarationIndex`]: name -> preferred declaration
//!
//! Units are folded in through [`FileDelta`]s. With purging enabled a unit's
//! earlier contributions are removed before its new delta is merged, so a
//! reparse never leaves stale positions behind.

mod declarations;
mod delta;
mod occurrence;
mod symbols;

pub use declarations::{DeclarationIndex, Offer};
pub use delta::FileDelta;
pub use occurrence::Occurrence;
pub use symbols::SymbolTable;

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Counts reported by a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub occurrences: usize,
    pub declarations: usize,
    /// Names seen for the first time
    pub inserted: usize,
    /// Names whose preferred declaration gained a body
    pub replaced: usize,
    pub purged: usize,
}

#[derive(Debug, Default)]
pub struct SymbolIndex {
    symbols: SymbolTable,
    declarations: DeclarationIndex,
    units: HashSet<PathBuf>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a delta into the shared tables
    ///
    /// When `purge` is set, whatever the delta's unit contributed before is
    /// removed first.
    pub fn merge(&mut self, delta: FileDelta, purge: bool) -> MergeStats {
        let unit = delta.unit().to_path_buf();
        let mut stats = MergeStats::default();

        if purge && self.units.contains(&unit) {
            stats.purged = self.purge_unit(&unit);
        }

        for occurrence in delta.occurrences() {
            if self.symbols.insert(occurrence.clone(), &unit) {
                stats.occurrences += 1;
            }
        }
        for declaration in delta.declarations() {
            match self.declarations.offer(declaration.clone(), &unit) {
                Offer::Inserted => stats.inserted += 1,
                Offer::Replaced => stats.replaced += 1,
                Offer::Kept => {}
            }
            stats.declarations += 1;
        }
        self.units.insert(unit.clone());

        debug!(
            unit = %unit.display(),
            occurrences = stats.occurrences,
            declarations = stats.declarations,
            inserted = stats.inserted,
            replaced = stats.replaced,
            purged = stats.purged,
            "Merged delta"
        );
        stats
    }

    /// Remove every contribution of `unit`; returns the number of entries dropped
    pub fn purge_unit(&mut self, unit: &Path) -> usize {
        let removed = self.symbols.purge_unit(unit) + self.declarations.purge_unit(unit);
        self.units.remove(unit);
        removed
    }

    /// Occurrences on `line` of `file`
    pub fn candidates(&self, file: &Path, line: u32) -> Vec<Arc<Occurrence>> {
        self.symbols.candidates(file, line)
    }

    /// Preferred declaration for `name`
    pub fn declaration(&self, name: &str) -> Option<&Arc<Occurrence>> {
        self.declarations.get(name)
    }

    pub fn knows_name(&self, name: &str) -> bool {
        self.declarations.contains(name)
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn declarations(&self) -> &DeclarationIndex {
        &self.declarations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Defines;
    use crate::parse::{CursorKind, ParserAdapter};
    use tempfile::TempDir;

    fn delta_for(dir: &TempDir, name: &str, code: &str) -> FileDelta {
        let path = dir.path().join(name);
        std::fs::write(&path, code).unwrap();
        let ast = ParserAdapter::new(dir.path())
            .parse(&path, &Defines::new(), &[])
            .unwrap();
        FileDelta::build(&ast, &path)
    }

    #[test]
    fn test_delta_groups_by_line_and_prefers_bodies() {
        let temp = TempDir::new().unwrap();
        let delta = delta_for(
            &temp,
            "a.c",
            "int foo(void);\nint foo(void) { return 0; }\nint bar(void) { return foo(); }\n",
        );

        let best = delta.preferred("foo").unwrap();
        assert!(best.has_body);
        assert_eq!(best.location.line, 2);
        assert_eq!(delta.declarations().len(), 3);

        let call = delta
            .occurrences()
            .find(|o| o.kind == CursorKind::CallExpr)
            .unwrap();
        // Bound to the most recent declaration before the call
        assert_eq!(call.referenced.as_ref().unwrap().location.line, 2);
    }

    #[test]
    fn test_merge_then_purge_on_reparse() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.c");
        let mut index = SymbolIndex::new();

        index.merge(delta_for(&temp, "a.c", "int old_name;\n"), true);
        assert!(index.knows_name("old_name"));
        assert_eq!(index.candidates(&path, 1).len(), 1);

        let stats = index.merge(delta_for(&temp, "a.c", "\n\nint new_name;\n"), true);
        assert!(stats.purged > 0);
        assert!(!index.knows_name("old_name"));
        assert!(index.candidates(&path, 1).is_empty());
        assert_eq!(index.candidates(&path, 3)[0].spelling, "new_name");
    }

    #[test]
    fn test_merge_counts_body_upgrades() {
        let temp = TempDir::new().unwrap();
        let mut index = SymbolIndex::new();

        let header = index.merge(delta_for(&temp, "user.c", "int f(void);\nint h(void);\n"), true);
        assert_eq!((header.inserted, header.replaced), (2, 0));

        let body = index.merge(delta_for(&temp, "impl.c", "int f(void) { return 1; }\n"), true);
        assert_eq!((body.inserted, body.replaced), (0, 1));
        assert!(index.declaration("f").unwrap().has_body);
    }

    #[test]
    fn test_merge_without_purge_accumulates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.c");
        let mut index = SymbolIndex::new();

        index.merge(delta_for(&temp, "a.c", "int old_name;\n"), false);
        index.merge(delta_for(&temp, "a.c", "int new_name;\n"), false);

        assert!(index.knows_name("old_name"));
        assert!(index.knows_name("new_name"));
        assert_eq!(index.candidates(&path, 1).len(), 2);
    }

    #[test]
    fn test_body_never_replaced_by_prototype_across_units() {
        let temp = TempDir::new().unwrap();
        let mut index = SymbolIndex::new();

        let first = index.merge(delta_for(&temp, "impl.c", "int f(void) { return 1; }\n"), true);
        assert_eq!(first.inserted, 1);
        let second =
            index.merge(delta_for(&temp, "user.c", "int f(void);\nint g(void) { return f(); }\n"), true);
        // `g` is new, `f` keeps the body from impl.c
        assert_eq!((second.inserted, second.replaced), (1, 0));

        let best = index.declaration("f").unwrap();
        assert!(best.has_body);
        assert!(best.location.file.ends_with("impl.c"));
    }
}
