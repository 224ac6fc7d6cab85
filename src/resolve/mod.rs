//! Definition resolver
//!
//! Cursor position -> occurrence -> cross-reference -> declaration. When the
//! declaration found is a function prototype, sibling files under the
//! queried file's directory are indexed until a body turns up.
//!
//! @module resolve

mod engine;

pub use engine::{Engine, SourceFile};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::error::{Error, Result};
use crate::host::Host;
use crate::index::Occurrence;
use crate::inventory::canonical_path;
use crate::parse::{CursorKind, Location};

/// Outcome of a successful resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub symbol: String,
    pub kind: CursorKind,
    /// Where the symbol under the cursor is
    pub origin: Location,
    /// Where it is defined
    pub target: Location,
    /// The cursor was already on the declaration, nothing to jump to
    pub is_self: bool,
}

impl Resolution {
    fn new(occurrence: &Occurrence, target: Location) -> Self {
        let is_self = target == occurrence.location;
        Self {
            symbol: occurrence.spelling.to_string(),
            kind: occurrence.kind,
            origin: occurrence.location.clone(),
            target,
            is_self,
        }
    }
}

impl Engine {
    /// Resolve the symbol at `line` (1-based) and host `column` (0-based)
    pub fn resolve(&mut self, host: &dyn Host, file: &Path, line: u32, column: u32) -> Result<Resolution> {
        let file = canonical_path(file);
        self.refresh(host, &file)?;

        let occurrence = self.occurrence_at(&file, line, column)?;
        debug!(
            symbol = %occurrence.spelling,
            kind = %occurrence.kind,
            location = %occurrence.location,
            "Symbol under cursor"
        );

        if occurrence.is_declaration() || !self.index.knows_name(&occurrence.spelling) {
            return Ok(Resolution::new(&occurrence, occurrence.location.clone()));
        }

        let declaration = match &occurrence.referenced {
            Some(declaration) => declaration.clone(),
            None => match self.index.declaration(&occurrence.spelling) {
                Some(declaration) => declaration.clone(),
                None => return Ok(Resolution::new(&occurrence, occurrence.location.clone())),
            },
        };

        let target = if declaration.kind.is_function() && !declaration.has_body {
            self.find_definition(&file, &declaration.spelling)?
        } else {
            declaration
        };

        Ok(Resolution::new(&occurrence, target.location.clone()))
    }

    /// The occurrence covering a cursor position
    ///
    /// Among the occurrences on the line, the one starting furthest right at
    /// or before the cursor wins. Ties keep insertion order.
    pub fn occurrence_at(&self, file: &Path, line: u32, column: u32) -> Result<Arc<Occurrence>> {
        let not_found = || Error::SymbolNotFound {
            path: file.to_path_buf(),
            line,
            column,
        };

        let mut candidates = self.index.candidates(file, line);
        if candidates.is_empty() {
            return Err(not_found());
        }

        candidates.sort_by(|a, b| b.location.column.cmp(&a.location.column));
        candidates
            .into_iter()
            .find(|c| c.location.column <= column + 1)
            .ok_or_else(not_found)
    }

    /// Index files under `file`'s directory until `name` has a body
    ///
    /// Files are taken in inventory order; units already indexed are not
    /// parsed again, and the index is consulted before every parse.
    pub fn find_definition(&mut self, file: &Path, name: &str) -> Result<Arc<Occurrence>> {
        let scope = file.parent().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());

        if let Some(found) = self.defined(name) {
            return Ok(found);
        }

        let siblings: Vec<PathBuf> = self.inventory.files_under(&scope).cloned().collect();
        let mut parsed = 0usize;
        for sibling in siblings {
            if self.units.contains_key(&sibling) {
                continue;
            }
            match self.index_file(&sibling) {
                Ok(_) => parsed += 1,
                // One unreadable sibling should not end the search
                Err(e) => {
                    debug!(file = %sibling.display(), error = %e, "Skipping file during fallback");
                    continue;
                }
            }
            if let Some(found) = self.defined(name) {
                info!(
                    symbol = name,
                    file = %sibling.display(),
                    parsed,
                    "Found definition by fallback search"
                );
                return Ok(found);
            }
        }

        Err(Error::DeclarationUnresolved {
            name: name.to_string(),
            scope,
        })
    }

    fn defined(&self, name: &str) -> Option<Arc<Occurrence>> {
        self.index
            .declaration(name)
            .filter(|d| d.has_body)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::host::TerminalHost;
    use tempfile::TempDir;

    fn engine_with(files: &[(&str, &str)]) -> (TempDir, Engine) {
        let temp = TempDir::new().unwrap();
        for (name, content) in files {
            let path = temp.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
        let engine = Engine::open(temp.path(), Config::default()).unwrap();
        (temp, engine)
    }

    #[test]
    fn test_column_selection_prefers_rightmost_start() {
        let (temp, mut engine) = engine_with(&[("a.c", "int aa; int bb;\n")]);
        let file = temp.path().join("a.c");
        engine.index_file(&file).unwrap();
        let file = canonical_path(&file);

        // "aa" starts at column 5, "bb" at column 13 (1-based)
        assert_eq!(engine.occurrence_at(&file, 1, 4).unwrap().spelling, "aa");
        assert_eq!(engine.occurrence_at(&file, 1, 11).unwrap().spelling, "aa");
        assert_eq!(engine.occurrence_at(&file, 1, 12).unwrap().spelling, "bb");
        assert!(matches!(
            engine.occurrence_at(&file, 1, 0),
            Err(Error::SymbolNotFound { .. })
        ));
        assert!(matches!(
            engine.occurrence_at(&file, 5, 0),
            Err(Error::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn test_declaration_resolves_to_itself() {
        let (temp, mut engine) = engine_with(&[("a.c", "int counter;\n")]);
        let host = TerminalHost::new(Vec::new());

        let resolution = engine
            .resolve(&host, &temp.path().join("a.c"), 1, 4)
            .unwrap();
        assert!(resolution.is_self);
        assert_eq!(resolution.symbol, "counter");
        assert_eq!(resolution.target.line, 1);
    }

    #[test]
    fn test_unresolved_prototype_reports_scope() {
        let (temp, mut engine) = engine_with(&[(
            "a.c",
            "int missing(void);\nint main(void) { return missing(); }\n",
        )]);
        let host = TerminalHost::new(Vec::new());

        let err = engine
            .resolve(&host, &temp.path().join("a.c"), 2, 24)
            .unwrap_err();
        assert!(matches!(err, Error::DeclarationUnresolved { ref name, .. } if name == "missing"));
        assert!(err.is_expected());
    }
}
