//! Parser adapter
//!
//! Turns a C/C++ source file into a bound translation unit [`Ast`], applying
//! the harvested build defines and resolving includes against a search path
//! derived from the file's directory and the working directory.
//!
//! @module parse

mod ast;
mod languages;
mod lower;
mod preprocess;

pub use ast::{Ast, AstNode, CursorKind, Descendants, Diagnostic, Location, NodeId};
pub use languages::Language;
pub use preprocess::{IncludeResolver, IncludeSpec, MacroTable};

use crate::build::Defines;
use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use lower::Lowerer;

/// Parses translation units with a fixed working directory
#[derive(Debug, Clone)]
pub struct ParserAdapter {
    cwd: PathBuf,
}

impl ParserAdapter {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Parse `path` with the given defines and extra include directories
    pub fn parse(&self, path: &Path, defines: &Defines, include_dirs: &[PathBuf]) -> Result<Ast> {
        self.parse_as(path, path, defines, include_dirs)
    }

    /// Parse the file at `source_path`, attributing every location in it to
    /// `attributed_path`
    ///
    /// Used for unsaved buffers: the text is materialized to a temporary file
    /// but positions and include lookups behave as if it were the real file.
    pub fn parse_as(
        &self,
        source_path: &Path,
        attributed_path: &Path,
        defines: &Defines,
        include_dirs: &[PathBuf],
    ) -> Result<Ast> {
        let language = Language::from_path(attributed_path)
            .or_else(|| Language::from_path(source_path))
            .unwrap_or(Language::C);

        let source = std::fs::read(source_path).map_err(|e| Error::io(source_path, e))?;

        let resolver = IncludeResolver::new(self.search_paths(attributed_path, include_dirs));
        let macros = MacroTable::from_defines(defines);

        let ast = Lowerer::new(attributed_path, language, macros, &resolver)
            .lower_main(&source, attributed_path)?;

        for diagnostic in &ast.diagnostics {
            debug!(%diagnostic, "Parse diagnostic");
        }
        debug!(
            file = %attributed_path.display(),
            language = %language,
            flags = ?defines.flags(),
            "Parsed translation unit"
        );
        Ok(ast)
    }

    /// Include search order: the file's directory and its `include/`, then
    /// the working directory and its `include/`, then configured extras
    fn search_paths(&self, file: &Path, include_dirs: &[PathBuf]) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = file.parent() {
            paths.push(dir.to_path_buf());
            paths.push(dir.join("include"));
        }
        paths.push(self.cwd.clone());
        paths.push(self.cwd.join("include"));
        paths.extend(include_dirs.iter().cloned());
        paths.dedup();
        paths
    }
}
