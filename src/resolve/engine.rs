//! Engine: owns the inventory, build defines, parser and index
//!
//! Everything that mutates the index goes through here: indexing a file from
//! disk, reindexing an unsaved buffer, and the change detector that decides
//! which of the two (if any) a file needs.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::build::{self, Defines};
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::host::Host;
use crate::index::{FileDelta, MergeStats, SymbolIndex};
use crate::inventory::{canonical_path, Fingerprint, Inventory};
use crate::parse::{Ast, ParserAdapter};
use tempfile::NamedTempFile;

/// A parsed translation unit
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
    pub ast: Ast,
}

pub struct Engine {
    pub(super) root: PathBuf,
    pub(super) config: Config,
    pub(super) inventory: Inventory,
    pub(super) defines: Defines,
    pub(super) parser: ParserAdapter,
    pub(super) index: SymbolIndex,
    pub(super) units: HashMap<PathBuf, SourceFile>,
}

impl Engine {
    /// Startup: discover and fingerprint sources, harvest build defines
    ///
    /// The project root doubles as the parser's working directory.
    pub fn open(root: &Path, config: Config) -> Result<Self> {
        let root = canonical_path(root);
        let inventory = Inventory::scan(&root, &config.sources)?;
        let defines = build::harvest(&root, &config.build)?;
        let parser = ParserAdapter::new(root.clone());

        info!(
            root = %root.display(),
            files = inventory.len(),
            defines = defines.len(),
            "Engine ready"
        );

        Ok(Self {
            root,
            config,
            inventory,
            defines,
            parser,
            index: SymbolIndex::new(),
            units: HashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn defines(&self) -> &Defines {
        &self.defines
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    /// Parsed state of a unit, if it has been indexed
    pub fn unit(&self, path: &Path) -> Option<&SourceFile> {
        self.units.get(&canonical_path(path))
    }

    pub fn is_indexed(&self, path: &Path) -> bool {
        self.units.contains_key(&canonical_path(path))
    }

    /// Parse `path` from disk and merge it into the index
    pub fn index_file(&mut self, path: &Path) -> Result<MergeStats> {
        let path = canonical_path(path);
        let content = std::fs::read(&path).map_err(|e| Error::io(&path, e))?;
        let ast = self
            .parser
            .parse(&path, &self.defines, &self.config.build.include_dirs)?;
        Ok(self.install(path, &content, ast))
    }

    /// Parse unsaved buffer text for `path` and merge it into the index
    ///
    /// The text goes to a temporary file with the same extension so the
    /// right grammar is picked; locations and include lookups still use `path`.
    pub fn reindex_buffer(&mut self, path: &Path, content: &str) -> Result<MergeStats> {
        let path = canonical_path(path);
        let scratch = write_scratch(&std::env::temp_dir(), &path, content)?;

        let ast = self.parser.parse_as(
            scratch.path(),
            &path,
            &self.defines,
            &self.config.build.include_dirs,
        )?;
        debug!(file = %path.display(), scratch = %scratch.path().display(), "Reparsed buffer");
        Ok(self.install(path, content.as_bytes(), ast))
    }

    fn install(&mut self, path: PathBuf, content: &[u8], ast: Ast) -> MergeStats {
        let fingerprint = self.inventory.register(&path, content);
        let delta = FileDelta::build(&ast, &path);
        let stats = self.index.merge(delta, self.config.index.purge_on_reparse);
        self.units.insert(
            path.clone(),
            SourceFile {
                path,
                fingerprint,
                ast,
            },
        );
        stats
    }

    /// Bring the index up to date with the host's view of `path`
    ///
    /// Modified buffers are reparsed only when their fingerprint changed;
    /// files never parsed are parsed from disk. Returns true if a parse ran.
    pub fn refresh(&mut self, host: &dyn Host, path: &Path) -> Result<bool> {
        let path = canonical_path(path);

        if host.is_modified(&path) {
            if let Some(content) = host.buffer_content(&path) {
                if self.inventory.is_stale(&path, content.as_bytes()) || !self.units.contains_key(&path) {
                    self.reindex_buffer(&path, &content)?;
                    return Ok(true);
                }
                debug!(file = %path.display(), "Buffer unchanged since last parse");
                return Ok(false);
            }
        }

        if !self.units.contains_key(&path) {
            self.index_file(&path)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Write buffer text to a temporary file in `dir` that keeps `path`'s extension
fn write_scratch(dir: &Path, path: &Path, content: &str) -> Result<NamedTempFile> {
    let suffix = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut scratch = tempfile::Builder::new()
        .prefix(".cjump-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .map_err(|e| Error::io(dir, e))?;
    if let Err(e) = scratch.write_all(content.as_bytes()).and_then(|()| scratch.flush()) {
        return Err(Error::io(scratch.path(), e));
    }
    Ok(scratch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scratch_keeps_extension() {
        let temp = TempDir::new().unwrap();
        let scratch = write_scratch(temp.path(), Path::new("/src/widget.cpp"), "int w;\n").unwrap();

        assert_eq!(scratch.path().extension().unwrap(), "cpp");
        assert_eq!(std::fs::read_to_string(scratch.path()).unwrap(), "int w;\n");
    }

    #[test]
    fn test_scratch_failure_names_the_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("no-such-dir");

        match write_scratch(&missing, Path::new("a.c"), "int a;\n") {
            Err(Error::IoFailure { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
