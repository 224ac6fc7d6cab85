//! Source inventory and change detection
//!
//! Tracks every recognized source file under the project root together with
//! a SHA-256 fingerprint of its last indexed content. The fingerprint is what
//! decides whether a modified buffer actually needs a reparse.

mod walker;

pub use walker::FileWalker;

use crate::core::config::SourcesConfig;
use crate::core::error::Result;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

// =============================================================================
// FINGERPRINT
// =============================================================================

/// SHA-256 digest of a file's raw bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(content: &[u8]) -> Self {
        Self(Sha256::digest(content).into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &hex::encode(self.0)[..12])
    }
}

// =============================================================================
// PATHS
// =============================================================================

/// Canonical form used as the key of every per-file table
///
/// Falls back to a lexically normalized absolute path when the file does not
/// exist (yet) on disk.
pub fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

// =============================================================================
// INVENTORY
// =============================================================================

/// Known source files in discovery order plus their fingerprints
#[derive(Debug, Default)]
pub struct Inventory {
    files: Vec<PathBuf>,
    fingerprints: HashMap<PathBuf, Fingerprint>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recursively enumerate recognized source files under `root`
    pub fn discover(root: &Path, config: &SourcesConfig) -> Result<Vec<PathBuf>> {
        let files = FileWalker::new(root, config).walk()?;
        Ok(files.iter().map(|p| canonical_path(p)).collect())
    }

    /// Discover and fingerprint every source file under `root`
    pub fn scan(root: &Path, config: &SourcesConfig) -> Result<Self> {
        let files = Self::discover(root, config)?;
        let mut inventory = Self::new();
        inventory.files = files;
        inventory.fingerprint_all();
        info!(
            root = %root.display(),
            files = inventory.files.len(),
            "Source inventory ready"
        );
        Ok(inventory)
    }

    /// Fingerprint every known file from disk
    ///
    /// Unreadable files stay in the inventory without a fingerprint, so they
    /// always count as stale.
    pub fn fingerprint_all(&mut self) {
        let hashed: Vec<(PathBuf, Fingerprint)> = self
            .files
            .par_iter()
            .filter_map(|path| match std::fs::read(path) {
                Ok(bytes) => Some((path.clone(), Fingerprint::of(&bytes))),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not fingerprint file");
                    None
                }
            })
            .collect();

        self.fingerprints.extend(hashed);
    }

    /// Store the fingerprint of `content` for `path`
    pub fn register(&mut self, path: &Path, content: &[u8]) -> Fingerprint {
        let fingerprint = Fingerprint::of(content);
        if !self.fingerprints.contains_key(path) && !self.files.iter().any(|f| f == path) {
            debug!(path = %path.display(), "Registering file outside the discovered set");
            self.files.push(path.to_path_buf());
        }
        self.fingerprints.insert(path.to_path_buf(), fingerprint);
        fingerprint
    }

    /// True iff `new_content` differs from the stored fingerprint, or none is stored
    pub fn is_stale(&self, path: &Path, new_content: &[u8]) -> bool {
        match self.fingerprints.get(path) {
            Some(known) => *known != Fingerprint::of(new_content),
            None => true,
        }
    }

    pub fn fingerprint(&self, path: &Path) -> Option<&Fingerprint> {
        self.fingerprints.get(path)
    }

    /// All known files in inventory order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Known files inside `dir` or any of its subdirectories, in inventory order
    pub fn files_under<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = &'a PathBuf> + 'a {
        self.files
            .iter()
            .filter(move |f| f.parent().map(|p| p.starts_with(dir)).unwrap_or(false))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
