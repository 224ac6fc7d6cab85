//! Build configuration harvesting
//!
//! Scans build description files (Makefiles by default) for `-D<name>`
//! flags. The result is one flat define set applied to every parse; there is
//! no per-target scoping.

use crate::core::config::BuildConfig;
use crate::core::error::{Error, Result};
use glob::Pattern;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

static DEFINE_FLAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-D(?P<define>[A-Za-z0-9_]+)").expect("valid define regex"));

/// Flat, deduplicated set of preprocessor defines in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defines {
    names: Vec<String>,
}

impl Defines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.names.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    /// Compiler-style `-D` flags, one per define
    pub fn flags(&self) -> Vec<String> {
        self.names.iter().map(|n| format!("-D{}", n)).collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Defines {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut defines = Defines::new();
        for name in iter {
            defines.insert(name);
        }
        defines
    }
}

/// Extract every `-D<name>` token from build file text
pub fn extract_defines(text: &str) -> Vec<String> {
    DEFINE_FLAG
        .captures_iter(text)
        .filter_map(|caps| caps.name("define").map(|m| m.as_str().to_string()))
        .collect()
}

/// Locate build description files under `root` whose name matches a pattern
pub fn find_build_files(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let compiled: Vec<Pattern> = patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| Error::ConfigError {
                message: format!("invalid build file pattern '{}': {}", p, e),
            })
        })
        .collect::<Result<_>>()?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git")
        .flatten()
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if compiled.iter().any(|p| p.matches(&name)) {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

/// Harvest the global define set for a project
///
/// Unreadable build files are skipped with a warning; `extra_defines` from the
/// configuration are appended after the harvested ones.
pub fn harvest(root: &Path, config: &BuildConfig) -> Result<Defines> {
    let build_files = find_build_files(root, &config.patterns)?;
    let mut defines = Defines::new();
    let mut seen_files = HashSet::new();

    for file in &build_files {
        if !seen_files.insert(file.clone()) {
            continue;
        }
        match std::fs::read_to_string(file) {
            Ok(text) => {
                let found = extract_defines(&text);
                debug!(file = %file.display(), count = found.len(), "Scanned build file");
                for name in found {
                    defines.insert(name);
                }
            }
            Err(e) => warn!(file = %file.display(), error = %e, "Could not read build file"),
        }
    }

    for extra in &config.extra_defines {
        defines.insert(extra.clone());
    }

    info!(
        build_files = build_files.len(),
        defines = defines.len(),
        "Harvested build defines"
    );
    Ok(defines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extract_defines() {
        let text = "CFLAGS += -DDEBUG -O2 -DHAVE_CONFIG_H\nCPPFLAGS=-DVERSION_2 -I include";
        assert_eq!(
            extract_defines(text),
            vec!["DEBUG", "HAVE_CONFIG_H", "VERSION_2"]
        );
    }

    #[test]
    fn test_defines_dedup_preserves_order() {
        let defines: Defines = ["B", "A", "B", "C", "A"].into_iter().collect();
        assert_eq!(defines.iter().collect::<Vec<_>>(), vec!["B", "A", "C"]);
        assert_eq!(defines.flags(), vec!["-DB", "-DA", "-DC"]);
    }

    #[test]
    fn test_harvest_unions_across_makefiles() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("lib")).unwrap();
        std::fs::write(root.join("Makefile"), "CFLAGS=-DUSE_SSL -DDEBUG\n").unwrap();
        std::fs::write(root.join("lib/GNUmakefile"), "ignored=-DNOPE\n").unwrap();
        std::fs::write(root.join("lib/sub.Makefile"), "CFLAGS=-DDEBUG -DLIB\n").unwrap();
        std::fs::write(root.join("notes.txt"), "-DNOT_A_BUILD_FILE\n").unwrap();

        let mut config = BuildConfig::default();
        config.extra_defines = vec!["EXTRA".to_string()];
        let defines = harvest(root, &config).unwrap();

        assert!(defines.contains("USE_SSL"));
        assert!(defines.contains("DEBUG"));
        assert!(defines.contains("LIB"));
        assert!(defines.contains("EXTRA"));
        assert!(!defines.contains("NOPE"), "GNUmakefile does not end with Makefile");
        assert!(!defines.contains("NOT_A_BUILD_FILE"));
        assert_eq!(defines.len(), 4);
    }
}
