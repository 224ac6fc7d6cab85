use crate::core::config::SourcesConfig;
use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks a source tree collecting recognized C/C++ files
pub struct FileWalker<'a> {
    root: PathBuf,
    config: &'a SourcesConfig,
}

impl<'a> FileWalker<'a> {
    pub fn new(root: &Path, config: &'a SourcesConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    /// Walk all recognized source files, sorted by file name within each directory
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(Error::io(
                &self.root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            // Only directories are descended, everything else must match
            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();

            // Skip files that are too large
            if let Ok(meta) = entry.metadata() {
                if meta.len() > self.config.max_file_size {
                    continue;
                }
            }

            if self.is_source_file(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Check if a file carries a recognized source extension
    pub fn is_source_file(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.config
            .extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    }

    fn is_excluded_dir(&self, entry: &walkdir::DirEntry) -> bool {
        // Never exclude the root itself
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        self.config.exclude_dirs.iter().any(|d| d.as_str() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_walk_filters_and_descends() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("src/net")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("main.c"), "int main(void) { return 0; }").unwrap();
        std::fs::write(root.join("README.md"), "# readme").unwrap();
        std::fs::write(root.join("src/util.h"), "int util(void);").unwrap();
        std::fs::write(root.join("src/net/sock.cpp"), "int sock() { return 1; }").unwrap();
        std::fs::write(root.join(".git/hook.c"), "int hook;").unwrap();

        let config = SourcesConfig::default();
        let files = FileWalker::new(root, &config).walk().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect();

        assert!(names.contains(&"main.c".to_string()));
        assert!(names.contains(&"src/util.h".to_string()));
        assert!(names.contains(&"src/net/sock.cpp".to_string()));
        assert!(!names.iter().any(|n| n.ends_with(".md")));
        assert!(!names.iter().any(|n| n.starts_with(".git")));
    }

    #[test]
    fn test_walk_missing_root() {
        let config = SourcesConfig::default();
        let result = FileWalker::new(Path::new("/definitely/not/here"), &config).walk();
        assert!(result.is_err());
    }
}
