//! Append-only plain-text error log

use chrono::Local;
use std::error::Error as StdError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped entry with the full source chain
    pub fn append(&self, context: &str, error: &Error) -> Result<()> {
        let mut entry = format!(
            "[{}] {}: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            context,
            error
        );
        let mut source = error.source();
        while let Some(cause) = source {
            entry.push_str(&format!("\n    caused by: {}", cause));
            source = cause.source();
        }
        entry.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        file.write_all(entry.as_bytes())
            .map_err(|e| Error::io(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_entries_are_appended() {
        let temp = TempDir::new().unwrap();
        let log = ErrorLog::new(temp.path().join("nano.err"));

        let first = Error::io(
            "/p/a.c",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        log.append("jump", &first).unwrap();
        log.append("refresh", &Error::ConfigError { message: "bad".into() })
            .unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        let entries: Vec<_> = text.lines().filter(|l| l.starts_with('[')).collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].contains("jump: IO error on /p/a.c"));
        assert!(text.contains("caused by: denied"));
        assert!(entries[1].contains("refresh: Configuration error: bad"));
    }
}
