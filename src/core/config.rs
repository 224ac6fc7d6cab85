//! Configuration management

use crate::core::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-local configuration file name
pub const PROJECT_CONFIG_FILE: &str = ".cjump.toml";

/// Global configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub build: BuildConfig,
    pub index: IndexConfig,
    pub refresh: RefreshConfig,
    pub history: HistoryConfig,
    pub keys: KeysConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Recognized source extensions (without the dot)
    pub extensions: Vec<String>,
    /// Directory names never descended during discovery
    pub exclude_dirs: Vec<String>,
    /// Maximum file size to inventory (bytes)
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// File name patterns identifying build description files
    pub patterns: Vec<String>,
    /// Defines added on top of the harvested ones
    pub extra_defines: Vec<String>,
    /// Extra include search directories
    pub include_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Drop a translation unit's previous contributions before re-merging it
    pub purge_on_reparse: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Periodically reparse modified open buffers
    pub enabled: bool,
    /// Refresh interval in seconds
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum entries kept per stack
    pub max_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    pub jump: String,
    pub back: String,
    pub forward: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Error log path, relative paths resolve against the project root
    pub error_log: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            extensions: ["c", "cpp", "cc", "cxx", "h", "hpp", "hh", "hxx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exclude_dirs: vec![".git".to_string()],
            max_file_size: 4 * 1_048_576, // 4MB
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["*Makefile".to_string()],
            extra_defines: vec![],
            include_dirs: vec![],
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            purge_on_reparse: true,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 10,
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            jump: "F12".to_string(),
            back: "M--".to_string(),
            forward: "M-=".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            error_log: PathBuf::from("nano.err"),
        }
    }
}

impl Config {
    /// Load configuration for a project root
    ///
    /// Looks for `.cjump.toml` in the root first, then the user config file.
    pub fn load(root: &Path) -> Result<Self> {
        let local = root.join(PROJECT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }

        let global = Self::config_path()?;
        if global.exists() {
            return Self::from_file(&global);
        }

        Ok(Config::default())
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sources.extensions.is_empty() {
            return Err(Error::ConfigError {
                message: "sources.extensions must not be empty".to_string(),
            });
        }
        if self.refresh.enabled && self.refresh.interval_secs == 0 {
            return Err(Error::ConfigError {
                message: "refresh.interval_secs must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Get the user configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::cjump_home()?.join("config.toml"))
    }

    /// Get the cjump home directory
    pub fn cjump_home() -> Result<PathBuf> {
        // Check CJUMP_HOME env var first
        if let Ok(home) = std::env::var("CJUMP_HOME") {
            return Ok(PathBuf::from(home));
        }

        // Use XDG directories
        ProjectDirs::from("dev", "cjump", "cjump")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| Error::ConfigError {
                message: "Could not determine cjump home directory".to_string(),
            })
    }

    /// Resolve the error log path against a project root
    pub fn error_log_path(&self, root: &Path) -> PathBuf {
        if self.log.error_log.is_absolute() {
            self.log.error_log.clone()
        } else {
            root.join(&self.log.error_log)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.sources.extensions.iter().any(|e| e == "c"));
        assert!(config.index.purge_on_reparse);
        assert!(!config.refresh.enabled);
        assert_eq!(config.keys.jump, "F12");
        assert_eq!(config.keys.back, "M--");
        assert_eq!(config.keys.forward, "M-=");
    }

    #[test]
    fn test_project_config_overrides() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "[build]\nextra_defines = [\"DEBUG\"]\n\n[refresh]\nenabled = true\ninterval_secs = 3\n",
        )
        .unwrap();

        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.build.extra_defines, vec!["DEBUG".to_string()]);
        assert!(config.refresh.enabled);
        assert_eq!(config.refresh.interval_secs, 3);
        // Untouched sections keep their defaults
        assert_eq!(config.keys.jump, "F12");
    }

    #[test]
    fn test_rejects_zero_interval() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(PROJECT_CONFIG_FILE);
        std::fs::write(&path, "[refresh]\nenabled = true\ninterval_secs = 0\n").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(Error::ConfigError { .. })
        ));
    }

    #[test]
    fn test_error_log_path() {
        let config = Config::default();
        assert_eq!(
            config.error_log_path(Path::new("/proj")),
            PathBuf::from("/proj/nano.err")
        );
    }
}
