//! Error types for cjump

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using cjump's Error
pub type Result<T> = std::result::Result<T, Error>;

/// cjump error types
#[derive(Error, Debug)]
pub enum Error {
    /// The frontend produced no tree at all for a file
    #[error("Parse failure in {path}: {message}")]
    ParseFailure { path: PathBuf, message: String },

    #[error("No symbol at {path}:{line}:{column}")]
    SymbolNotFound {
        path: PathBuf,
        line: u32,
        column: u32,
    },

    #[error("No definition found for '{name}' under {scope}")]
    DeclarationUnresolved { name: String, scope: PathBuf },

    #[error("IO error on {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Wrap an IO error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }

    /// Expected failures are reported to the user without touching the error log
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::SymbolNotFound { .. } | Self::DeclarationUnresolved { .. }
        )
    }
}
