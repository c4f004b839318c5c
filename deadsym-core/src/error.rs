//! Typed error handling for deadsym.
//!
//! Extraction and cache failures are expressed as [`DeadsymError`] so that the
//! analyzer can decide, per file, whether to degrade to an empty result. None
//! of these errors ever reach the caller of [`crate::Engine::analyze`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for deadsym operations.
#[derive(Error, Debug)]
pub enum DeadsymError {
    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Source could not be parsed structurally
    #[error("Parse error in {file}: {message}")]
    Parse {
        file: String,
        message: String,
        /// Line number (1-indexed) if available
        line: Option<usize>,
        /// Column number (1-indexed) if available
        column: Option<usize>,
    },

    /// Cache-related errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DeadsymError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a parse error without location.
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a parse error with line/column info.
    pub fn parse_at(
        file: impl Into<String>,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (analysis of other files continues).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::Cache { .. } | Self::Config { .. }
        )
    }

    /// Get the file associated with this error, if any.
    pub fn file(&self) -> Option<String> {
        match self {
            Self::Io { path, .. } | Self::Config { path, .. } => {
                Some(path.display().to_string())
            }
            Self::Parse { file, .. } => Some(file.clone()),
            _ => None,
        }
    }
}

/// Convenience type alias for deadsym results.
pub type DeadsymResult<T> = Result<T, DeadsymError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DeadsymResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DeadsymResult<T> {
        self.map_err(|e| DeadsymError::io(path, e))
    }
}
