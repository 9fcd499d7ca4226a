//! Error types for logsift.
//!
//! Fatal errors (`UnknownCategory`, `DirectoryNotFound`, `DirectoryRead`,
//! `EmptyQuery`, `InvalidPattern`, `ConfigError`) abort a search before any
//! log file is opened. Per-file errors (`FileRead`, `Encoding`) are isolated
//! by the scan engine: they are recorded against the file and the scan moves
//! on.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Unknown category '{token}' (expected one of: {})", .known.join(", "))]
    UnknownCategory { token: String, known: Vec<String> },
    #[error("Directory '{}' does not exist", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("Error reading directory '{}': {source}", .path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No keywords to search for")]
    EmptyQuery,
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Error reading file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid UTF-8 in file '{}' at line {line}", .path.display())]
    Encoding { path: PathBuf, line: usize },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SearchError {
    pub fn unknown_category<I, S>(token: impl Into<String>, known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::UnknownCategory {
            token: token.into(),
            known: known.into_iter().map(Into::into).collect(),
        }
    }

    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound(path.into())
    }

    pub fn directory_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryRead {
            path: path.into(),
            source,
        }
    }

    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    pub fn encoding(path: impl Into<PathBuf>, line: usize) -> Self {
        Self::Encoding {
            path: path.into(),
            line,
        }
    }

    pub fn invalid_pattern(pattern: impl Into<String>) -> Self {
        Self::InvalidPattern(pattern.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether this error only concerns a single file and leaves the scan running
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::FileRead { .. } | Self::Encoding { .. })
    }

    /// The path this error is about, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::DirectoryNotFound(path)
            | Self::DirectoryRead { path, .. }
            | Self::FileRead { path, .. }
            | Self::Encoding { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for SearchError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}
