//! Error types for data pack loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for data pack operations
pub type Result<T> = std::result::Result<T, DataPackError>;

/// Errors that abort the scan of a category.
#[derive(Debug, Error)]
pub enum DataPackError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk data pack directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Path {0} is not valid UTF-8")]
    NonUtf8Path(PathBuf),
}

/// A requested category has no directory in the data pack.
///
/// This is not an error: the category simply contributes no overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCategory {
    pub category: String,
    pub path: PathBuf,
}

impl std::fmt::Display for MissingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Data pack category {} has no directory at {}",
            self.category,
            self.path.display()
        )
    }
}
