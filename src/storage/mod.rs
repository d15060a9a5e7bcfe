//! Pattern storage for the WIKAI Commons.
//!
//! Patterns live as one pretty-printed JSON document per pattern inside a
//! single directory. The [`PatternStore`] keeps an in-memory index that can
//! always be rebuilt by rescanning that directory.

pub mod models;
pub mod query;
pub mod schema;
pub mod store;

use std::path::{Path, PathBuf};

pub use models::*;
pub use query::SearchQuery;
pub use store::PatternStore;

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by the pattern store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required field is missing or a value is outside its allowed domain.
    #[error("Invalid pattern: {0}")]
    Validation(String),

    /// No pattern with the requested id exists.
    #[error("Pattern not found: {0}")]
    NotFound(String),

    /// Reading or writing a pattern unit failed.
    #[error("Storage error at {}: {source}", path.display())]
    Storage {
        /// File or directory the operation touched.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn storage(path: &Path, source: std::io::Error) -> Self {
        StoreError::Storage {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for [`StoreError::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }

    /// True for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
