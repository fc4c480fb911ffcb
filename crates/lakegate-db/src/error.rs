//! Error types for the database layer.

use std::path::PathBuf;

/// Errors that can occur while opening or using a lake connection.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A directory required by the lake layout could not be created.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The base database file could not be opened.
    #[error("{0}")]
    Open(#[source] duckdb::Error),

    /// A statement failed inside the engine. Displays the engine's message verbatim.
    #[error("{0}")]
    Query(#[from] duckdb::Error),

    /// Releasing the handle failed.
    #[error("failed to close database connection: {0}")]
    Close(#[source] duckdb::Error),

    /// Pagination parameters were outside their accepted range.
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
}

impl DbError {
    /// Returns `true` when the failure happened before a handle existed
    /// (directory creation or file open).
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, DbError::CreateDir { .. } | DbError::Open(_))
    }
}
