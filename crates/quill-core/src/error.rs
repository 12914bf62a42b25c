//! Error types for quill-core

use thiserror::Error;

/// Result type alias using quill-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in quill-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_message_includes_detail() {
        let error = Error::InvalidInput("label name cannot be empty".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid input: label name cannot be empty"
        );
    }

    #[test]
    fn rusqlite_errors_convert() {
        let error: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(error, Error::Database(_)));
    }
}
