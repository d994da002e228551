//! Storage error types
//!
//! Defines all errors that can occur in the persistence layer.

use thiserror::Error;

/// Errors that can occur while reading or writing the database
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite reported a failure
    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A uniqueness constraint was violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A stored value could not be decoded
    #[error("Corrupt data: {0}")]
    Corruption(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StorageError::Conflict(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            other => StorageError::Sqlite(other),
        }
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::NotFound("user grandpa_joe".to_string());
        assert_eq!(err.to_string(), "Not found: user grandpa_joe");

        let err = StorageError::Conflict("username".to_string());
        assert_eq!(err.to_string(), "Conflict: username");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
    }

    #[test]
    fn test_query_error_is_not_conflict() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StorageError::Sqlite(_)));
    }
}
