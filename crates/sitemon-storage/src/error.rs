/// Errors that can occur within the storage layer.
///
/// # Examples
///
/// ```rust
/// use sitemon_storage::error::StorageError;
///
/// let err = StorageError::UnexpectedColumnValue {
///     column: "severity",
///     value: "info".to_string(),
/// };
/// assert!(err.to_string().contains("severity"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An underlying SQLite error.
    #[error("Storage: SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization or deserialization failure (metadata column).
    #[error("Storage: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A column held a value the domain type cannot represent.
    #[error("Storage: unexpected value '{value}' in column '{column}'")]
    UnexpectedColumnValue { column: &'static str, value: String },

    /// The database directory could not be created.
    #[error("Storage: I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
