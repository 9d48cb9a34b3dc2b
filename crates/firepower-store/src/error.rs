use firepower_types::TypeError;

/// Errors from document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The path is not a valid document or collection path.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The document does not exist (raised by updates).
    #[error("document not found: {0}")]
    NotFound(String),

    /// The written data cannot be stored.
    #[error("invalid document data: {0}")]
    InvalidData(String),

    /// The query cannot be executed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A transaction could not run its body to completion.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// The store configuration could not be parsed or is out of range.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be interpreted.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
