use firepower_diff::DiffError;
use firepower_store::StoreError;

/// Errors raised while registering triggers.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// The path pattern is malformed.
    #[error("invalid path pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Result alias for trigger registration.
pub type TriggerResult<T> = Result<T, TriggerError>;

/// Failure reported by a trigger handler.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// A failure carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<DiffError> for HandlerError {
    fn from(err: DiffError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        Self::new(err.to_string())
    }
}
