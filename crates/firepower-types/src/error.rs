use thiserror::Error;

use crate::path::Path;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("sentinel `{kind}` at {path} cannot be encoded as JSON")]
    UnencodableSentinel { kind: String, path: Path },

    #[error("non-finite number at {path} cannot be encoded as JSON")]
    NonFiniteNumber { path: Path },

    #[error("invalid field path: {0:?}")]
    InvalidFieldPath(String),
}
