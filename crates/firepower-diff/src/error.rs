//! Error types for the diff crate.

use std::fmt;

/// The shape a comparison operation requires of both sides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Both sides present and sequences.
    Arrays,
    /// Each side absent or a number.
    Numbers,
    /// Each side absent or a mapping.
    Objects,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Arrays => "arrays",
            Self::Numbers => "numbers",
            Self::Objects => "objects",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DiffError {
    /// The compared values do not have the shape the operation needs.
    /// Raised before any traversal.
    #[error("Both values must be {requirement} to use \"{operation}\"")]
    TypePrecondition {
        operation: &'static str,
        requirement: Requirement,
    },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_messages_name_operation() {
        let err = DiffError::TypePrecondition {
            operation: "added_array_values",
            requirement: Requirement::Arrays,
        };
        assert_eq!(
            err.to_string(),
            "Both values must be arrays to use \"added_array_values\""
        );

        let err = DiffError::TypePrecondition {
            operation: "object_numerical_diff",
            requirement: Requirement::Objects,
        };
        assert_eq!(
            err.to_string(),
            "Both values must be objects to use \"object_numerical_diff\""
        );
    }
}
