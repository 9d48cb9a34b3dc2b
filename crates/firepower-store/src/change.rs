use std::fmt;

use tokio::sync::broadcast;

use firepower_diff::Comparison;
use firepower_types::Value;

use crate::path::DocPath;

/// What a write did to a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        f.write_str(s)
    }
}

/// The state of a document before and after one write.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentChange {
    pub path: DocPath,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl DocumentChange {
    /// `None` when neither side exists (deleting a missing document).
    pub fn kind(&self) -> Option<ChangeKind> {
        match (&self.before, &self.after) {
            (None, Some(_)) => Some(ChangeKind::Created),
            (Some(_), Some(_)) => Some(ChangeKind::Updated),
            (Some(_), None) => Some(ChangeKind::Deleted),
            (None, None) => None,
        }
    }

    /// The before/after pair as a comparison.
    pub fn comparison(&self) -> Comparison {
        Comparison::new(self.before.clone(), self.after.clone())
    }
}

/// Receiver of change notifications published by a store.
pub type ChangeStream = broadcast::Receiver<DocumentChange>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(before: Option<serde_json::Value>, after: Option<serde_json::Value>) -> DocumentChange {
        DocumentChange {
            path: DocPath::parse("users/alice").unwrap(),
            before: before.map(Value::from),
            after: after.map(Value::from),
        }
    }

    #[test]
    fn kinds() {
        assert_eq!(change(None, Some(json!({}))).kind(), Some(ChangeKind::Created));
        assert_eq!(change(Some(json!({})), Some(json!({}))).kind(), Some(ChangeKind::Updated));
        assert_eq!(change(Some(json!({})), None).kind(), Some(ChangeKind::Deleted));
        assert_eq!(change(None, None).kind(), None);
    }

    #[test]
    fn comparison_exposes_numeric_movement() {
        let c = change(Some(json!({"count": 1})), Some(json!({"count": 4}))).comparison();
        assert_eq!(c.field("count").numerical_diff().unwrap(), 3.0);
        assert!(c.is_unequal());
    }
}
