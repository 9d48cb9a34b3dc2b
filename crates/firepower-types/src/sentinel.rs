use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The kind of store marker a [`Sentinel`] stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentinelKind {
    /// Remove the field on write.
    Delete,
    /// Replace with the store's commit time on write.
    ServerTimestamp,
    /// Refers to the document id in queries.
    DocumentId,
    /// Add a number to the stored field.
    Increment,
    /// Append elements not already present in the stored array.
    ArrayUnion,
    /// Remove all matching elements from the stored array.
    ArrayRemove,
}

impl fmt::Display for SentinelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Delete => "delete",
            Self::ServerTimestamp => "server_timestamp",
            Self::DocumentId => "document_id",
            Self::Increment => "increment",
            Self::ArrayUnion => "array_union",
            Self::ArrayRemove => "array_remove",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
enum Repr {
    Delete,
    ServerTimestamp,
    DocumentId,
    Increment(f64),
    ArrayUnion(Vec<Value>),
    ArrayRemove(Vec<Value>),
}

/// An opaque store marker embedded in a value tree.
///
/// Sentinels are never compared structurally. Markers without a payload
/// (`delete`, `server_timestamp`, `document_id`) are equal to any marker of
/// the same kind. Markers carrying a payload are equal only to themselves:
/// clones share one instance, separately constructed markers do not.
#[derive(Clone, Debug)]
pub struct Sentinel(Arc<Repr>);

impl Sentinel {
    /// Remove the field.
    pub fn delete() -> Self {
        Self(Arc::new(Repr::Delete))
    }

    /// Replace with the commit time.
    pub fn server_timestamp() -> Self {
        Self(Arc::new(Repr::ServerTimestamp))
    }

    /// Replace with the id of the written document.
    pub fn document_id() -> Self {
        Self(Arc::new(Repr::DocumentId))
    }

    /// Add `by` to the stored number.
    pub fn increment(by: f64) -> Self {
        Self(Arc::new(Repr::Increment(by)))
    }

    /// Append `elements` that are not already present.
    pub fn array_union(elements: Vec<Value>) -> Self {
        Self(Arc::new(Repr::ArrayUnion(elements)))
    }

    /// Remove every element deep-equal to one of `elements`.
    pub fn array_remove(elements: Vec<Value>) -> Self {
        Self(Arc::new(Repr::ArrayRemove(elements)))
    }

    /// Which marker this is.
    pub fn kind(&self) -> SentinelKind {
        match *self.0 {
            Repr::Delete => SentinelKind::Delete,
            Repr::ServerTimestamp => SentinelKind::ServerTimestamp,
            Repr::DocumentId => SentinelKind::DocumentId,
            Repr::Increment(_) => SentinelKind::Increment,
            Repr::ArrayUnion(_) => SentinelKind::ArrayUnion,
            Repr::ArrayRemove(_) => SentinelKind::ArrayRemove,
        }
    }

    /// The increment operand, for `increment` markers.
    pub fn increment_by(&self) -> Option<f64> {
        match *self.0 {
            Repr::Increment(by) => Some(by),
            _ => None,
        }
    }

    /// The element list, for `array_union` and `array_remove` markers.
    pub fn elements(&self) -> Option<&[Value]> {
        match &*self.0 {
            Repr::ArrayUnion(elements) | Repr::ArrayRemove(elements) => Some(elements),
            _ => None,
        }
    }

    /// Identity comparison: same payload-less kind, or the same instance.
    pub fn same_as(&self, other: &Sentinel) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (&*self.0, &*other.0) {
            (Repr::Delete, Repr::Delete)
            | (Repr::ServerTimestamp, Repr::ServerTimestamp)
            | (Repr::DocumentId, Repr::DocumentId) => true,
            _ => false,
        }
    }
}

impl PartialEq for Sentinel {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payloadless_markers_compare_by_kind() {
        assert!(Sentinel::delete().same_as(&Sentinel::delete()));
        assert!(Sentinel::server_timestamp().same_as(&Sentinel::server_timestamp()));
        assert!(!Sentinel::delete().same_as(&Sentinel::server_timestamp()));
    }

    #[test]
    fn payload_markers_compare_by_instance() {
        let inc = Sentinel::increment(1.0);
        assert!(inc.same_as(&inc.clone()));
        assert!(!inc.same_as(&Sentinel::increment(1.0)));
    }

    #[test]
    fn accessors() {
        assert_eq!(Sentinel::increment(2.5).increment_by(), Some(2.5));
        assert_eq!(Sentinel::delete().increment_by(), None);
        let union = Sentinel::array_union(vec![Value::from(1)]);
        assert_eq!(union.kind(), SentinelKind::ArrayUnion);
        assert_eq!(union.elements().map(<[Value]>::len), Some(1));
    }

    #[test]
    fn display_names_kind() {
        assert_eq!(Sentinel::array_remove(vec![]).to_string(), "<array_remove>");
    }
}
