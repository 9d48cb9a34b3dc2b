use firepower_types::Value;

use crate::path::DocPath;

/// A document as read from the store.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    pub path: DocPath,
    /// The document mapping, or `None` if the document does not exist.
    pub data: Option<Value>,
}

impl DocumentSnapshot {
    /// A snapshot of `path`; `None` data means the document is missing.
    pub fn new(path: DocPath, data: Option<Value>) -> Self {
        Self { path, data }
    }

    /// Whether the document exists.
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// The last segment of the path.
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// The document data, if it exists.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// The data, or an empty mapping for a missing document.
    pub fn data_or_empty(&self) -> Value {
        self.data.clone().unwrap_or_else(Value::empty_mapping)
    }

    /// A field of the document, by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.get(key)
    }
}

/// The documents returned by a collection or collection-group query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollectionSnapshot {
    pub docs: Vec<DocumentSnapshot>,
}

impl CollectionSnapshot {
    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns `true` if the query matched nothing.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// The last document, used as a pagination cursor.
    pub fn last(&self) -> Option<&DocumentSnapshot> {
        self.docs.last()
    }

    /// Document ids in result order.
    pub fn ids(&self) -> Vec<&str> {
        self.docs.iter().map(DocumentSnapshot::id).collect()
    }
}

impl IntoIterator for CollectionSnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.into_iter()
    }
}
