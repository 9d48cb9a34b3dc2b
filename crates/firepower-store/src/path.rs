//! Document and collection paths.
//!
//! A path is a `/`-separated list of non-empty ids. Collection paths have an
//! odd number of segments (`users`, `users/alice/posts`), document paths an
//! even number (`users/alice`).

use std::fmt;

use crate::error::{StoreError, StoreResult};

fn split(raw: &str) -> StoreResult<Vec<&str>> {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath {
            path: raw.to_string(),
            reason: "path is empty".into(),
        });
    }
    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath {
            path: raw.to_string(),
            reason: "path contains an empty segment".into(),
        });
    }
    Ok(segments)
}

/// Path of a single document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl DocPath {
    /// Parse a document path with an even, nonzero number of segments.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let segments = split(raw)?;
        if segments.len() % 2 != 0 {
            return Err(StoreError::InvalidPath {
                path: raw.to_string(),
                reason: "document paths need an even number of segments".into(),
            });
        }
        Ok(Self(segments.join("/")))
    }

    /// The path as a slash-joined string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The document id (last segment).
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The collection that contains this document.
    pub fn parent(&self) -> ColPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => ColPath(parent.to_string()),
            None => ColPath(String::new()),
        }
    }

    /// A subcollection under this document.
    pub fn collection(&self, id: &str) -> StoreResult<ColPath> {
        ColPath::parse(&format!("{}/{}", self.0, id))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColPath(String);

impl ColPath {
    /// Parse a collection path with an odd number of segments.
    pub fn parse(raw: &str) -> StoreResult<Self> {
        let segments = split(raw)?;
        if segments.len() % 2 != 1 {
            return Err(StoreError::InvalidPath {
                path: raw.to_string(),
                reason: "collection paths need an odd number of segments".into(),
            });
        }
        Ok(Self(segments.join("/")))
    }

    /// The path as a slash-joined string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The collection id (last segment), which names its collection group.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// A document in this collection.
    pub fn doc(&self, id: &str) -> StoreResult<DocPath> {
        DocPath::parse(&format!("{}/{}", self.0, id))
    }

    /// Returns `true` if `doc` is a direct child of this collection.
    pub fn contains(&self, doc: &DocPath) -> bool {
        doc.parent() == *self
    }
}

impl fmt::Display for ColPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
