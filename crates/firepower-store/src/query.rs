use firepower_diff::deep_equal;
use firepower_types::{Path, Value};

use crate::error::{StoreError, StoreResult};
use crate::path::DocPath;
use crate::snapshot::DocumentSnapshot;

/// Filters and a cursor window over a collection, ordered by document path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    filters: Vec<(String, Value)>,
    start_after: Option<DocPath>,
    limit: Option<usize>,
}

impl Query {
    /// A query matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep documents whose dotted `field` is deep-equal to `value`.
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    /// Skip documents up to and including `cursor`.
    pub fn start_after(mut self, cursor: DocPath) -> Self {
        self.start_after = Some(cursor);
        self
    }

    /// Return at most `limit` documents.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The configured limit, if any.
    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    /// Apply the query to documents already sorted by path.
    pub(crate) fn execute<I>(&self, docs: I) -> StoreResult<Vec<DocumentSnapshot>>
    where
        I: IntoIterator<Item = DocumentSnapshot>,
    {
        let filters = self
            .filters
            .iter()
            .map(|(field, value)| {
                Path::from_dotted(field)
                    .map(|path| (path, value))
                    .map_err(|e| StoreError::InvalidQuery(e.to_string()))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let matched = docs
            .into_iter()
            .filter(|doc| match &self.start_after {
                Some(cursor) => doc.path > *cursor,
                None => true,
            })
            .filter(|doc| {
                filters.iter().all(|(path, expected)| {
                    doc.data()
                        .and_then(|data| data.get_path(path))
                        .is_some_and(|actual| deep_equal(actual, expected))
                })
            });

        Ok(match self.limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        })
    }
}
