//! Cursor pagination over collection queries.

use crate::error::{StoreError, StoreResult};
use crate::path::ColPath;
use crate::query::Query;
use crate::snapshot::CollectionSnapshot;
use crate::traits::DocumentStore;

/// Lets a page callback end the iteration early.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchControl {
    stopped: bool,
}

impl BatchControl {
    /// Stop after the current page.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Whether `stop` was called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Fetch `col` in pages of `limit` documents ordered by path, calling
/// `callback` with each page. Iteration ends after a page shorter than
/// `limit` or when the callback calls [`BatchControl::stop`].
///
/// Returns the number of pages delivered.
pub fn get_col_in_batches<S, F>(
    store: &S,
    col: &ColPath,
    query: &Query,
    limit: usize,
    callback: F,
) -> StoreResult<usize>
where
    S: DocumentStore + ?Sized,
    F: FnMut(&CollectionSnapshot, &mut BatchControl) -> StoreResult<()>,
{
    paginate(|q| store.get_col(col, q), query, limit, callback)
}

/// [`get_col_in_batches`] over a collection group.
pub fn get_col_group_in_batches<S, F>(
    store: &S,
    group: &str,
    query: &Query,
    limit: usize,
    callback: F,
) -> StoreResult<usize>
where
    S: DocumentStore + ?Sized,
    F: FnMut(&CollectionSnapshot, &mut BatchControl) -> StoreResult<()>,
{
    paginate(|q| store.get_col_group(group, q), query, limit, callback)
}

fn paginate<G, F>(fetch: G, query: &Query, limit: usize, mut callback: F) -> StoreResult<usize>
where
    G: Fn(&Query) -> StoreResult<CollectionSnapshot>,
    F: FnMut(&CollectionSnapshot, &mut BatchControl) -> StoreResult<()>,
{
    if limit == 0 {
        return Err(StoreError::InvalidQuery("batch limit must be greater than zero".into()));
    }

    let mut control = BatchControl::default();
    let mut cursor = None;
    let mut pages = 0;
    while !control.is_stopped() {
        let mut page_query = query.clone().limit(limit);
        if let Some(after) = cursor.take() {
            page_query = page_query.start_after(after);
        }
        let page = fetch(&page_query)?;
        cursor = page.last().map(|doc| doc.path.clone());
        pages += 1;
        tracing::debug!(page = pages, docs = page.len(), "fetched batch");

        callback(&page, &mut control)?;
        if page.len() != limit {
            control.stop();
        }
    }
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDocumentStore;
    use crate::path::DocPath;
    use crate::traits::SetOptions;
    use firepower_types::Value;
    use serde_json::json;

    fn store_with(count: usize) -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        for i in 0..count {
            let path = DocPath::parse(&format!("items/{i:03}")).unwrap();
            store
                .set_doc(&path, Value::from(json!({ "i": i, "even": i % 2 == 0 })), SetOptions::default())
                .unwrap();
        }
        store
    }

    #[test]
    fn visits_every_document_once() {
        let store = store_with(7);
        let mut seen = Vec::new();
        let pages = get_col_in_batches(
            &store,
            &ColPath::parse("items").unwrap(),
            &Query::new(),
            3,
            |page, _| {
                seen.extend(page.ids().into_iter().map(str::to_string));
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(pages, 3);
        assert_eq!(seen, (0..7).map(|i| format!("{i:03}")).collect::<Vec<_>>());
    }

    #[test]
    fn exact_multiple_ends_with_empty_page() {
        let store = store_with(4);
        let mut sizes = Vec::new();
        get_col_in_batches(&store, &ColPath::parse("items").unwrap(), &Query::new(), 2, |page, _| {
            sizes.push(page.len());
            Ok(())
        })
        .unwrap();
        assert_eq!(sizes, vec![2, 2, 0]);
    }

    #[test]
    fn callback_can_stop() {
        let store = store_with(10);
        let pages = get_col_in_batches(&store, &ColPath::parse("items").unwrap(), &Query::new(), 2, |_, control| {
            control.stop();
            Ok(())
        })
        .unwrap();
        assert_eq!(pages, 1);
    }

    #[test]
    fn filters_apply_to_every_page() {
        let store = store_with(9);
        let mut seen = 0;
        get_col_in_batches(
            &store,
            &ColPath::parse("items").unwrap(),
            &Query::new().where_eq("even", true),
            2,
            |page, _| {
                seen += page.len();
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(seen, 5);
    }

    #[test]
    fn callback_errors_propagate() {
        let store = store_with(3);
        let result = get_col_in_batches(&store, &ColPath::parse("items").unwrap(), &Query::new(), 1, |_, _| {
            Err(StoreError::InvalidData("boom".into()))
        });
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let store = store_with(1);
        let result = get_col_group_in_batches(&store, "items", &Query::new(), 0, |_, _| Ok(()));
        assert!(matches!(result, Err(StoreError::InvalidQuery(_))));
    }

    #[test]
    fn collection_groups_paginate() {
        let store = InMemoryDocumentStore::new();
        for path in ["a/1/tags/x", "a/2/tags/y", "b/1/tags/z"] {
            store
                .set_doc(&DocPath::parse(path).unwrap(), Value::empty_mapping(), SetOptions::default())
                .unwrap();
        }
        let mut ids = Vec::new();
        get_col_group_in_batches(&store, "tags", &Query::new(), 2, |page, _| {
            ids.extend(page.ids().into_iter().map(str::to_string));
            Ok(())
        })
        .unwrap();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }
}
