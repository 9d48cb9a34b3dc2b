use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{SecondsFormat, Utc};
use tokio::sync::broadcast;

use firepower_types::{Mapping, Value};

use crate::batch::{new_document_id, WriteBatch, WriteOp};
use crate::change::{ChangeStream, DocumentChange};
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::oplog::OpLog;
use crate::path::{ColPath, DocPath};
use crate::query::Query;
use crate::snapshot::{CollectionSnapshot, DocumentSnapshot};
use crate::traits::{DocumentStore, ReadOptions, SetOptions, WriteOptions};
use crate::transaction::Transaction;

/// In-memory, `BTreeMap`-based document store.
///
/// Intended for tests and embedding. Documents are held behind a `RwLock`
/// and cloned on read and write.
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<DocPath, Mapping>>,
    changes: broadcast::Sender<DocumentChange>,
    config: StoreConfig,
}

impl InMemoryDocumentStore {
    /// Create a new empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// An empty store with `config`.
    pub fn with_config(config: StoreConfig) -> Self {
        let (changes, _) = broadcast::channel(config.change_channel_capacity.max(1));
        Self {
            documents: RwLock::new(BTreeMap::new()),
            changes,
            config,
        }
    }

    /// The configuration this store logs with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.documents.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.read().expect("lock poisoned").is_empty()
    }

    /// Number of live change subscribers, watches included.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    /// Apply writes atomically and publish the resulting changes.
    fn apply(&self, ops: Vec<WriteOp>) -> StoreResult<Vec<DocumentChange>> {
        self.commit_with(|tx| ops.into_iter().try_for_each(|op| tx.apply(op)))
    }

    /// Run `body` over a transaction under the write lock, then commit what
    /// it staged and publish the changes once the lock is released.
    fn commit_with<F>(&self, body: F) -> StoreResult<Vec<DocumentChange>>
    where
        F: FnOnce(&mut Transaction<'_>) -> StoreResult<()>,
    {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let changes = {
            let mut documents = self.documents.write().expect("lock poisoned");

            // Writes are staged first so a failure leaves the store untouched.
            let mut tx = Transaction::new(&documents, now);
            body(&mut tx)?;
            let (staged, changes) = tx.into_parts();

            for (path, doc) in staged {
                match doc {
                    Some(doc) => {
                        documents.insert(path, doc);
                    }
                    None => {
                        documents.remove(&path);
                    }
                }
            }
            changes
        };

        for change in &changes {
            if change.kind().is_some() {
                // No subscribers is not an error.
                let _ = self.changes.send(change.clone());
            }
        }
        Ok(changes)
    }

    fn write_one(&self, op: WriteOp, log: bool) -> StoreResult<DocPath> {
        let oplog = OpLog::write(&self.config, op.name(), op.path(), log);
        let path = op.path().clone();
        oplog.finish(self.apply(vec![op]).map(|_| path))
    }

    fn select<F>(&self, query: &Query, include: F) -> StoreResult<CollectionSnapshot>
    where
        F: Fn(&DocPath) -> bool,
    {
        let docs: Vec<DocumentSnapshot> = {
            let documents = self.documents.read().expect("lock poisoned");
            documents
                .iter()
                .filter(|(path, _)| include(path))
                .map(|(path, doc)| DocumentSnapshot::new(path.clone(), Some(Value::Mapping(doc.clone()))))
                .collect()
        };
        Ok(CollectionSnapshot {
            docs: query.execute(docs)?,
        })
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn get_doc_with(&self, path: &DocPath, options: ReadOptions) -> StoreResult<DocumentSnapshot> {
        let log = OpLog::read(&self.config, "get_doc", path, options.log);
        let data = self
            .documents
            .read()
            .expect("lock poisoned")
            .get(path)
            .cloned()
            .map(Value::Mapping);
        log.finish(Ok(DocumentSnapshot::new(path.clone(), data)))
    }

    fn set_doc(&self, path: &DocPath, data: Value, options: SetOptions) -> StoreResult<DocPath> {
        self.write_one(
            WriteOp::Set {
                path: path.clone(),
                data,
                options,
            },
            options.log,
        )
    }

    fn update_doc_with(&self, path: &DocPath, data: Value, options: WriteOptions) -> StoreResult<DocPath> {
        self.write_one(
            WriteOp::Update {
                path: path.clone(),
                data,
            },
            options.log,
        )
    }

    fn add_doc_with(&self, col: &ColPath, data: Value, options: WriteOptions) -> StoreResult<DocPath> {
        let log = OpLog::write(&self.config, "add_doc", col, options.log);
        let result = col.doc(&new_document_id()).and_then(|path| {
            self.apply(vec![WriteOp::Set {
                path: path.clone(),
                data,
                options: SetOptions::replace(),
            }])
            .map(|_| path)
        });
        log.finish(result)
    }

    fn delete_doc_with(&self, path: &DocPath, options: WriteOptions) -> StoreResult<DocPath> {
        self.write_one(WriteOp::Delete { path: path.clone() }, options.log)
    }

    fn get_col_with(&self, col: &ColPath, query: &Query, options: ReadOptions) -> StoreResult<CollectionSnapshot> {
        let log = OpLog::read(&self.config, "get_col", col, options.log);
        log.finish(self.select(query, |path| col.contains(path)))
    }

    fn get_col_group_with(
        &self,
        group: &str,
        query: &Query,
        options: ReadOptions,
    ) -> StoreResult<CollectionSnapshot> {
        let log = OpLog::read(&self.config, "get_col_group", group, options.log);
        log.finish(self.select(query, |path| path.parent().id() == group))
    }

    fn commit_batch_with(&self, batch: WriteBatch, options: WriteOptions) -> StoreResult<()> {
        let log = OpLog::write(
            &self.config,
            "commit_batch",
            format!("{} writes", batch.len()),
            options.log,
        );
        log.finish(self.apply(batch.into_ops()).map(|_| ()))
    }

    fn transact(
        &self,
        body: &mut dyn FnMut(&mut Transaction<'_>) -> StoreResult<()>,
        options: WriteOptions,
    ) -> StoreResult<()> {
        let log = OpLog::write(&self.config, "run_transaction", "transaction", options.log);
        log.finish(self.commit_with(|tx| body(tx)).map(|_| ()))
    }

    fn subscribe(&self) -> ChangeStream {
        self.changes.subscribe()
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeKind;
    use crate::error::StoreError;
    use crate::oplog::capture::logged_by;
    use crate::traits::run_batch;
    use firepower_types::Sentinel;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn doc(path: &str) -> DocPath {
        DocPath::parse(path).unwrap()
    }

    fn col(path: &str) -> ColPath {
        ColPath::parse(path).unwrap()
    }

    fn seeded() -> InMemoryDocumentStore {
        let store = InMemoryDocumentStore::new();
        store.set_doc(&doc("users/abc123"), v(json!({"name": "Homer Simpson"})), SetOptions::default()).unwrap();
        store.set_doc(&doc("users/abc456"), v(json!({"name": "Lisa Simpson"})), SetOptions::default()).unwrap();
        store.set_doc(&doc("posts/123abc"), v(json!({"title": "Really cool title"})), SetOptions::default()).unwrap();
        store
    }

    #[test]
    fn get_doc_returns_data() {
        let store = seeded();
        let snap = store.get_doc(&doc("users/abc123")).unwrap();
        assert!(snap.exists());
        assert_eq!(snap.id(), "abc123");
        assert_eq!(snap.data(), Some(&v(json!({"name": "Homer Simpson"}))));
    }

    #[test]
    fn missing_doc_does_not_exist() {
        let store = seeded();
        let snap = store.get_doc(&doc("users/nobody")).unwrap();
        assert!(!snap.exists());
        assert_eq!(snap.data_or_empty(), Value::empty_mapping());
    }

    #[test]
    fn set_merges_by_default_and_replaces_on_request() {
        let store = seeded();
        let path = doc("users/abc123");
        store.set_doc(&path, v(json!({"age": 39})), SetOptions::default()).unwrap();
        assert_eq!(
            store.get_doc(&path).unwrap().data,
            Some(v(json!({"name": "Homer Simpson", "age": 39})))
        );

        store.set_doc(&path, v(json!({"age": 40})), SetOptions::replace()).unwrap();
        assert_eq!(store.get_doc(&path).unwrap().data, Some(v(json!({"age": 40}))));
    }

    #[test]
    fn set_rejects_non_mapping_data() {
        let store = InMemoryDocumentStore::new();
        let err = store.set_doc(&doc("a/b"), v(json!([1])), SetOptions::default()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn update_requires_existing_document() {
        let store = seeded();
        let err = store.update_doc(&doc("users/nobody"), v(json!({"x": 1}))).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store.update_doc(&doc("users/abc456"), v(json!({"profile.instrument": "sax"}))).unwrap();
        assert_eq!(
            store.get_doc(&doc("users/abc456")).unwrap().data,
            Some(v(json!({"name": "Lisa Simpson", "profile": {"instrument": "sax"}})))
        );
    }

    #[test]
    fn add_doc_generates_ids() {
        let store = InMemoryDocumentStore::new();
        let first = store.add_doc(&col("events"), v(json!({"n": 1}))).unwrap();
        let second = store.add_doc(&col("events"), v(json!({"n": 2}))).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.parent(), col("events"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = seeded();
        store.delete_doc(&doc("users/abc123")).unwrap();
        store.delete_doc(&doc("users/abc123")).unwrap();
        assert!(!store.get_doc(&doc("users/abc123")).unwrap().exists());
    }

    #[test]
    fn sentinels_are_resolved_on_write() {
        let store = InMemoryDocumentStore::new();
        let path = doc("counters/c1");
        store.set_doc(&path, v(json!({"n": 1, "tmp": true})), SetOptions::default()).unwrap();

        let mut data = Mapping::new();
        data.insert("n".into(), Value::from(Sentinel::increment(4.0)));
        data.insert("tmp".into(), Value::from(Sentinel::delete()));
        data.insert("at".into(), Value::from(Sentinel::server_timestamp()));
        store.set_doc(&path, Value::Mapping(data), SetOptions::default()).unwrap();

        let snap = store.get_doc(&path).unwrap();
        assert_eq!(snap.get("n"), Some(&Value::from(5)));
        assert!(snap.get("tmp").is_none());
        let at = snap.get("at").and_then(Value::as_str).unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(at).is_ok());
        assert!(!snap.data_or_empty().contains_sentinel());
    }

    #[test]
    fn get_col_lists_direct_children_in_order() {
        let store = seeded();
        store.set_doc(&doc("users/abc123/pets/p1"), v(json!({"kind": "dog"})), SetOptions::default()).unwrap();
        let users = store.get_col(&col("users"), &Query::new()).unwrap();
        assert_eq!(users.ids(), vec!["abc123", "abc456"]);
    }

    #[test]
    fn queries_filter_and_window() {
        let store = InMemoryDocumentStore::new();
        for (id, team) in [("a", "red"), ("b", "blue"), ("c", "red"), ("d", "red")] {
            store
                .set_doc(&doc(&format!("players/{id}")), v(json!({"team": {"name": team}})), SetOptions::default())
                .unwrap();
        }
        let query = Query::new()
            .where_eq("team.name", "red")
            .start_after(doc("players/a"))
            .limit(1);
        let page = store.get_col(&col("players"), &query).unwrap();
        assert_eq!(page.ids(), vec!["c"]);
    }

    #[test]
    fn invalid_filter_path_is_invalid_query() {
        let store = seeded();
        let err = store.get_col(&col("users"), &Query::new().where_eq("a..b", 1)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuery(_)));
    }

    #[test]
    fn collection_groups_span_parents() {
        let store = InMemoryDocumentStore::new();
        for path in ["users/a/posts/1", "users/b/posts/2", "posts/3", "users/a/drafts/4"] {
            store.set_doc(&doc(path), v(json!({})), SetOptions::default()).unwrap();
        }
        let posts = store.get_col_group("posts", &Query::new()).unwrap();
        assert_eq!(posts.ids(), vec!["3", "1", "2"]);
    }

    #[test]
    fn batches_are_all_or_nothing() {
        let store = seeded();
        let result = run_batch(&store, |batch| {
            batch.set(doc("users/new"), v(json!({"name": "Bart"})), SetOptions::default());
            batch.update(doc("users/missing"), v(json!({"x": 1})));
            Ok(())
        });
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(!store.get_doc(&doc("users/new")).unwrap().exists());

        let added = run_batch(&store, |batch| {
            batch.delete(doc("posts/123abc"));
            batch.add(&col("posts"), v(json!({"title": "Fresh"})))
        })
        .unwrap();
        assert!(store.get_doc(&added).unwrap().exists());
        assert!(!store.get_doc(&doc("posts/123abc")).unwrap().exists());
    }

    #[test]
    fn later_batch_writes_see_earlier_ones() {
        let store = InMemoryDocumentStore::new();
        let path = doc("c/x");
        let mut batch = WriteBatch::new();
        batch
            .set(path.clone(), v(json!({"n": 1})), SetOptions::default())
            .update(path.clone(), v(json!({"m": 2})));
        store.commit_batch(batch).unwrap();
        assert_eq!(store.get_doc(&path).unwrap().data, Some(v(json!({"n": 1, "m": 2}))));
    }

    #[test]
    fn writes_publish_changes() {
        let store = InMemoryDocumentStore::new();
        let mut stream = store.subscribe();
        let path = doc("users/maggie");

        store.set_doc(&path, v(json!({"n": 1})), SetOptions::default()).unwrap();
        store.update_doc(&path, v(json!({"n": 3}))).unwrap();
        store.delete_doc(&path).unwrap();
        store.delete_doc(&path).unwrap();

        let created = stream.try_recv().unwrap();
        assert_eq!(created.kind(), Some(ChangeKind::Created));

        let updated = stream.try_recv().unwrap();
        assert_eq!(updated.kind(), Some(ChangeKind::Updated));
        assert_eq!(updated.comparison().field("n").numerical_diff().unwrap(), 2.0);

        let deleted = stream.try_recv().unwrap();
        assert_eq!(deleted.kind(), Some(ChangeKind::Deleted));

        // Deleting a missing document publishes nothing.
        assert!(stream.try_recv().is_err());
    }

    #[test]
    fn per_call_options_override_logging() {
        let store = InMemoryDocumentStore::new();
        let path = doc("users/ned");

        let quiet = logged_by(|| {
            store.set_doc(&path, v(json!({"n": 1})), SetOptions::default().quiet()).unwrap();
            store.update_doc_with(&path, v(json!({"n": 2})), WriteOptions::quiet()).unwrap();
            store.get_doc(&path).unwrap();
        });
        assert!(!quiet.lines().iter().any(|l| l.contains(" INFO ")));

        let loud = logged_by(|| {
            store.delete_doc(&path).unwrap();
            store.get_doc_with(&path, ReadOptions::logged()).unwrap();
        });
        let lines = loud.lines();
        let info: Vec<&String> = lines.iter().filter(|l| l.contains(" INFO ")).collect();
        assert_eq!(info.len(), 2);
        assert!(info[0].contains("store write") && info[0].contains("delete_doc"));
        assert!(info[1].contains("store read") && info[1].contains("get_doc"));
    }
}
