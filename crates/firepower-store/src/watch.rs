//! Live views of a document, a collection, or a collection group.
//!
//! A watch yields the current snapshot first, then a fresh snapshot whenever
//! the watched data changes. By default it listens to the store's change
//! stream. With [`WatchOptions::update_interval`] it polls instead.
//! Dropping the watch (or calling `unsubscribe`) ends it.

use std::time::Duration;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::time::{self, Instant, Interval};
use tracing::{debug, warn};

use crate::change::{ChangeStream, DocumentChange};
use crate::error::StoreResult;
use crate::path::{ColPath, DocPath};
use crate::query::Query;
use crate::snapshot::{CollectionSnapshot, DocumentSnapshot};
use crate::traits::DocumentStore;

/// How a watch learns about changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Re-read at this period instead of listening for changes.
    pub update_interval: Option<Duration>,
}

impl WatchOptions {
    /// Poll every `period`.
    pub fn polling(period: Duration) -> Self {
        Self {
            update_interval: Some(period),
        }
    }
}

enum Event {
    Changed(DocumentChange),
    Resync,
}

enum Feed {
    Listen(ChangeStream),
    Poll { period: Duration, ticker: Option<Interval> },
}

impl Feed {
    fn open<S: DocumentStore + ?Sized>(store: &S, options: WatchOptions) -> Self {
        match options.update_interval {
            Some(period) => Feed::Poll { period, ticker: None },
            None => Feed::Listen(store.subscribe()),
        }
    }

    async fn next<F>(&mut self, relevant: F) -> Option<Event>
    where
        F: Fn(&DocumentChange) -> bool,
    {
        match self {
            Feed::Listen(stream) => loop {
                match stream.recv().await {
                    Ok(change) if relevant(&change) => return Some(Event::Changed(change)),
                    Ok(_) => {}
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "watch fell behind the change stream, re-reading");
                        return Some(Event::Resync);
                    }
                    Err(RecvError::Closed) => return None,
                }
            },
            Feed::Poll { period, ticker } => {
                let period = *period;
                // The first tick is one period out; the initial read already happened.
                let ticker = ticker.get_or_insert_with(|| time::interval_at(Instant::now() + period, period));
                ticker.tick().await;
                Some(Event::Resync)
            }
        }
    }

    fn try_next<F>(&mut self, relevant: F) -> Option<Event>
    where
        F: Fn(&DocumentChange) -> bool,
    {
        match self {
            Feed::Listen(stream) => loop {
                match stream.try_recv() {
                    Ok(change) if relevant(&change) => return Some(Event::Changed(change)),
                    Ok(_) => {}
                    Err(TryRecvError::Lagged(missed)) => {
                        warn!(missed, "watch fell behind the change stream, re-reading");
                        return Some(Event::Resync);
                    }
                    Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
                }
            },
            Feed::Poll { .. } => None,
        }
    }
}

/// A live view of one document. See [`watch_doc`].
pub struct DocWatch<'a, S: ?Sized> {
    store: &'a S,
    path: DocPath,
    feed: Feed,
    initial: Option<DocumentSnapshot>,
}

/// Watch the document at `path`.
///
/// The first snapshot is read immediately, so a missing document is an
/// error only if the read itself fails.
pub fn watch_doc<'a, S>(store: &'a S, path: &DocPath, options: WatchOptions) -> StoreResult<DocWatch<'a, S>>
where
    S: DocumentStore + ?Sized,
{
    debug!(path = %path, polling = options.update_interval.is_some(), "watching document");
    let feed = Feed::open(store, options);
    let initial = store.get_doc(path)?;
    Ok(DocWatch {
        store,
        path: path.clone(),
        feed,
        initial: Some(initial),
    })
}

impl<'a, S: DocumentStore + ?Sized> DocWatch<'a, S> {
    /// The watched path.
    pub fn path(&self) -> &DocPath {
        &self.path
    }

    /// Wait for the next snapshot. `None` once the store stops publishing.
    pub async fn next(&mut self) -> Option<StoreResult<DocumentSnapshot>> {
        if let Some(snapshot) = self.initial.take() {
            return Some(Ok(snapshot));
        }
        let path = &self.path;
        let event = self.feed.next(|change| change.path == *path).await?;
        Some(self.snapshot(event))
    }

    /// The next snapshot if one is ready, without waiting.
    ///
    /// Polling watches only deliver through [`next`](Self::next).
    pub fn try_next(&mut self) -> Option<StoreResult<DocumentSnapshot>> {
        if let Some(snapshot) = self.initial.take() {
            return Some(Ok(snapshot));
        }
        let path = &self.path;
        let event = self.feed.try_next(|change| change.path == *path)?;
        Some(self.snapshot(event))
    }

    /// Stop watching.
    pub fn unsubscribe(self) {}

    fn snapshot(&self, event: Event) -> StoreResult<DocumentSnapshot> {
        match event {
            Event::Changed(change) => Ok(DocumentSnapshot::new(change.path, change.after)),
            Event::Resync => self.store.get_doc(&self.path),
        }
    }
}

enum Scope {
    Collection(ColPath),
    Group(String),
}

impl Scope {
    fn covers(&self, change: &DocumentChange) -> bool {
        match self {
            Scope::Collection(col) => col.contains(&change.path),
            Scope::Group(group) => change.path.parent().id() == group,
        }
    }
}

/// A live view of a collection or collection-group query. See
/// [`watch_col`] and [`watch_col_group`].
pub struct ColWatch<'a, S: ?Sized> {
    store: &'a S,
    scope: Scope,
    query: Query,
    feed: Feed,
    initial: Option<CollectionSnapshot>,
}

/// Watch the documents of `col` matching `query`.
pub fn watch_col<'a, S>(
    store: &'a S,
    col: &ColPath,
    query: Query,
    options: WatchOptions,
) -> StoreResult<ColWatch<'a, S>>
where
    S: DocumentStore + ?Sized,
{
    debug!(collection = %col, polling = options.update_interval.is_some(), "watching collection");
    ColWatch::open(store, Scope::Collection(col.clone()), query, options)
}

/// Watch the documents of every collection named `group` matching `query`.
pub fn watch_col_group<'a, S>(
    store: &'a S,
    group: &str,
    query: Query,
    options: WatchOptions,
) -> StoreResult<ColWatch<'a, S>>
where
    S: DocumentStore + ?Sized,
{
    debug!(group, polling = options.update_interval.is_some(), "watching collection group");
    ColWatch::open(store, Scope::Group(group.to_string()), query, options)
}

impl<'a, S: DocumentStore + ?Sized> ColWatch<'a, S> {
    fn open(store: &'a S, scope: Scope, query: Query, options: WatchOptions) -> StoreResult<Self> {
        let feed = Feed::open(store, options);
        let mut watch = Self {
            store,
            scope,
            query,
            feed,
            initial: None,
        };
        watch.initial = Some(watch.fetch()?);
        Ok(watch)
    }

    /// Wait for the next snapshot. `None` once the store stops publishing.
    pub async fn next(&mut self) -> Option<StoreResult<CollectionSnapshot>> {
        if let Some(snapshot) = self.initial.take() {
            return Some(Ok(snapshot));
        }
        let scope = &self.scope;
        self.feed.next(|change| scope.covers(change)).await?;
        Some(self.fetch())
    }

    /// The next snapshot if one is ready, without waiting.
    ///
    /// Several pending changes are folded into one snapshot.
    pub fn try_next(&mut self) -> Option<StoreResult<CollectionSnapshot>> {
        if let Some(snapshot) = self.initial.take() {
            return Some(Ok(snapshot));
        }
        let scope = &self.scope;
        self.feed.try_next(|change| scope.covers(change))?;
        while self.feed.try_next(|change| scope.covers(change)).is_some() {}
        Some(self.fetch())
    }

    /// Stop watching.
    pub fn unsubscribe(self) {}

    fn fetch(&self) -> StoreResult<CollectionSnapshot> {
        match &self.scope {
            Scope::Collection(col) => self.store.get_col(col, &self.query),
            Scope::Group(group) => self.store.get_col_group(group, &self.query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDocumentStore;
    use crate::traits::SetOptions;
    use firepower_types::Value;
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

    fn put(store: &InMemoryDocumentStore, path: &str, data: serde_json::Value) {
        store.set_doc(&doc(path), v(data), SetOptions::default()).unwrap();
    }

    #[test]
    fn doc_watch_starts_with_current_state() {
        let store = InMemoryDocumentStore::new();
        put(&store, "users/homer", json!({"donuts": 1}));

        let mut watch = watch_doc(&store, &doc("users/homer"), WatchOptions::default()).unwrap();
        let first = watch.try_next().unwrap().unwrap();
        assert_eq!(first.data, Some(v(json!({"donuts": 1}))));
        assert!(watch.try_next().is_none());
    }

    #[test]
    fn doc_watch_follows_only_its_path() {
        let store = InMemoryDocumentStore::new();
        let path = doc("users/homer");
        let mut watch = watch_doc(&store, &path, WatchOptions::default()).unwrap();
        assert!(!watch.try_next().unwrap().unwrap().exists());

        put(&store, "users/marge", json!({"hair": "blue"}));
        put(&store, "users/homer", json!({"donuts": 2}));
        store.delete_doc(&path).unwrap();

        let created = watch.try_next().unwrap().unwrap();
        assert_eq!(created.path, path);
        assert_eq!(created.get("donuts"), Some(&Value::from(2)));

        let deleted = watch.try_next().unwrap().unwrap();
        assert!(!deleted.exists());
        assert!(watch.try_next().is_none());
    }

    #[tokio::test]
    async fn doc_watch_awaits_changes() {
        let store = InMemoryDocumentStore::new();
        let path = doc("counters/c");
        put(&store, "counters/c", json!({"n": 1}));

        let mut watch = watch_doc(&store, &path, WatchOptions::default()).unwrap();
        assert_eq!(watch.next().await.unwrap().unwrap().get("n"), Some(&Value::from(1)));

        store.update_doc(&path, v(json!({"n": 2}))).unwrap();
        assert_eq!(watch.next().await.unwrap().unwrap().get("n"), Some(&Value::from(2)));
    }

    #[tokio::test]
    async fn polling_watch_rereads_each_interval() {
        let store = InMemoryDocumentStore::new();
        let path = doc("counters/c");
        put(&store, "counters/c", json!({"n": 1}));

        let options = WatchOptions::polling(Duration::from_millis(10));
        let mut watch = watch_doc(&store, &path, options).unwrap();
        assert_eq!(watch.next().await.unwrap().unwrap().get("n"), Some(&Value::from(1)));

        // Polling does not listen, so a write is only seen on the next tick.
        store.update_doc(&path, v(json!({"n": 7}))).unwrap();
        assert!(watch.try_next().is_none());
        assert_eq!(watch.next().await.unwrap().unwrap().get("n"), Some(&Value::from(7)));
    }

    #[test]
    fn col_watch_requeries_on_member_changes() {
        let store = InMemoryDocumentStore::new();
        put(&store, "players/a", json!({"team": "red"}));
        put(&store, "players/b", json!({"team": "blue"}));

        let query = Query::new().where_eq("team", "red");
        let mut watch = watch_col(&store, &col("players"), query, WatchOptions::default()).unwrap();
        assert_eq!(watch.try_next().unwrap().unwrap().ids(), vec!["a"]);

        put(&store, "coaches/x", json!({"team": "red"}));
        put(&store, "players/a/stats/s1", json!({"team": "red"}));
        assert!(watch.try_next().is_none());

        put(&store, "players/c", json!({"team": "red"}));
        put(&store, "players/b", json!({"team": "red"}));
        let snap = watch.try_next().unwrap().unwrap();
        assert_eq!(snap.ids(), vec!["a", "b", "c"]);
        assert!(watch.try_next().is_none());
    }

    #[tokio::test]
    async fn col_group_watch_spans_parents() {
        let store = InMemoryDocumentStore::new();
        put(&store, "users/a/posts/1", json!({}));

        let mut watch = watch_col_group(&store, "posts", Query::new(), WatchOptions::default()).unwrap();
        assert_eq!(watch.next().await.unwrap().unwrap().ids(), vec!["1"]);

        put(&store, "users/b/drafts/9", json!({}));
        put(&store, "users/b/posts/2", json!({}));
        assert_eq!(watch.next().await.unwrap().unwrap().ids(), vec!["1", "2"]);
    }

    #[test]
    fn unsubscribed_watch_stops_receiving() {
        let store = InMemoryDocumentStore::new();
        let watch = watch_doc(&store, &doc("users/a"), WatchOptions::default()).unwrap();
        assert_eq!(store.subscriber_count(), 1);
        watch.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);
        put(&store, "users/a", json!({}));
    }
}
