//! The [`DocumentStore`] trait defining the storage interface.

use firepower_types::Value;

use crate::batch::WriteBatch;
use crate::change::ChangeStream;
use crate::error::StoreResult;
use crate::path::{ColPath, DocPath};
use crate::query::Query;
use crate::snapshot::{CollectionSnapshot, DocumentSnapshot};
use crate::transaction::Transaction;

/// Options for [`DocumentStore::set_doc`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetOptions {
    /// Merge into the existing document instead of replacing it.
    pub merge: bool,
    /// Emit the `info` write event for this call.
    pub log: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self { merge: true, log: true }
    }
}

impl SetOptions {
    /// Options that overwrite the whole document.
    pub fn replace() -> Self {
        Self {
            merge: false,
            ..Self::default()
        }
    }

    /// Skip the `info` write event for this call.
    pub fn quiet(mut self) -> Self {
        self.log = false;
        self
    }
}

/// Per-call options for updates, adds, deletes, batches and transactions.
///
/// Writes are logged by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOptions {
    /// Emit the `info` write event for this call.
    pub log: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { log: true }
    }
}

impl WriteOptions {
    /// Skip the `info` write event for this call.
    pub fn quiet() -> Self {
        Self { log: false }
    }
}

/// Per-call options for reads.
///
/// Reads are not logged at `info` unless asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Emit an `info` read event for this call.
    pub log: bool,
}

impl ReadOptions {
    /// Emit an `info` read event for this call.
    pub fn logged() -> Self {
        Self { log: true }
    }
}

/// Storage backend for documents.
///
/// Implementations must be thread-safe and must satisfy:
/// - Written data is a mapping; sentinels in it are resolved on write.
/// - Reads never observe a partially applied batch or transaction.
/// - Each successful write publishes one [`DocumentChange`](crate::DocumentChange)
///   per affected document.
///
/// The plain methods use default options; the `_with` variants take
/// per-call options.
pub trait DocumentStore: Send + Sync {
    /// Read a document. A missing document yields a snapshot whose
    /// `exists()` is `false`.
    fn get_doc(&self, path: &DocPath) -> StoreResult<DocumentSnapshot> {
        self.get_doc_with(path, ReadOptions::default())
    }

    /// [`get_doc`](Self::get_doc) with per-call options.
    fn get_doc_with(&self, path: &DocPath, options: ReadOptions) -> StoreResult<DocumentSnapshot>;

    /// Create or overwrite a document (merging by default).
    fn set_doc(&self, path: &DocPath, data: Value, options: SetOptions) -> StoreResult<DocPath>;

    /// Update fields of an existing document. Keys are dotted field paths.
    ///
    /// Fails with `NotFound` if the document does not exist.
    fn update_doc(&self, path: &DocPath, data: Value) -> StoreResult<DocPath> {
        self.update_doc_with(path, data, WriteOptions::default())
    }

    /// [`update_doc`](Self::update_doc) with per-call options.
    fn update_doc_with(&self, path: &DocPath, data: Value, options: WriteOptions) -> StoreResult<DocPath>;

    /// Create a document with a generated id in `col`.
    fn add_doc(&self, col: &ColPath, data: Value) -> StoreResult<DocPath> {
        self.add_doc_with(col, data, WriteOptions::default())
    }

    /// [`add_doc`](Self::add_doc) with per-call options.
    fn add_doc_with(&self, col: &ColPath, data: Value, options: WriteOptions) -> StoreResult<DocPath>;

    /// Delete a document. Deleting a missing document is not an error.
    fn delete_doc(&self, path: &DocPath) -> StoreResult<DocPath> {
        self.delete_doc_with(path, WriteOptions::default())
    }

    /// [`delete_doc`](Self::delete_doc) with per-call options.
    fn delete_doc_with(&self, path: &DocPath, options: WriteOptions) -> StoreResult<DocPath>;

    /// Documents directly inside `col`, ordered by path.
    fn get_col(&self, col: &ColPath, query: &Query) -> StoreResult<CollectionSnapshot> {
        self.get_col_with(col, query, ReadOptions::default())
    }

    /// [`get_col`](Self::get_col) with per-call options.
    fn get_col_with(&self, col: &ColPath, query: &Query, options: ReadOptions) -> StoreResult<CollectionSnapshot>;

    /// Documents in every collection whose id is `group`, ordered by path.
    fn get_col_group(&self, group: &str, query: &Query) -> StoreResult<CollectionSnapshot> {
        self.get_col_group_with(group, query, ReadOptions::default())
    }

    /// [`get_col_group`](Self::get_col_group) with per-call options.
    fn get_col_group_with(
        &self,
        group: &str,
        query: &Query,
        options: ReadOptions,
    ) -> StoreResult<CollectionSnapshot>;

    /// Apply every write in `batch` atomically.
    fn commit_batch(&self, batch: WriteBatch) -> StoreResult<()> {
        self.commit_batch_with(batch, WriteOptions::default())
    }

    /// [`commit_batch`](Self::commit_batch) with per-call options.
    fn commit_batch_with(&self, batch: WriteBatch, options: WriteOptions) -> StoreResult<()>;

    /// Run `body` against a consistent view of the store and commit its
    /// writes atomically if it returns `Ok`.
    ///
    /// No other write can interleave between the body's reads and the
    /// commit. The body must not call back into the store. Prefer
    /// [`run_transaction`](crate::run_transaction).
    fn transact(
        &self,
        body: &mut dyn FnMut(&mut Transaction<'_>) -> StoreResult<()>,
        options: WriteOptions,
    ) -> StoreResult<()>;

    /// Receive a [`DocumentChange`](crate::DocumentChange) for every
    /// subsequent write.
    fn subscribe(&self) -> ChangeStream;
}

/// Build a batch with `f` and commit it. Nothing is written if `f` fails.
pub fn run_batch<S, F, T>(store: &S, f: F) -> StoreResult<T>
where
    S: DocumentStore + ?Sized,
    F: FnOnce(&mut WriteBatch) -> StoreResult<T>,
{
    let mut batch = WriteBatch::new();
    let out = f(&mut batch)?;
    store.commit_batch(batch)?;
    Ok(out)
}
