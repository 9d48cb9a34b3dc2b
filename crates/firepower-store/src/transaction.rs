//! Read-modify-write transactions.
//!
//! A [`Transaction`] stages writes over a fixed view of the stored
//! documents. Reads inside the transaction see its own staged writes. The
//! staged writes are committed together, or not at all.

use std::collections::{BTreeMap, HashMap};

use firepower_types::{Mapping, Value};

use crate::batch::{new_document_id, WriteOp};
use crate::change::DocumentChange;
use crate::error::{StoreError, StoreResult};
use crate::path::{ColPath, DocPath};
use crate::query::Query;
use crate::snapshot::{CollectionSnapshot, DocumentSnapshot};
use crate::traits::{DocumentStore, SetOptions, WriteOptions};
use crate::write::{document_data, resolve_set, resolve_update};

/// Staged writes over a view of the store.
///
/// Obtained through [`run_transaction`]. A write that fails is not staged,
/// so the body may recover from it or return the error to abort.
pub struct Transaction<'a> {
    base: &'a BTreeMap<DocPath, Mapping>,
    staged: HashMap<DocPath, Option<Mapping>>,
    changes: Vec<DocumentChange>,
    now: String,
}

impl<'a> Transaction<'a> {
    /// A transaction over `base`, resolving server timestamps to `now`.
    pub(crate) fn new(base: &'a BTreeMap<DocPath, Mapping>, now: String) -> Self {
        Self {
            base,
            staged: HashMap::new(),
            changes: Vec::new(),
            now,
        }
    }

    fn current(&self, path: &DocPath) -> Option<Mapping> {
        match self.staged.get(path) {
            Some(doc) => doc.clone(),
            None => self.base.get(path).cloned(),
        }
    }

    /// Read a document, including writes staged earlier in this transaction.
    pub fn get_doc(&self, path: &DocPath) -> StoreResult<DocumentSnapshot> {
        Ok(DocumentSnapshot::new(path.clone(), self.current(path).map(Value::Mapping)))
    }

    /// Documents directly inside `col`, including staged writes.
    pub fn get_col(&self, col: &ColPath, query: &Query) -> StoreResult<CollectionSnapshot> {
        self.select(query, |path| col.contains(path))
    }

    /// Documents in every collection whose id is `group`, including staged
    /// writes.
    pub fn get_col_group(&self, group: &str, query: &Query) -> StoreResult<CollectionSnapshot> {
        self.select(query, |path| path.parent().id() == group)
    }

    /// Stage a set.
    pub fn set_doc(&mut self, path: &DocPath, data: Value, options: SetOptions) -> StoreResult<DocPath> {
        self.apply(WriteOp::Set {
            path: path.clone(),
            data,
            options,
        })?;
        Ok(path.clone())
    }

    /// Stage an update of an existing document.
    pub fn update_doc(&mut self, path: &DocPath, data: Value) -> StoreResult<DocPath> {
        self.apply(WriteOp::Update {
            path: path.clone(),
            data,
        })?;
        Ok(path.clone())
    }

    /// Stage a create under a fresh id in `col`.
    pub fn add_doc(&mut self, col: &ColPath, data: Value) -> StoreResult<DocPath> {
        let path = col.doc(&new_document_id())?;
        self.set_doc(&path, data, SetOptions::replace())
    }

    /// Stage a delete.
    pub fn delete_doc(&mut self, path: &DocPath) -> StoreResult<DocPath> {
        self.apply(WriteOp::Delete { path: path.clone() })?;
        Ok(path.clone())
    }

    /// Number of writes staged so far.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Resolve `op` against the current view and stage the result.
    pub(crate) fn apply(&mut self, op: WriteOp) -> StoreResult<()> {
        let path = op.path();
        let before = self.current(path);
        let after = match &op {
            WriteOp::Set { data, options, .. } => Some(resolve_set(
                before.as_ref(),
                document_data(data)?,
                options.merge,
                &self.now,
            )?),
            WriteOp::Update { data, .. } => {
                let existing = before
                    .as_ref()
                    .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
                Some(resolve_update(existing, document_data(data)?, &self.now)?)
            }
            WriteOp::Delete { .. } => None,
        };

        self.staged.insert(path.clone(), after.clone());
        self.changes.push(DocumentChange {
            path: path.clone(),
            before: before.map(Value::Mapping),
            after: after.map(Value::Mapping),
        });
        Ok(())
    }

    /// The final state of every touched document, and one change per write.
    pub(crate) fn into_parts(self) -> (HashMap<DocPath, Option<Mapping>>, Vec<DocumentChange>) {
        (self.staged, self.changes)
    }

    fn select<F>(&self, query: &Query, include: F) -> StoreResult<CollectionSnapshot>
    where
        F: Fn(&DocPath) -> bool,
    {
        let mut view: BTreeMap<&DocPath, Option<&Mapping>> = self
            .base
            .iter()
            .filter(|(path, _)| include(path))
            .map(|(path, doc)| (path, Some(doc)))
            .collect();
        for (path, doc) in &self.staged {
            if include(path) {
                view.insert(path, doc.as_ref());
            }
        }

        let docs = view.into_iter().filter_map(|(path, doc)| {
            doc.map(|doc| DocumentSnapshot::new(path.clone(), Some(Value::Mapping(doc.clone()))))
        });
        Ok(CollectionSnapshot {
            docs: query.execute(docs)?,
        })
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("staged_writes", &self.changes.len())
            .finish()
    }
}

/// Run `f` as a transaction and return its result.
///
/// Writes staged by `f` are committed atomically when it returns `Ok`.
/// Nothing is written if it returns `Err`. `f` must not call `store`
/// directly; it reads and writes through the [`Transaction`].
pub fn run_transaction<S, F, T>(store: &S, f: F) -> StoreResult<T>
where
    S: DocumentStore + ?Sized,
    F: FnOnce(&mut Transaction<'_>) -> StoreResult<T>,
{
    run_transaction_with(store, WriteOptions::default(), f)
}

/// [`run_transaction`] with per-call logging options.
pub fn run_transaction_with<S, F, T>(store: &S, options: WriteOptions, f: F) -> StoreResult<T>
where
    S: DocumentStore + ?Sized,
    F: FnOnce(&mut Transaction<'_>) -> StoreResult<T>,
{
    let mut body = Some(f);
    let mut out = None;
    store.transact(
        &mut |tx| {
            let f = body
                .take()
                .ok_or_else(|| StoreError::Transaction("transaction body ran more than once".into()))?;
            out = Some(f(tx)?);
            Ok(())
        },
        options,
    )?;
    out.ok_or_else(|| StoreError::Transaction("transaction body did not run".into()))
}
