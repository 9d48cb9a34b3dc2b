//! Document storage for Firepower.
//!
//! Documents live at slash-separated paths that alternate collection and
//! document ids (`users/alice/posts/p1`). Document data is always a
//! [`Value::Mapping`](firepower_types::Value::Mapping).
//!
//! # Storage Backends
//!
//! All backends implement the [`DocumentStore`] trait:
//!
//! - [`InMemoryDocumentStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Sentinels in written data are resolved at write time; stored documents
//!    never contain sentinels.
//! 2. A batch or transaction commits all of its writes or none of them.
//! 3. Every successful write publishes a [`DocumentChange`] to subscribers;
//!    watches are built on that stream.
//! 4. Every operation is logged with its path, name, and duration. Writes
//!    are announced at `info` unless the call opts out; reads only when the
//!    call opts in.

pub mod batch;
pub mod change;
pub mod config;
pub mod error;
pub mod memory;
pub mod paginate;
pub mod path;
pub mod query;
pub mod snapshot;
pub mod traits;
pub mod transaction;
pub mod watch;

mod oplog;
mod write;

pub use batch::{WriteBatch, WriteOp};
pub use change::{ChangeKind, ChangeStream, DocumentChange};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryDocumentStore;
pub use paginate::{get_col_group_in_batches, get_col_in_batches, BatchControl};
pub use path::{ColPath, DocPath};
pub use query::Query;
pub use snapshot::{CollectionSnapshot, DocumentSnapshot};
pub use traits::{run_batch, DocumentStore, ReadOptions, SetOptions, WriteOptions};
pub use transaction::{run_transaction, run_transaction_with, Transaction};
pub use watch::{watch_col, watch_col_group, watch_doc, ColWatch, DocWatch, WatchOptions};
