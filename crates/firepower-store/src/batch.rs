use firepower_types::Value;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::path::{ColPath, DocPath};
use crate::traits::SetOptions;

/// One write inside a [`WriteBatch`].
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    Set {
        path: DocPath,
        data: Value,
        options: SetOptions,
    },
    Update {
        path: DocPath,
        data: Value,
    },
    Delete {
        path: DocPath,
    },
}

impl WriteOp {
    /// The document this write targets.
    pub fn path(&self) -> &DocPath {
        match self {
            Self::Set { path, .. } | Self::Update { path, .. } | Self::Delete { path } => path,
        }
    }

    /// Operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set_doc",
            Self::Update { .. } => "update_doc",
            Self::Delete { .. } => "delete_doc",
        }
    }
}

/// Writes committed together: all of them apply, or none do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// An empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a set.
    pub fn set(&mut self, path: DocPath, data: Value, options: SetOptions) -> &mut Self {
        self.ops.push(WriteOp::Set { path, data, options });
        self
    }

    /// Stage an update of an existing document.
    pub fn update(&mut self, path: DocPath, data: Value) -> &mut Self {
        self.ops.push(WriteOp::Update { path, data });
        self
    }

    /// Stage a delete.
    pub fn delete(&mut self, path: DocPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    /// Queue a create under a fresh id in `col` and return the new path.
    pub fn add(&mut self, col: &ColPath, data: Value) -> StoreResult<DocPath> {
        let path = col.doc(&new_document_id())?;
        self.ops.push(WriteOp::Set {
            path: path.clone(),
            data,
            options: SetOptions::replace(),
        });
        Ok(path)
    }

    /// Number of staged writes.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The staged writes in order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch, returning its writes.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// A fresh, time-ordered document id.
pub(crate) fn new_document_id() -> String {
    Uuid::now_v7().simple().to_string()
}
