//! Atomic write batches
//!
//! A `WriteBatch` is built in memory and handed to
//! [`NodeStore::commit_batch`](super::NodeStore::commit_batch), which applies
//! every operation or none of them.

use crate::models::{Node, NodePatch};

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    /// Merge a partial update into an existing record
    Update { id: String, patch: NodePatch },
    /// Write a complete record, creating or replacing it
    Set { node: Node },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, id: impl Into<String>, patch: NodePatch) -> &mut Self {
        self.ops.push(BatchOp::Update {
            id: id.into(),
            patch,
        });
        self
    }

    pub fn set(&mut self, node: Node) -> &mut Self {
        self.ops.push(BatchOp::Set { node });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}
