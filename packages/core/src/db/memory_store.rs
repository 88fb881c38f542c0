//! In-process `NodeStore` implementation
//!
//! Keeps nodes in insertion order behind a `tokio::sync::RwLock`, which makes
//! filtered reads deterministic (store order = insertion order). Used as the
//! test double for the hierarchy services and for embedding the engine without
//! a remote backend.
//!
//! Failure injection (`set_fail_reads`, `set_fail_audit_writes`) and the commit
//! counter let tests observe atomicity and best-effort audit behaviour.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::batch::{BatchOp, WriteBatch};
use super::error::StoreError;
use super::node_store::NodeStore;
use crate::models::{AuditRecord, Node, NodePatch};

#[derive(Debug, Default)]
struct State {
    nodes: Vec<Node>,
    audit: Vec<AuditRecord>,
}

impl State {
    fn position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.id == id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    fail_reads: AtomicBool,
    fail_audit_writes: AtomicBool,
    committed_batches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store; nodes keep the given order and ids
    pub fn with_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        Self {
            state: RwLock::new(State {
                nodes: nodes.into_iter().collect(),
                audit: Vec::new(),
            }),
            ..Self::default()
        }
    }

    /// Make every read fail with `StoreError::Unavailable`
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make audit appends fail with `StoreError::Unavailable`
    pub fn set_fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of batches successfully committed
    pub fn committed_batches(&self) -> usize {
        self.committed_batches.load(Ordering::SeqCst)
    }

    /// Copy of every stored node, in store order
    pub async fn snapshot(&self) -> Vec<Node> {
        self.state.read().await.nodes.clone()
    }

    /// Copy of every audit record, in append order
    pub async fn audit_records(&self) -> Vec<AuditRecord> {
        self.state.read().await.audit.clone()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("read failure injected"));
        }
        Ok(())
    }
}

fn apply_op(nodes: &mut Vec<Node>, op: BatchOp) -> Result<(), StoreError> {
    match op {
        BatchOp::Update { id, patch } => {
            let node = nodes
                .iter_mut()
                .find(|node| node.id == id)
                .ok_or_else(|| StoreError::batch_rejected(format!("update of missing node {}", id)))?;
            node.apply(&patch);
        }
        BatchOp::Set { node } => match nodes.iter_mut().find(|existing| existing.id == node.id) {
            Some(existing) => *existing = node,
            None => nodes.push(node),
        },
    }
    Ok(())
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn query_nodes_by_root_id(&self, root_id: &str) -> Result<Vec<Node>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().await;
        Ok(state
            .nodes
            .iter()
            .filter(|node| node.root_id.as_deref() == Some(root_id))
            .cloned()
            .collect())
    }

    async fn query_nodes_by_parent_id(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<Node>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().await;
        Ok(state
            .nodes
            .iter()
            .filter(|node| node.parent_id.as_deref() == parent_id)
            .cloned()
            .collect())
    }

    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().await;
        Ok(state.position(id).map(|index| state.nodes[index].clone()))
    }

    async fn create_node(&self, mut node: Node) -> Result<String, StoreError> {
        let mut state = self.state.write().await;
        if node.id.is_empty() || state.position(&node.id).is_some() {
            node.id = Uuid::new_v4().to_string();
        }
        let id = node.id.clone();
        state.nodes.push(node);
        Ok(id)
    }

    async fn update_node(&self, id: &str, patch: NodePatch) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let index = state
            .position(id)
            .ok_or_else(|| StoreError::record_not_found(id))?;
        state.nodes[index].apply(&patch);
        Ok(())
    }

    async fn delete_node(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.nodes.retain(|node| node.id != id);
        Ok(())
    }

    async fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut state = self.state.write().await;

        // Stage on a copy so a rejected write leaves nothing behind
        let mut staged = state.nodes.clone();
        for op in batch.into_ops() {
            apply_op(&mut staged, op)?;
        }

        state.nodes = staged;
        self.committed_batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn append_audit_record(&self, record: AuditRecord) -> Result<(), StoreError> {
        if self.fail_audit_writes.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("audit write failure injected"));
        }
        self.state.write().await.audit.push(record);
        Ok(())
    }

    async fn query_audit_records(&self, item_id: &str) -> Result<Vec<AuditRecord>, StoreError> {
        self.check_reads()?;
        let state = self.state.read().await;
        // Reverse first so equal timestamps still come out newest-appended first
        let mut records: Vec<AuditRecord> = state
            .audit
            .iter()
            .rev()
            .filter(|record| record.item_id == item_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}
