//! NodeStore Trait - Document Store Abstraction
//!
//! This module defines the `NodeStore` trait that the hierarchy services use to
//! reach the external document store. Every service receives an explicit
//! `Arc<dyn NodeStore>` at construction, so tests run against [`MemoryStore`]
//! and production wires in the real backend adapter.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All I/O methods are async; the services suspend at each
//!    store call and never block a shared thread
//! 2. **Ownership Semantics**: Writes take ownership of nodes and patches
//! 3. **Typed Errors**: Failures are `StoreError` and propagate unchanged
//! 4. **Atomic Batches**: `commit_batch` is all-or-nothing
//! 5. **No Retries**: Retry and timeout policy belong to the adapter
//!
//! # Examples
//!
//! ```rust
//! use sinoptico_core::db::{MemoryStore, NodeStore};
//! use sinoptico_core::models::{Node, NodeKind, NodePatch};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store: Arc<dyn NodeStore> = Arc::new(MemoryStore::new());
//! let id = store.create_node(Node::new(NodeKind::Product, Default::default())).await?;
//!
//! let mut batch = store.begin_batch();
//! batch.update(id.clone(), NodePatch::new().with_root(Some(id.as_str())));
//! store.commit_batch(batch).await?;
//! # Ok::<(), sinoptico_core::db::StoreError>(())
//! # }).unwrap();
//! ```
//!
//! [`MemoryStore`]: super::MemoryStore

use async_trait::async_trait;

use super::batch::WriteBatch;
use super::error::StoreError;
use crate::models::{AuditRecord, Node, NodePatch};

/// Abstraction layer for node and audit persistence
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so services holding an
/// `Arc<dyn NodeStore>` can be shared across tasks.
///
/// # Method Categories
///
/// - **Filtered reads**: by root id, by parent id
/// - **Point operations**: get, create, update, delete
/// - **Batch**: begin + atomic commit
/// - **Audit**: append, query by item
#[async_trait]
pub trait NodeStore: Send + Sync {
    //
    // FILTERED READS
    //

    /// Every node whose `rootId` equals `root_id`, in store order
    async fn query_nodes_by_root_id(&self, root_id: &str) -> Result<Vec<Node>, StoreError>;

    /// Every node whose `parentId` equals `parent_id`, in store order
    ///
    /// `None` selects nodes without a parent reference (top-level products).
    async fn query_nodes_by_parent_id(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<Node>, StoreError>;

    //
    // POINT OPERATIONS
    //

    /// Get node by ID
    ///
    /// - `Ok(Some(node))` if the node exists
    /// - `Ok(None)` if it doesn't (not an error)
    async fn get_node(&self, id: &str) -> Result<Option<Node>, StoreError>;

    /// Persist a new node and return the identifier it was stored under
    ///
    /// The store owns id assignment: adapters may keep the id carried by
    /// `node` or replace it with one of their own. Callers must use the
    /// returned id.
    async fn create_node(&self, node: Node) -> Result<String, StoreError>;

    /// Merge a partial update into an existing node
    ///
    /// # Errors
    ///
    /// `StoreError::RecordNotFound` if the node does not exist.
    async fn update_node(&self, id: &str, patch: NodePatch) -> Result<(), StoreError>;

    /// Delete a node (idempotent; deleting a missing node succeeds)
    async fn delete_node(&self, id: &str) -> Result<(), StoreError>;

    //
    // BATCH
    //

    fn begin_batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Apply every write in `batch` or none of them
    ///
    /// # Errors
    ///
    /// `StoreError::BatchRejected` if any write fails validation (for example
    /// an update addressing a missing node); no write is visible afterwards.
    async fn commit_batch(&self, batch: WriteBatch) -> Result<(), StoreError>;

    //
    // AUDIT
    //

    async fn append_audit_record(&self, record: AuditRecord) -> Result<(), StoreError>;

    /// Audit records for one item, newest first
    async fn query_audit_records(&self, item_id: &str) -> Result<Vec<AuditRecord>, StoreError>;
}
