//! Lifecycle and audit recording
//!
//! Wraps node create/update/delete with append-only audit records.
//!
//! # Durability
//!
//! Audit writes are best-effort: the primary mutation is the source of truth,
//! and a failed audit append is logged with `tracing::warn!` and otherwise
//! ignored. It never rolls back or fails the primary operation.

use chrono::Utc;
use std::sync::Arc;

use crate::config::SinopticoConfig;
use crate::db::NodeStore;
use crate::models::{diff_payloads, Actor, AuditRecord, Node, NodePatch};
use crate::services::HierarchyError;

#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn NodeStore>,
    enabled: bool,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self::with_config(store, &SinopticoConfig::default())
    }

    pub fn with_config(store: Arc<dyn NodeStore>, config: &SinopticoConfig) -> Self {
        Self {
            store,
            enabled: config.audit_enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Persist a new node and record its full payload
    ///
    /// Creator/modifier metadata is stamped from `actor`. Returns the id the
    /// store assigned.
    pub async fn create(&self, mut node: Node, actor: &Actor) -> Result<String, HierarchyError> {
        node.validate()?;
        node.stamp_created(actor, Utc::now());

        let id = self.store.create_node(node.clone()).await?;
        node.id = id.clone();
        tracing::debug!("Created {} node {}", node.kind, id);

        self.record_created(&node, actor).await;
        Ok(id)
    }

    /// Apply a partial update and record the fields that actually changed
    ///
    /// The diff covers only the fields named in `patch`; if none of them
    /// changed value no record is written.
    ///
    /// Placement is owned by `HierarchyService`: moves keep sibling groups
    /// contiguous and cascade `rootId` to descendants, which a plain patch
    /// cannot do.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node does not exist
    /// - `InvalidArgument` if the patch writes a reserved attribute or
    ///   touches `parentId`, `rootId` or `order`
    pub async fn update(
        &self,
        id: &str,
        patch: NodePatch,
        actor: &Actor,
    ) -> Result<(), HierarchyError> {
        patch.validate()?;
        if patch.changes_placement() {
            return Err(HierarchyError::invalid_argument(format!(
                "update of node {} cannot change parentId, rootId or order; use HierarchyService",
                id
            )));
        }

        let before = self
            .store
            .get_node(id)
            .await?
            .ok_or_else(|| HierarchyError::not_found(id))?;

        let fields = patch.field_names();
        let patch = patch.stamped(actor, Utc::now());
        let mut after = before.clone();
        after.apply(&patch);

        self.store.update_node(id, patch).await?;

        let changes = diff_payloads(
            &before.payload(),
            &after.payload(),
            fields.iter().map(String::as_str),
        );
        if changes.is_empty() {
            tracing::debug!("Update of node {} changed nothing, no audit record", id);
            return Ok(());
        }

        self.append(AuditRecord::updated(id, actor, changes)).await;
        Ok(())
    }

    /// Record the deletion, then delete
    ///
    /// The record is appended first so it is written while the item still
    /// resolves.
    pub async fn delete(&self, id: &str, actor: &Actor) -> Result<(), HierarchyError> {
        if self.store.get_node(id).await?.is_none() {
            return Err(HierarchyError::not_found(id));
        }

        self.append(AuditRecord::deleted(id, actor)).await;
        self.store.delete_node(id).await?;
        tracing::debug!("Deleted node {}", id);
        Ok(())
    }

    /// Audit records for `item_id`, newest first
    pub async fn get_audit_log(&self, item_id: &str) -> Result<Vec<AuditRecord>, HierarchyError> {
        let mut records = self.store.query_audit_records(item_id).await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    /// Record a node that was persisted outside `create` (batch grafts)
    pub(crate) async fn record_created(&self, node: &Node, actor: &Actor) {
        self.append(AuditRecord::created(&node.id, actor, node.payload()))
            .await;
    }

    async fn append(&self, record: AuditRecord) {
        if !self.enabled {
            return;
        }

        let item_id = record.item_id.clone();
        let action = record.action();
        if let Err(e) = self.store.append_audit_record(record).await {
            tracing::warn!(
                "Failed to write {:?} audit record for node {}: {}",
                action,
                item_id,
                e
            );
        }
    }
}
