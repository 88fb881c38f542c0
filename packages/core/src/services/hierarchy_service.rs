//! Hierarchy mutations for the sinoptico tree
//!
//! `HierarchyService` is the single entry point for structural changes:
//! reparenting, cross-root moves, drag-and-drop reordering, grafting copies of
//! existing items and creating products and children.
//!
//! # Batching
//!
//! Every structural mutation reads what it needs first, builds one
//! `WriteBatch`, and commits it atomically. Callers re-fetch the forest
//! afterwards.
//!
//! # Concurrency
//!
//! There is no isolation between concurrent mutations. Two moves into the same
//! sibling group read the same sibling count and may both claim the same
//! `order`; the last committed batch wins.

use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::config::SinopticoConfig;
use crate::db::NodeStore;
use crate::models::{Actor, Forest, Node, NodeKind, NodePatch, OrderUpdate};
use crate::services::sibling_order::{next_order, resequence};
use crate::services::{AuditRecorder, HierarchyError, TreeBuilder};

#[derive(Clone)]
pub struct HierarchyService {
    store: Arc<dyn NodeStore>,
    recorder: AuditRecorder,
    tree_builder: TreeBuilder,
    config: SinopticoConfig,
}

impl HierarchyService {
    /// Create a service with the default configuration
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self::with_config(store, SinopticoConfig::default())
    }

    pub fn with_config(store: Arc<dyn NodeStore>, config: SinopticoConfig) -> Self {
        Self {
            recorder: AuditRecorder::with_config(store.clone(), &config),
            tree_builder: TreeBuilder::new(store.clone()),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    /// Audit-wrapped create/update/delete for individual nodes
    pub fn recorder(&self) -> &AuditRecorder {
        &self.recorder
    }

    pub fn config(&self) -> &SinopticoConfig {
        &self.config
    }

    /// Fetch the family of `root_id` as a forest
    pub async fn build_forest(&self, root_id: &str) -> Result<Option<Forest>, HierarchyError> {
        self.tree_builder.build_forest(root_id).await
    }

    /// Move a node under a new parent, optionally into another product family
    ///
    /// The node is appended to the end of the new parent's children. The
    /// group it left is renumbered to `0..n-1` (only nodes whose order changes
    /// are written). When the effective root changes, every descendant gets
    /// the new `rootId` in the same batch.
    ///
    /// # Arguments
    ///
    /// * `item_id` - Node to move
    /// * `new_parent_id` - Parent to append it to
    /// * `new_root_id` - Product family to move into; `None` keeps the current root
    ///
    /// # Errors
    ///
    /// - `NotFound` if the node or the new parent does not exist
    /// - `InvalidArgument` if the new parent is the node itself or one of its
    ///   descendants, or (with kind rules on) cannot hold this kind of node
    pub async fn move_node(
        &self,
        item_id: &str,
        new_parent_id: &str,
        new_root_id: Option<&str>,
    ) -> Result<(), HierarchyError> {
        let node = self
            .store
            .get_node(item_id)
            .await?
            .ok_or_else(|| HierarchyError::not_found(item_id))?;

        if new_parent_id == item_id {
            return Err(HierarchyError::invalid_argument(format!(
                "node {} cannot become its own parent",
                item_id
            )));
        }

        let new_parent = self
            .store
            .get_node(new_parent_id)
            .await?
            .ok_or_else(|| HierarchyError::not_found(new_parent_id))?;

        if self.config.enforce_kind_rules {
            new_parent.kind.check_child(node.kind)?;
        }

        let descendants = self.collect_descendants(&node).await?;
        if descendants.iter().any(|d| d.id == new_parent_id) {
            return Err(HierarchyError::invalid_argument(format!(
                "cannot move node {} under its descendant {}",
                item_id, new_parent_id
            )));
        }

        let previous_root = node.root_id.clone();
        let effective_root = new_root_id.map(str::to_string).or_else(|| previous_root.clone());
        let same_parent = node.parent_id.as_deref() == Some(new_parent_id);

        let new_siblings: Vec<Node> = self
            .store
            .query_nodes_by_parent_id(Some(new_parent_id))
            .await?
            .into_iter()
            .filter(|sibling| sibling.id != item_id)
            .collect();

        // Group the node leaves: its old parent's children, or the top level
        // when it had no parent. For a same-parent move that is the new group.
        let old_siblings: Vec<Node> = if same_parent {
            new_siblings.clone()
        } else {
            self.store
                .query_nodes_by_parent_id(node.parent_id.as_deref())
                .await?
                .into_iter()
                .filter(|sibling| sibling.id != item_id)
                .collect()
        };

        let mut batch = self.store.begin_batch();
        batch.update(
            item_id,
            NodePatch::new()
                .with_parent(Some(new_parent_id))
                .with_root(effective_root.as_deref())
                .with_order(next_order(new_siblings.len())),
        );

        let renumbered = resequence(&old_siblings);
        for update in &renumbered {
            batch.update(update.id.clone(), NodePatch::new().with_order(update.order));
        }

        let root_changed = effective_root != previous_root;
        if root_changed {
            for descendant in &descendants {
                batch.update(
                    descendant.id.clone(),
                    NodePatch::new().with_root(effective_root.as_deref()),
                );
            }
        }

        tracing::debug!(
            "Move batch for {}: {} write(s), {} renumbered, root changed: {}",
            item_id,
            batch.len(),
            renumbered.len(),
            root_changed
        );
        self.store.commit_batch(batch).await?;

        tracing::info!(
            "Moved node {} under {} (root {:?} -> {:?}, {} descendant(s))",
            item_id,
            new_parent_id,
            previous_root,
            effective_root,
            descendants.len()
        );
        Ok(())
    }

    /// Graft copies of existing items under `parent_id`
    ///
    /// Each source is copied shallowly (kind and attributes only) with a fresh
    /// id, appended after the parent's current children in the order given.
    /// Sources are never modified. Missing sources, and sources whose kind the
    /// parent cannot hold, are skipped with a warning.
    ///
    /// # Returns
    ///
    /// Ids of the created copies, in source order.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `parent_id` or `root_id` is empty, or the parent
    ///   cannot hold children
    /// - `NotFound` if the parent does not exist
    pub async fn add_existing_as_children(
        &self,
        item_ids: &[String],
        parent_id: &str,
        root_id: &str,
        actor: &Actor,
    ) -> Result<Vec<String>, HierarchyError> {
        if parent_id.is_empty() || root_id.is_empty() {
            return Err(HierarchyError::invalid_argument(
                "grafted items need both a parent id and a root id",
            ));
        }

        let parent = self
            .store
            .get_node(parent_id)
            .await?
            .ok_or_else(|| HierarchyError::not_found(parent_id))?;
        if self.config.enforce_kind_rules && !parent.kind.can_have_children() {
            return Err(HierarchyError::invalid_argument(format!(
                "a {} cannot have children",
                parent.kind
            )));
        }

        let base = self
            .store
            .query_nodes_by_parent_id(Some(parent_id))
            .await?
            .len();

        let now = Utc::now();
        let mut batch = self.store.begin_batch();
        let mut copies: Vec<Node> = Vec::with_capacity(item_ids.len());

        for source_id in item_ids {
            let Some(source) = self.store.get_node(source_id).await? else {
                tracing::warn!("Skipping graft of {}: item no longer exists", source_id);
                continue;
            };

            if self.config.enforce_kind_rules && !parent.kind.accepts_child(source.kind) {
                tracing::warn!(
                    "Skipping graft of {}: a {} cannot be placed under a {}",
                    source_id,
                    source.kind,
                    parent.kind
                );
                continue;
            }

            let mut copy =
                source.copy_as_child(parent_id, root_id, next_order(base + copies.len()));
            copy.stamp_created(actor, now);
            batch.set(copy.clone());
            copies.push(copy);
        }

        if copies.is_empty() {
            tracing::debug!("Nothing to graft under {}", parent_id);
            return Ok(Vec::new());
        }

        self.store.commit_batch(batch).await?;
        tracing::info!("Grafted {} item(s) under {}", copies.len(), parent_id);

        for copy in &copies {
            self.recorder.record_created(copy, actor).await;
        }

        Ok(copies.into_iter().map(|copy| copy.id).collect())
    }

    /// Write the given sibling positions in one batch
    ///
    /// Used after drag-and-drop. Orders are written as given; keeping them
    /// contiguous is the caller's job.
    pub async fn update_items_order(&self, items: &[OrderUpdate]) -> Result<(), HierarchyError> {
        if items.is_empty() {
            return Ok(());
        }

        let mut batch = self.store.begin_batch();
        for item in items {
            batch.update(item.id.clone(), NodePatch::new().with_order(item.order));
        }

        self.store.commit_batch(batch).await?;
        tracing::debug!("Reordered {} item(s)", items.len());
        Ok(())
    }

    /// Create a node at the end of `parent_id`'s children
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `parent_id` or `root_id` is missing, or (with kind
    ///   rules on) the parent cannot hold `kind`
    /// - `NotFound` if kind rules are on and the parent does not exist
    pub async fn create_child(
        &self,
        kind: NodeKind,
        parent_id: Option<&str>,
        root_id: Option<&str>,
        attributes: Map<String, Value>,
        actor: &Actor,
    ) -> Result<String, HierarchyError> {
        let (parent_id, root_id) = match (non_empty(parent_id), non_empty(root_id)) {
            (Some(parent_id), Some(root_id)) => (parent_id, root_id),
            _ => {
                return Err(HierarchyError::invalid_argument(
                    "a child item must have a parent id and a root id",
                ))
            }
        };

        if self.config.enforce_kind_rules {
            let parent = self
                .store
                .get_node(parent_id)
                .await?
                .ok_or_else(|| HierarchyError::not_found(parent_id))?;
            parent.kind.check_child(kind)?;
        }

        let siblings = self
            .store
            .query_nodes_by_parent_id(Some(parent_id))
            .await?;
        let node = Node::new(kind, attributes)
            .with_parent(parent_id, root_id)
            .with_order(next_order(siblings.len()));

        self.recorder.create(node, actor).await
    }

    /// Create a top-level product
    ///
    /// The product's `rootId` is its own id, which is only known after the
    /// store assigns it, so this takes two writes: create, then set `rootId`.
    pub async fn create_root(
        &self,
        attributes: Map<String, Value>,
        actor: &Actor,
    ) -> Result<String, HierarchyError> {
        let top_level = self.store.query_nodes_by_parent_id(None).await?;
        let node = Node::new(NodeKind::Product, attributes).with_order(next_order(top_level.len()));

        let id = self.recorder.create(node, actor).await?;
        self.store
            .update_node(&id, NodePatch::new().with_root(Some(id.as_str())))
            .await?;

        tracing::info!("Created product {}", id);
        Ok(id)
    }

    /// Transitive descendants of `item_id`, breadth-first
    pub async fn descendants(&self, item_id: &str) -> Result<Vec<Node>, HierarchyError> {
        let node = self
            .store
            .get_node(item_id)
            .await?
            .ok_or_else(|| HierarchyError::not_found(item_id))?;
        self.collect_descendants(&node).await
    }

    /// Descendants via the node's family, or via parent queries if it has no root
    async fn collect_descendants(&self, node: &Node) -> Result<Vec<Node>, HierarchyError> {
        match node.root_id.as_deref() {
            Some(root_id) => {
                let family = self.store.query_nodes_by_root_id(root_id).await?;
                Ok(descendants_of(&node.id, &family)
                    .into_iter()
                    .cloned()
                    .collect())
            }
            None => {
                let mut found = Vec::new();
                let mut seen: HashSet<String> = HashSet::from([node.id.clone()]);
                let mut queue = VecDeque::from([node.id.clone()]);
                while let Some(parent_id) = queue.pop_front() {
                    let children = self
                        .store
                        .query_nodes_by_parent_id(Some(parent_id.as_str()))
                        .await?;
                    for child in children {
                        if seen.insert(child.id.clone()) {
                            queue.push_back(child.id.clone());
                            found.push(child);
                        }
                    }
                }
                Ok(found)
            }
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Breadth-first descendants of `item_id` within `family`, following
/// `parentId` edges
///
/// Each node is visited once, so parent cycles terminate. The item itself is
/// never included.
pub fn descendants_of<'a>(item_id: &str, family: &'a [Node]) -> Vec<&'a Node> {
    let mut result = Vec::new();
    let mut seen: HashSet<&str> = HashSet::from([item_id]);
    let mut queue: VecDeque<&str> = VecDeque::from([item_id]);

    while let Some(parent_id) = queue.pop_front() {
        for node in family {
            if node.parent_id.as_deref() == Some(parent_id) && seen.insert(node.id.as_str()) {
                queue.push_back(node.id.as_str());
                result.push(node);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, parent: Option<&str>) -> Node {
        let node = Node::new_with_id(id, NodeKind::Subproduct, Map::new()).with_root("r");
        match parent {
            Some(parent) => node.with_parent(parent, "r"),
            None => node,
        }
    }

    #[test]
    fn test_descendants_breadth_first() {
        let family = vec![
            node("r", None),
            node("a", Some("r")),
            node("b", Some("a")),
            node("c", Some("a")),
            node("d", Some("b")),
            node("other", Some("r")),
        ];

        let ids: Vec<&str> = descendants_of("a", &family)
            .iter()
            .map(|n| n.id.as_str())
            .collect();

        assert_eq!(ids, vec!["b", "c", "d"]);
    }

    #[test]
    fn test_descendants_terminates_on_cycle() {
        let family = vec![node("x", Some("y")), node("y", Some("x")), node("z", Some("y"))];

        let ids: Vec<&str> = descendants_of("x", &family)
            .iter()
            .map(|n| n.id.as_str())
            .collect();

        assert_eq!(ids, vec!["y", "z"]);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("p")), Some("p"));
    }
}
