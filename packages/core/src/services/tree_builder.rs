//! Forest reconstruction
//!
//! Rebuilds a product family from the flat set of nodes sharing its `rootId`.
//!
//! # Algorithm
//!
//! 1. Index nodes by id in an arena (fetch order = arena index)
//! 2. Attach each node under its parent when the parent is in the family,
//!    otherwise make it a top-level entry (roots and orphans alike)
//! 3. Stable-sort every child list and the top level by `order`
//! 4. Walk from the top level; any node not reached sits in or below a parent
//!    cycle. Its unreached children are detached and the node itself is
//!    appended to the top level, so the result is acyclic and complete
//! 5. Materialise owned `TreeNode`s bottom-up without recursion
//!
//! Orphans and cycles are reported as `ForestWarning`s and logged; they never
//! fail the fetch.

use std::collections::HashMap;
use std::sync::Arc;

use crate::db::NodeStore;
use crate::models::{Forest, ForestWarning, Node, TreeNode};
use crate::services::HierarchyError;

/// Builds forests for one product family at a time
#[derive(Clone)]
pub struct TreeBuilder {
    store: Arc<dyn NodeStore>,
}

impl TreeBuilder {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        Self { store }
    }

    /// Fetch and assemble the family of `root_id`
    ///
    /// Falls back to a point read of `root_id` when the family query is empty,
    /// which covers a product whose own `rootId` has not been written yet.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(forest))` when the family (or the lone product) exists
    /// - `Ok(None)` when nothing is stored under `root_id`
    ///
    /// # Errors
    ///
    /// Only store failures, propagated unchanged.
    pub async fn build_forest(&self, root_id: &str) -> Result<Option<Forest>, HierarchyError> {
        let nodes = self.store.query_nodes_by_root_id(root_id).await?;

        if nodes.is_empty() {
            tracing::debug!("No family found for root {}, trying point read", root_id);
            return Ok(self.store.get_node(root_id).await?.map(Forest::single));
        }

        tracing::debug!("Assembling forest for root {} from {} nodes", root_id, nodes.len());
        Ok(Some(assemble_forest(nodes)))
    }
}

/// Assemble a forest from a flat family, in fetch order
pub fn assemble_forest(nodes: Vec<Node>) -> Forest {
    let count = nodes.len();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(count);
    for (position, node) in nodes.iter().enumerate() {
        index.entry(node.id.as_str()).or_insert(position);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut top_level: Vec<usize> = Vec::new();
    let mut warnings = Vec::new();

    for (position, node) in nodes.iter().enumerate() {
        let parent = node
            .parent_id
            .as_deref()
            .and_then(|parent_id| index.get(parent_id).copied());

        match parent {
            Some(parent) => children[parent].push(position),
            None => {
                if let Some(parent_id) = &node.parent_id {
                    tracing::warn!(
                        "Node {} references missing parent {}, showing it at top level",
                        node.id,
                        parent_id
                    );
                    warnings.push(ForestWarning::Orphan {
                        node_id: node.id.clone(),
                        parent_id: parent_id.clone(),
                    });
                }
                top_level.push(position);
            }
        }
    }

    let order_of = |position: &usize| nodes[*position].order;
    top_level.sort_by_key(order_of);
    for group in children.iter_mut() {
        group.sort_by_key(order_of);
    }

    // Reachability from the top level
    let mut visited = vec![false; count];
    let mut stack: Vec<usize> = top_level.clone();
    while let Some(position) = stack.pop() {
        if visited[position] {
            continue;
        }
        visited[position] = true;
        stack.extend(children[position].iter().copied());
    }

    let unreached: Vec<usize> = (0..count).filter(|position| !visited[*position]).collect();
    if !unreached.is_empty() {
        for &position in &unreached {
            children[position].retain(|child| visited[*child]);
            top_level.push(position);
        }

        let node_ids: Vec<String> = unreached
            .iter()
            .map(|position| nodes[*position].id.clone())
            .collect();
        tracing::warn!(
            "Parent cycle detected, lifting {} node(s) to top level: {:?}",
            node_ids.len(),
            node_ids
        );
        warnings.push(ForestWarning::Cycle { node_ids });
    }

    let roots = materialise(nodes, &children, &top_level);
    Forest { roots, warnings }
}

/// Build owned trees bottom-up from the acyclic arena
fn materialise(nodes: Vec<Node>, children: &[Vec<usize>], top_level: &[usize]) -> Vec<TreeNode> {
    let mut slots: Vec<Option<Node>> = nodes.into_iter().map(Some).collect();
    let mut built: Vec<Option<TreeNode>> = (0..slots.len()).map(|_| None).collect();

    // Post-order walk: (position, children already pushed)
    let mut stack: Vec<(usize, bool)> = top_level.iter().rev().map(|&p| (p, false)).collect();
    while let Some((position, expanded)) = stack.pop() {
        if expanded {
            let child_trees = children[position]
                .iter()
                .filter_map(|child| built[*child].take())
                .collect();
            if let Some(node) = slots[position].take() {
                built[position] = Some(TreeNode {
                    node,
                    children: child_trees,
                });
            }
        } else {
            stack.push((position, true));
            stack.extend(children[position].iter().rev().map(|&child| (child, false)));
        }
    }

    top_level
        .iter()
        .filter_map(|position| built[*position].take())
        .collect()
}
