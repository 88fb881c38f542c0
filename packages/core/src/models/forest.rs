//! In-memory hierarchy reconstruction
//!
//! A `Forest` is rebuilt on every hierarchy fetch and discarded after use. It
//! is always acyclic: nodes caught in parent cycles are surfaced as extra
//! top-level entries and reported through `warnings`.

use serde::Serialize;

use super::node::Node;
use crate::services::flattener::{flatten, FlatEntry};

/// A node together with its ordered children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: Node,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }
}

/// Data-integrity anomalies found while assembling a forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ForestWarning {
    /// `parent_id` does not resolve within the fetched family
    #[serde(rename_all = "camelCase")]
    Orphan { node_id: String, parent_id: String },
    /// Nodes unreachable from any top-level entry, lifted to the top level
    #[serde(rename_all = "camelCase")]
    Cycle { node_ids: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Forest {
    pub roots: Vec<TreeNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ForestWarning>,
}

impl Forest {
    pub fn single(node: Node) -> Self {
        Self {
            roots: vec![TreeNode::leaf(node)],
            warnings: Vec::new(),
        }
    }

    /// Total number of nodes in the forest
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&TreeNode> = self.roots.iter().collect();
        while let Some(tree) = stack.pop() {
            count += 1;
            stack.extend(tree.children.iter());
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Locate a node anywhere in the forest
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        let mut stack: Vec<&TreeNode> = self.roots.iter().collect();
        while let Some(tree) = stack.pop() {
            if tree.node.id == id {
                return Some(tree);
            }
            stack.extend(tree.children.iter());
        }
        None
    }

    pub fn has_cycles(&self) -> bool {
        self.warnings
            .iter()
            .any(|warning| matches!(warning, ForestWarning::Cycle { .. }))
    }

    /// Depth-first, level-annotated view for rendering and export
    pub fn flatten(&self) -> Vec<FlatEntry<'_>> {
        flatten(&self.roots)
    }
}
