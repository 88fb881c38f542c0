//! Presentation flattening
//!
//! Turns a forest into a depth-first, pre-order sequence annotated with depth
//! and last-child flags. On-screen tree lines and CSV/PDF exports both consume
//! this sequence, so they always agree on row order and indentation.

use serde::Serialize;

use crate::models::{Node, TreeNode};

/// One row of the linearised hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatEntry<'a> {
    pub node: &'a Node,
    /// Depth below the top-level entry (top level is 0)
    pub level: usize,
    /// Structural parent in the forest; `None` for top-level entries
    pub parent_id: Option<&'a str>,
    /// Last element of its parent's (or the top-level) children
    pub is_last_child: bool,
}

type Pending<'a> = (&'a TreeNode, usize, Option<&'a str>, bool);

/// Flatten `roots` in depth-first pre-order
///
/// Pure and restartable: every call walks the forest afresh. Uses an explicit
/// stack, so deep hierarchies don't grow the call stack.
pub fn flatten(roots: &[TreeNode]) -> Vec<FlatEntry<'_>> {
    let mut entries = Vec::new();
    let mut stack: Vec<Pending<'_>> = Vec::new();
    push_siblings(&mut stack, roots, 0, None);

    while let Some((tree, level, parent_id, is_last_child)) = stack.pop() {
        entries.push(FlatEntry {
            node: &tree.node,
            level,
            parent_id,
            is_last_child,
        });
        push_siblings(&mut stack, &tree.children, level + 1, Some(tree.node.id.as_str()));
    }

    entries
}

/// Push in reverse so the first sibling is popped first
fn push_siblings<'a>(
    stack: &mut Vec<Pending<'a>>,
    siblings: &'a [TreeNode],
    level: usize,
    parent_id: Option<&'a str>,
) {
    let last = siblings.len().saturating_sub(1);
    for (index, tree) in siblings.iter().enumerate().rev() {
        stack.push((tree, level, parent_id, index == last));
    }
}
