//! Sibling-order bookkeeping for sibling groups (nodes sharing a `parentId`)
//!
//! Orders are zero-based and contiguous after every mutation that changes
//! group membership. Reads tolerate gaps and duplicates; ties keep store order.

use crate::models::{Node, OrderUpdate};

/// Order for a node appended to a group of `sibling_count` members
pub fn next_order(sibling_count: usize) -> i64 {
    sibling_count as i64
}

/// Renumber a group to `0..n-1`, preserving relative order
///
/// Only nodes whose order actually changes are returned, so callers never
/// issue no-op writes.
pub fn resequence<'a>(siblings: impl IntoIterator<Item = &'a Node>) -> Vec<OrderUpdate> {
    let mut group: Vec<&Node> = siblings.into_iter().collect();
    group.sort_by_key(|node| node.order);

    group
        .into_iter()
        .enumerate()
        .filter(|(position, node)| node.order != *position as i64)
        .map(|(position, node)| OrderUpdate::new(node.id.clone(), position as i64))
        .collect()
}

/// Whether a group's orders already form `0..n-1`
pub fn is_contiguous<'a>(siblings: impl IntoIterator<Item = &'a Node>) -> bool {
    let mut orders: Vec<i64> = siblings.into_iter().map(|node| node.order).collect();
    orders.sort_unstable();
    orders
        .iter()
        .enumerate()
        .all(|(position, order)| *order == position as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeKind;
    use serde_json::Map;

    fn sibling(id: &str, order: i64) -> Node {
        Node::new_with_id(id, NodeKind::Supply, Map::new())
            .with_parent("p", "r")
            .with_order(order)
    }

    #[test]
    fn test_next_order() {
        assert_eq!(next_order(0), 0);
        assert_eq!(next_order(3), 3);
    }

    #[test]
    fn test_resequence_closes_gap_and_skips_correct_nodes() {
        // "b" (order 1) was moved away
        let group = vec![sibling("a", 0), sibling("c", 2), sibling("d", 3)];

        let updates = resequence(&group);

        assert_eq!(
            updates,
            vec![OrderUpdate::new("c", 1), OrderUpdate::new("d", 2)]
        );
    }

    #[test]
    fn test_resequence_preserves_relative_order_and_ties() {
        let group = vec![sibling("x", 5), sibling("y", 2), sibling("z", 2)];

        let updates = resequence(&group);

        assert_eq!(
            updates,
            vec![
                OrderUpdate::new("y", 0),
                OrderUpdate::new("z", 1),
                OrderUpdate::new("x", 2),
            ]
        );
    }

    #[test]
    fn test_resequence_contiguous_group_is_noop() {
        let group = vec![sibling("a", 0), sibling("b", 1)];
        assert!(resequence(&group).is_empty());
        assert!(is_contiguous(&group));
        assert!(!is_contiguous(&[sibling("a", 0), sibling("b", 2)]));
    }
}
