//! Forest Fetch Tests
//!
//! `TreeBuilder::build_forest` against the store: fallbacks, anomalies and
//! error propagation.

#[cfg(test)]
mod forest_fetch_tests {
    use anyhow::Result;
    use serde_json::Map;
    use sinoptico_core::db::{MemoryStore, StoreError};
    use sinoptico_core::models::{ForestWarning, Node, NodeKind};
    use sinoptico_core::services::{HierarchyError, TreeBuilder};
    use std::sync::Arc;

    fn builder(nodes: Vec<Node>) -> (Arc<MemoryStore>, TreeBuilder) {
        let store = Arc::new(MemoryStore::with_nodes(nodes));
        let builder = TreeBuilder::new(store.clone());
        (store, builder)
    }

    #[tokio::test]
    async fn test_fresh_product_falls_back_to_point_read() -> Result<()> {
        // rootId not written yet
        let (_store, builder) = builder(vec![Node::new_with_id("P", NodeKind::Product, Map::new())]);

        let forest = builder
            .build_forest("P")
            .await?
            .ok_or_else(|| anyhow::anyhow!("forest missing"))?;

        assert_eq!(forest.roots.len(), 1);
        assert_eq!(forest.roots[0].node.id, "P");
        assert!(forest.roots[0].children.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_root_is_none() -> Result<()> {
        let (_store, builder) = builder(vec![]);

        assert!(builder.build_forest("nothing").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_cycle_in_family_is_tolerated() -> Result<()> {
        let (_store, builder) = builder(vec![
            Node::new_with_id("A", NodeKind::Subproduct, Map::new()).with_parent("B", "R"),
            Node::new_with_id("B", NodeKind::Subproduct, Map::new()).with_parent("A", "R"),
        ]);

        let forest = builder
            .build_forest("R")
            .await?
            .ok_or_else(|| anyhow::anyhow!("forest missing"))?;

        assert_eq!(forest.roots.len(), 2);
        assert!(forest.roots.iter().all(|tree| tree.children.is_empty()));
        assert!(matches!(forest.warnings[0], ForestWarning::Cycle { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_store_error_propagates_unchanged() -> Result<()> {
        let (store, builder) = builder(vec![]);
        store.set_fail_reads(true);

        let err = builder.build_forest("R").await.unwrap_err();

        assert_eq!(
            err,
            HierarchyError::StoreUnavailable(StoreError::unavailable("read failure injected"))
        );
        Ok(())
    }
}
