//! Creation Tests
//!
//! `create_root` and `create_child` placement, linkage checks and kind rules.

#[cfg(test)]
mod create_tests {
    use anyhow::Result;
    use serde_json::{json, Map, Value};
    use sinoptico_core::db::{MemoryStore, NodeStore};
    use sinoptico_core::models::{Actor, AuditAction, Node, NodeKind};
    use sinoptico_core::services::{HierarchyError, HierarchyService};
    use std::sync::Arc;

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn actor() -> Actor {
        Actor::new("user-1", None)
    }

    fn setup(nodes: Vec<Node>) -> (Arc<MemoryStore>, HierarchyService) {
        let store = Arc::new(MemoryStore::with_nodes(nodes));
        let service = HierarchyService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn test_create_root_sets_own_root_id() -> Result<()> {
        let (store, service) = setup(vec![]);

        let first = service
            .create_root(attrs(json!({"name": "Table", "code": "T-100"})), &actor())
            .await?;
        let second = service.create_root(attrs(json!({"name": "Chair"})), &actor()).await?;

        let first_node = store.get_node(&first).await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
        assert_eq!(first_node.kind, NodeKind::Product);
        assert_eq!(first_node.parent_id, None);
        assert_eq!(first_node.root_id.as_deref(), Some(first.as_str()));
        assert_eq!(first_node.order, 0);
        assert_eq!(first_node.created_by.as_deref(), Some("user-1"));

        let second_node = store.get_node(&second).await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
        assert_eq!(second_node.order, 1);

        let forest = service
            .build_forest(&first)
            .await?
            .ok_or_else(|| anyhow::anyhow!("forest missing"))?;
        assert_eq!(forest.len(), 1);

        let log = service.recorder().get_audit_log(&first).await?;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].action(), AuditAction::Create);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_child_appends_to_group() -> Result<()> {
        let (store, service) = setup(vec![
            Node::new_with_id("R", NodeKind::Product, Map::new()).with_root("R"),
            Node::new_with_id("S", NodeKind::Subproduct, Map::new()).with_parent("R", "R"),
        ]);

        let id = service
            .create_child(
                NodeKind::Supply,
                Some("R"),
                Some("R"),
                attrs(json!({"name": "Glue", "weight": 0.2})),
                &actor(),
            )
            .await?;

        let node = store.get_node(&id).await?.ok_or_else(|| anyhow::anyhow!("missing"))?;
        assert_eq!(node.parent_id.as_deref(), Some("R"));
        assert_eq!(node.root_id.as_deref(), Some("R"));
        assert_eq!(node.order, 1);
        assert_eq!(node.label(), "Glue");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_child_requires_parent_and_root() -> Result<()> {
        let (store, service) = setup(vec![]);

        for (parent, root) in [(None, Some("R")), (Some("R"), None), (Some(""), Some("R"))] {
            let err = service
                .create_child(NodeKind::Supply, parent, root, Map::new(), &actor())
                .await
                .unwrap_err();
            assert!(matches!(err, HierarchyError::InvalidArgument(_)));
        }

        assert!(store.snapshot().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_child_kind_rules() -> Result<()> {
        let (_store, service) = setup(vec![
            Node::new_with_id("R", NodeKind::Product, Map::new()).with_root("R"),
            Node::new_with_id("I", NodeKind::Supply, Map::new()).with_parent("R", "R"),
        ]);

        let err = service
            .create_child(NodeKind::Supply, Some("I"), Some("R"), Map::new(), &actor())
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidArgument(_)));

        let err = service
            .create_child(NodeKind::Product, Some("R"), Some("R"), Map::new(), &actor())
            .await
            .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidArgument(_)));

        let err = service
            .create_child(NodeKind::Supply, Some("ghost"), Some("R"), Map::new(), &actor())
            .await
            .unwrap_err();
        assert_eq!(err, HierarchyError::not_found("ghost"));
        Ok(())
    }

    #[tokio::test]
    async fn test_reserved_attribute_rejected() -> Result<()> {
        let (store, service) = setup(vec![]);

        let err = service
            .create_root(attrs(json!({"parentId": "sneaky"})), &actor())
            .await
            .unwrap_err();

        assert!(matches!(err, HierarchyError::InvalidArgument(_)));
        assert!(store.snapshot().await.is_empty());
        Ok(())
    }
}
