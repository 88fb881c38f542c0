//! Audit Trail Records
//!
//! Append-only change records written by the audit recorder around node
//! create/update/delete. Records are never mutated once stored.
//!
//! # Wire Format
//!
//! The action tag is flattened into the record, with the create payload under
//! `createdData` and update diffs under `changes`:
//!
//! ```json
//! {"id":"…","itemId":"n1","actor":{"id":"u1","email":"a@b.c"},
//!  "timestamp":"2025-01-03T10:00:00Z","action":"update",
//!  "changes":{"name":{"from":"Old","to":"New"}}}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Identity of the user performing an operation, as supplied by the
/// authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// Before/after values of one changed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub from: Value,
    pub to: Value,
}

/// Action-specific body of an audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AuditChange {
    Create {
        #[serde(rename = "createdData")]
        created_data: Map<String, Value>,
    },
    Update {
        changes: BTreeMap<String, FieldChange>,
    },
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: String,
    pub item_id: String,
    pub actor: Actor,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub change: AuditChange,
}

impl AuditRecord {
    fn with_change(item_id: &str, actor: &Actor, change: AuditChange) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            actor: actor.clone(),
            timestamp: Utc::now(),
            change,
        }
    }

    pub fn created(item_id: &str, actor: &Actor, created_data: Map<String, Value>) -> Self {
        Self::with_change(item_id, actor, AuditChange::Create { created_data })
    }

    pub fn updated(item_id: &str, actor: &Actor, changes: BTreeMap<String, FieldChange>) -> Self {
        Self::with_change(item_id, actor, AuditChange::Update { changes })
    }

    pub fn deleted(item_id: &str, actor: &Actor) -> Self {
        Self::with_change(item_id, actor, AuditChange::Delete)
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn action(&self) -> AuditAction {
        match self.change {
            AuditChange::Create { .. } => AuditAction::Create,
            AuditChange::Update { .. } => AuditAction::Update,
            AuditChange::Delete => AuditAction::Delete,
        }
    }
}

/// Field-level diff between two payloads, restricted to `fields`
///
/// Missing values compare as `null`. Fields whose value did not change are
/// left out, so a no-op update yields an empty map.
pub fn diff_payloads<'a>(
    before: &Map<String, Value>,
    after: &Map<String, Value>,
    fields: impl IntoIterator<Item = &'a str>,
) -> BTreeMap<String, FieldChange> {
    let mut changes = BTreeMap::new();
    for field in fields {
        let from = before.get(field).cloned().unwrap_or(Value::Null);
        let to = after.get(field).cloned().unwrap_or(Value::Null);
        if from != to {
            changes.insert(field.to_string(), FieldChange { from, to });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_diff_excludes_unchanged_fields() {
        let before = object(json!({"a": 1, "b": 2}));
        let after = object(json!({"a": 1, "b": 3}));

        let diff = diff_payloads(&before, &after, ["a", "b"]);

        assert_eq!(diff.len(), 1);
        assert_eq!(
            diff.get("b"),
            Some(&FieldChange {
                from: json!(2),
                to: json!(3)
            })
        );
        assert!(!diff.contains_key("a"));
    }

    #[test]
    fn test_diff_only_considers_requested_fields() {
        let before = object(json!({"a": 1, "b": 2}));
        let after = object(json!({"a": 5, "b": 3}));

        let diff = diff_payloads(&before, &after, ["b"]);

        assert_eq!(diff.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_diff_treats_missing_as_null() {
        let before = object(json!({}));
        let after = object(json!({"unit": "kg"}));

        let diff = diff_payloads(&before, &after, ["unit"]);

        assert_eq!(diff["unit"].from, Value::Null);
        assert_eq!(diff["unit"].to, json!("kg"));
    }

    /// Contract test: the action tag and its body sit flat on the record
    #[test]
    fn test_audit_record_serialization_contract() {
        let actor = Actor::new("u1", Some("ana@example.com".to_string()));
        let mut changes = BTreeMap::new();
        changes.insert(
            "name".to_string(),
            FieldChange {
                from: json!("Old"),
                to: json!("New"),
            },
        );
        let record = AuditRecord::updated("n1", &actor, changes);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["itemId"], "n1");
        assert_eq!(value["action"], "update");
        assert_eq!(value["changes"]["name"]["from"], "Old");
        assert_eq!(value["actor"]["email"], "ana@example.com");

        let parsed: AuditRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.action(), AuditAction::Update);
    }

    #[test]
    fn test_create_record_uses_created_data_key() {
        let actor = Actor::new("u1", None);
        let record = AuditRecord::created("n1", &actor, object(json!({"name": "Panel"})));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["action"], "create");
        assert_eq!(value["createdData"]["name"], "Panel");

        let deleted = serde_json::to_value(AuditRecord::deleted("n1", &actor)).unwrap();
        assert_eq!(deleted["action"], "delete");
        assert!(deleted.get("changes").is_none());
    }
}
