//! Node Data Structures
//!
//! This module defines the `Node` struct stored in the sinoptico collection and
//! the partial `NodePatch` used for point and batch updates.
//!
//! # Architecture
//!
//! - **Fixed hierarchy fields**: `id`, `kind`, `parentId`, `rootId`, `order`
//! - **Open attribute bag**: name, code, weight, dimensions and any other domain
//!   attribute live in `attributes` and are carried through copies and diffs
//!   without interpretation
//! - **Audit metadata**: creator/modifier identity and timestamps, stamped by
//!   the audit recorder rather than by callers
//!
//! # Examples
//!
//! ```rust
//! use sinoptico_core::models::{Node, NodeKind};
//! use serde_json::json;
//!
//! let product = Node::new(
//!     NodeKind::Product,
//!     json!({ "name": "Door panel", "code": "PRD-001" }).as_object().cloned().unwrap_or_default(),
//! );
//!
//! let bracket = Node::new(NodeKind::Supply, Default::default())
//!     .with_parent(&product.id, &product.id)
//!     .with_order(0);
//! assert_eq!(bracket.parent_id.as_deref(), Some(product.id.as_str()));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::audit::Actor;

/// Field names owned by the hierarchy and audit layers.
///
/// These keys can never appear in the attribute bag, otherwise the flattened
/// payload would carry two values for the same field.
pub const RESERVED_FIELDS: &[&str] = &[
    "id",
    "kind",
    "parentId",
    "rootId",
    "order",
    "createdBy",
    "createdAt",
    "modifiedBy",
    "modifiedAt",
    "children",
];

/// Audit metadata fields, excluded from field-level diffs.
const METADATA_FIELDS: &[&str] = &["createdBy", "createdAt", "modifiedBy", "modifiedAt"];

/// Validation errors for Node operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("A {child} cannot be placed under a {parent}")]
    IllegalChildKind { parent: NodeKind, child: NodeKind },

    #[error("A {0} cannot have children")]
    ChildlessKind(NodeKind),

    #[error("Attribute '{0}' is reserved for hierarchy or audit fields")]
    ReservedAttribute(String),
}

/// Closed set of node kinds in a bill of materials.
///
/// Serialized in lowercase; the legacy Spanish names written by the first
/// version of the application are accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[serde(alias = "producto")]
    Product,
    #[serde(alias = "subproducto")]
    Subproduct,
    #[serde(alias = "insumo")]
    Supply,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Product => "product",
            NodeKind::Subproduct => "subproduct",
            NodeKind::Supply => "supply",
        }
    }

    /// Supplies are leaves; every other kind may hold children.
    pub fn can_have_children(self) -> bool {
        !matches!(self, NodeKind::Supply)
    }

    /// Whether `child` is a legal direct child of a node of this kind.
    ///
    /// Products only ever appear at the top of a hierarchy.
    pub fn accepts_child(self, child: NodeKind) -> bool {
        self.can_have_children() && child != NodeKind::Product
    }

    /// Check the parent/child pairing, returning the matching `ValidationError`.
    pub fn check_child(self, child: NodeKind) -> Result<(), ValidationError> {
        if !self.can_have_children() {
            return Err(ValidationError::ChildlessKind(self));
        }
        if !self.accepts_child(child) {
            return Err(ValidationError::IllegalChildKind {
                parent: self,
                child,
            });
        }
        Ok(())
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the sinoptico hierarchy.
///
/// # Fields
///
/// - `id`: Opaque identifier, immutable once stored
/// - `kind`: Product, Subproduct or Supply
/// - `parent_id`: Parent node, `None` for top-level products
/// - `root_id`: Owning product; equals `id` for a product once its creation settles
/// - `order`: Zero-based position among siblings (missing values read as 0)
/// - `attributes`: Domain payload (name, code, description, weight, dimensions, unit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    pub kind: NodeKind,

    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub root_id: Option<String>,

    #[serde(default)]
    pub order: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    /// Domain attributes, flattened into the stored document
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Node {
    /// Create a detached node with a fresh UUID
    ///
    /// The node has no parent, no root and order 0 until placed with
    /// [`Node::with_parent`] / [`Node::with_order`].
    pub fn new(kind: NodeKind, attributes: Map<String, Value>) -> Self {
        Self::new_with_id(Uuid::new_v4().to_string(), kind, attributes)
    }

    /// Create a detached node with an explicit ID
    pub fn new_with_id(id: impl Into<String>, kind: NodeKind, attributes: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            kind,
            parent_id: None,
            root_id: None,
            order: 0,
            created_by: None,
            created_at: None,
            modified_by: None,
            modified_at: None,
            attributes,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>, root_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self.root_id = Some(root_id.into());
        self
    }

    pub fn with_root(mut self, root_id: impl Into<String>) -> Self {
        self.root_id = Some(root_id.into());
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Human-readable label, falling back to the id
    pub fn label(&self) -> &str {
        self.attributes
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&self.id)
    }

    /// Validate node structure
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` is empty
    /// - the node references itself as parent
    /// - a product carries a parent reference
    /// - an attribute key collides with a reserved field
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if let Some(parent_id) = &self.parent_id {
            if parent_id == &self.id {
                return Err(ValidationError::InvalidParent(
                    "Node cannot be its own parent".to_string(),
                ));
            }
            if self.kind == NodeKind::Product {
                return Err(ValidationError::InvalidParent(format!(
                    "product {} cannot have a parent",
                    self.id
                )));
            }
        }

        check_attribute_keys(&self.attributes)
    }

    /// Full document payload as a JSON object (hierarchy fields, metadata and attributes)
    pub fn payload(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: &NodePatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(parent_id) = &patch.parent_id {
            self.parent_id = parent_id.clone();
        }
        if let Some(root_id) = &patch.root_id {
            self.root_id = root_id.clone();
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
        if let Some(modified_by) = &patch.modified_by {
            self.modified_by = Some(modified_by.clone());
        }
        if let Some(modified_at) = patch.modified_at {
            self.modified_at = Some(modified_at);
        }
        for (key, value) in &patch.attributes {
            self.attributes.insert(key.clone(), value.clone());
        }
    }

    /// Shallow copy placed under a new parent
    ///
    /// Kind and attributes are carried over; the copy gets a fresh id, the
    /// given placement and no audit metadata. The source is not touched.
    pub fn copy_as_child(&self, parent_id: &str, root_id: &str, order: i64) -> Node {
        Node::new(self.kind, self.attributes.clone())
            .with_parent(parent_id, root_id)
            .with_order(order)
    }

    /// Stamp creator and modifier metadata
    pub fn stamp_created(&mut self, actor: &Actor, at: DateTime<Utc>) {
        self.created_by = Some(actor.id.clone());
        self.created_at = Some(at);
        self.modified_by = Some(actor.id.clone());
        self.modified_at = Some(at);
    }
}

fn check_attribute_keys(attributes: &Map<String, Value>) -> Result<(), ValidationError> {
    match attributes
        .keys()
        .find(|key| RESERVED_FIELDS.contains(&key.as_str()))
    {
        Some(key) => Err(ValidationError::ReservedAttribute(key.clone())),
        None => Ok(()),
    }
}

/// Accept both a plain value and `null` for double-Option fields
///
/// - Missing field → None (don't update)
/// - null → Some(None) (clear)
/// - "value" → Some(Some("value"))
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial node update for point writes and batches
///
/// Only provided fields are written. `parent_id` and `root_id` use the
/// double-Option pattern:
///
/// - `None`: leave the field as is
/// - `Some(None)`: clear the reference
/// - `Some(Some(id))`: point at `id`
///
/// Attribute entries are merged into the stored attribute bag.
///
/// # Examples
///
/// ```rust
/// # use sinoptico_core::models::NodePatch;
/// # use serde_json::json;
/// let patch = NodePatch::new()
///     .with_parent(Some("sub-1"))
///     .with_order(3)
///     .with_attribute("name", json!("Hinge"));
/// assert_eq!(patch.field_names(), vec!["parentId", "order", "name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<String>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub root_id: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent_id: Option<&str>) -> Self {
        self.parent_id = Some(parent_id.map(str::to_string));
        self
    }

    pub fn with_root(mut self, root_id: Option<&str>) -> Self {
        self.root_id = Some(root_id.map(str::to_string));
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Stamp modifier metadata
    pub fn stamped(mut self, actor: &Actor, at: DateTime<Utc>) -> Self {
        self.modified_by = Some(actor.id.clone());
        self.modified_at = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.parent_id.is_none()
            && self.root_id.is_none()
            && self.order.is_none()
            && self.modified_by.is_none()
            && self.modified_at.is_none()
            && self.attributes.is_empty()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_attribute_keys(&self.attributes)
    }

    /// Whether the patch rewrites placement (`parentId`, `rootId` or `order`)
    pub fn changes_placement(&self) -> bool {
        self.parent_id.is_some() || self.root_id.is_some() || self.order.is_some()
    }

    /// Payload field names this patch writes, audit metadata excluded
    ///
    /// Hierarchy fields come first in declaration order, then attributes.
    pub fn field_names(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.kind.is_some() {
            fields.push("kind".to_string());
        }
        if self.parent_id.is_some() {
            fields.push("parentId".to_string());
        }
        if self.root_id.is_some() {
            fields.push("rootId".to_string());
        }
        if self.order.is_some() {
            fields.push("order".to_string());
        }
        fields.extend(
            self.attributes
                .keys()
                .filter(|key| !METADATA_FIELDS.contains(&key.as_str()))
                .cloned(),
        );
        fields
    }
}

/// New sibling position for one node, as sent by drag-and-drop reordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub id: String,
    pub order: i64,
}

impl OrderUpdate {
    pub fn new(id: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }
}
