//! Data Models
//!
//! - `Node` / `NodePatch` - hierarchy node and its partial update
//! - `AuditRecord` - append-only change records
//! - `Forest` / `TreeNode` - transient tree reconstruction of one product family

mod audit;
mod forest;
mod node;

pub use audit::{diff_payloads, Actor, AuditAction, AuditChange, AuditRecord, FieldChange};
pub use forest::{Forest, ForestWarning, TreeNode};
pub use node::{
    Node, NodeKind, NodePatch, OrderUpdate, ValidationError, RESERVED_FIELDS,
};
