//! Hierarchy Services
//!
//! This module contains the hierarchy engine:
//!
//! - `TreeBuilder` - Rebuilds a product family from its flat node set
//! - `flatten` - Depth-first flattening of a forest for rendering
//! - `HierarchyService` - Moves, grafts, reorders and node creation
//! - `AuditRecorder` - Create/update/delete with append-only audit records
//! - `sibling_order` - Zero-based contiguous ordering inside sibling groups
//!
//! Services talk to persistence only through the `NodeStore` trait.

pub mod audit_recorder;
pub mod error;
pub mod flattener;
pub mod hierarchy_service;
pub mod sibling_order;
pub mod tree_builder;

pub use audit_recorder::AuditRecorder;
pub use error::HierarchyError;
pub use flattener::{flatten, FlatEntry};
pub use hierarchy_service::{descendants_of, HierarchyService};
pub use tree_builder::{assemble_forest, TreeBuilder};
