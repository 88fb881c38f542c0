//! Sinoptico Core
//!
//! Hierarchy engine for the product sinoptico: a forest of products,
//! subproducts and supplies, each family sharing a `rootId`.
//!
//! # Architecture
//!
//! - **Flat storage**: Nodes are stored flat with `parentId`, `rootId` and a
//!   sibling `order`; trees are rebuilt on read
//! - **Store contract**: All persistence goes through the async `NodeStore`
//!   trait; structural changes commit as one atomic `WriteBatch`
//! - **Best-effort audit**: Create/update/delete append audit records that
//!   never fail the primary write
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, NodePatch, AuditRecord, Forest)
//! - [`db`] - Store contract and the in-memory store
//! - [`services`] - Tree building, flattening, hierarchy mutations, auditing
//! - [`config`] - Engine configuration
//! - [`utils`] - Tracing setup

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::{ConfigError, SinopticoConfig};
pub use db::{MemoryStore, NodeStore, StoreError, WriteBatch};
pub use models::*;
pub use services::*;
