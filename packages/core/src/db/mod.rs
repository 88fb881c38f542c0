//! Store Layer
//!
//! This module holds the Node Store Adapter contract the hierarchy engine
//! talks to:
//!
//! - `NodeStore` - async trait over filtered reads, point writes, atomic
//!   batches and the audit collection
//! - `WriteBatch` - all-or-nothing write set built in memory
//! - `MemoryStore` - in-process adapter, used as the default test double
//!
//! The persistent document store itself is an external collaborator; a
//! production deployment supplies its own `NodeStore` implementation.

mod batch;
mod error;
mod memory_store;
mod node_store;

pub use batch::{BatchOp, WriteBatch};
pub use error::StoreError;
pub use memory_store::MemoryStore;
pub use node_store::NodeStore;
