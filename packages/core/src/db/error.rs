//! Store Error Types
//!
//! Failures reported by a `NodeStore` adapter. The hierarchy services pass
//! these through unchanged inside `HierarchyError::StoreUnavailable`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not serve the request (connection, quota, injected failure)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Point update addressed a record that does not exist
    #[error("Record not found: {id}")]
    RecordNotFound { id: String },

    /// Batch failed validation at commit time; none of its writes were applied
    #[error("Batch rejected, no writes applied: {reason}")]
    BatchRejected { reason: String },
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    pub fn batch_rejected(reason: impl Into<String>) -> Self {
        Self::BatchRejected {
            reason: reason.into(),
        }
    }
}
