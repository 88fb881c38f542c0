//! Service Layer Error Types
//!
//! The hierarchy services report exactly three kinds of failure. Data
//! anomalies (orphans, parent cycles) are not errors; the tree builder reports
//! them as `ForestWarning`s instead.

use crate::db::StoreError;
use crate::models::ValidationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// A node the operation requires does not exist
    #[error("Node not found: {id}")]
    NotFound { id: String },

    /// Missing or illegal linkage (parent/root ids, child kinds, cycles)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The store failed; the adapter error is carried unchanged
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl HierarchyError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl From<ValidationError> for HierarchyError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeKind;

    #[test]
    fn test_error_display() {
        assert_eq!(
            HierarchyError::not_found("n1").to_string(),
            "Node not found: n1"
        );
        assert_eq!(
            HierarchyError::from(StoreError::unavailable("quota exceeded")).to_string(),
            "Store unavailable: quota exceeded"
        );
    }

    #[test]
    fn test_validation_error_maps_to_invalid_argument() {
        let err: HierarchyError = ValidationError::ChildlessKind(NodeKind::Supply).into();
        assert_eq!(
            err,
            HierarchyError::InvalidArgument("A supply cannot have children".to_string())
        );
    }

    #[test]
    fn test_store_error_is_carried_unchanged() {
        let source = StoreError::batch_rejected("update of missing node x");
        match HierarchyError::from(source.clone()) {
            HierarchyError::StoreUnavailable(inner) => assert_eq!(inner, source),
            other => panic!("Expected StoreUnavailable, got {:?}", other),
        }
    }
}
