//! Error types for ontology operations.
//!
//! All fallible operations return [`Result<T>`] with context-rich error messages.

use thiserror::Error;

/// Result type alias for ontology operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Error type for all graph operations.
///
/// Errors are designed to fail fast and provide clear context about what went wrong.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Node not found in the graph
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// ID of the missing node
        node_id: String,
    },

    /// Edge not found in the graph
    #[error("Edge not found: {edge_id}")]
    EdgeNotFound {
        /// ID of the missing edge
        edge_id: String,
    },

    /// A node with the same identity key already exists
    #[error("Duplicate node key: {key}")]
    DuplicateNode {
        /// Display form of the conflicting key
        key: String,
    },

    /// Invalid operation (e.g., removing the global namespace)
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of what went wrong
        message: String,
    },

    /// A structural invariant of the graph does not hold.
    ///
    /// This indicates a logic defect in a producer, not malformed input.
    #[error("Invariant violation: {message}")]
    InvariantViolation {
        /// Which invariant failed and where
        message: String,
    },
}

impl GraphError {
    /// Create a node-not-found error from any displayable id.
    pub fn node_not_found(id: impl std::fmt::Display) -> Self {
        Self::NodeNotFound {
            node_id: id.to_string(),
        }
    }

    /// Create an invariant violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_not_found_error() {
        let err = GraphError::node_not_found(123);
        assert_eq!(err.to_string(), "Node not found: 123");
    }

    #[test]
    fn test_duplicate_node_error() {
        let err = GraphError::DuplicateNode {
            key: "Scope:app::Widget".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate node key: Scope:app::Widget");
    }

    #[test]
    fn test_invalid_operation_error() {
        let err = GraphError::InvalidOperation {
            message: "Cannot remove the global namespace".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid operation: Cannot remove the global namespace"
        );
    }

    #[test]
    fn test_invariant_error() {
        let err = GraphError::invariant("node 4 has 2 Contains parents");
        assert_eq!(
            err.to_string(),
            "Invariant violation: node 4 has 2 Contains parents"
        );
    }
}
