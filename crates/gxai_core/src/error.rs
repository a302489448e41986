//! Error types for gxai_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur in gxai_core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid tensor shape provided.
    #[error("Invalid shape: expected {expected}, got {got}")]
    InvalidShape {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        got: String,
    },

    /// Shape mismatch between tensors.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Node index does not exist in the graph.
    #[error("Node {node} out of range for graph with {num_nodes} nodes")]
    NodeOutOfRange {
        /// Requested node index.
        node: usize,
        /// Number of nodes in the graph.
        num_nodes: usize,
    },

    /// An edge references a node that does not exist.
    #[error("Edge {edge} ({source_node} -> {target_node}) out of range for graph with {num_nodes} nodes")]
    EdgeOutOfRange {
        /// Position of the edge in the edge list.
        edge: usize,
        /// Source node of the edge.
        source_node: usize,
        /// Target node of the edge.
        target_node: usize,
        /// Number of nodes in the graph.
        num_nodes: usize,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}
