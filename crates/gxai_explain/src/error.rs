//! Error types for explanation.

use gxai_core::CoreError;
use thiserror::Error;

/// Result type alias for explanation operations.
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Errors that can occur while explaining a prediction.
#[derive(Error, Debug)]
pub enum ExplainError {
    /// Neither an explicit label nor a label vector was supplied.
    #[error("Either label or y must be provided")]
    MissingLabel,

    /// The explained node is missing from its extracted neighborhood.
    #[error("Node {node} not found in extracted subgraph of {subset_len} nodes")]
    NodeNotInSubgraph {
        /// Requested node index.
        node: usize,
        /// Number of nodes in the extracted subset.
        subset_len: usize,
    },

    /// The explainer does not support the requested mode.
    #[error("{mode}-level explanation is not implemented for {explainer}")]
    Unimplemented {
        /// Requested mode ("node", "graph" or "link").
        mode: &'static str,
        /// Explainer that rejected the request.
        explainer: String,
    },

    /// Integration needs at least one step.
    #[error("Invalid number of integration steps: {0} (must be >= 1)")]
    InvalidSteps(usize),

    /// Node index does not exist in the graph.
    #[error("Node {node} out of range for graph with {num_nodes} nodes")]
    NodeOutOfRange {
        /// Requested node index.
        node: usize,
        /// Number of nodes in the graph.
        num_nodes: usize,
    },

    /// Loss could not be computed for the given output and label.
    #[error("Criterion error: {0}")]
    Criterion(String),

    /// Tensor data could not be read back.
    #[error("Tensor data error: {0}")]
    TensorData(String),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}
