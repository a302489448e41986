//! Graph and label types.

use burn::prelude::*;
use burn::tensor::TensorData;
use serde::{Deserialize, Serialize};

use crate::edge_index::EdgeIndex;
use crate::error::{CoreError, Result};

/// Build a 1D integer index tensor from node positions.
pub fn index_tensor<B: Backend>(indices: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let data: Vec<i64> = indices.iter().map(|&i| i as i64).collect();
    Tensor::from_data(TensorData::new(data, [indices.len()]), device)
}

/// Labels to explain.
///
/// Class labels pair with classification criteria, value targets with
/// regression criteria. Row `i` always belongs to node `i` (or graph `i`).
#[derive(Debug, Clone)]
pub enum Target<B: Backend> {
    /// One class index per row, shape `(N,)`.
    Classes(Tensor<B, 1, Int>),
    /// One target vector per row, shape `(N, C)`.
    Values(Tensor<B, 2>),
}

impl<B: Backend> Target<B> {
    /// Class labels from plain indices.
    pub fn classes(classes: &[usize], device: &B::Device) -> Self {
        Target::Classes(index_tensor(classes, device))
    }

    /// Number of labelled rows.
    pub fn num_rows(&self) -> usize {
        match self {
            Target::Classes(t) => t.dims()[0],
            Target::Values(t) => t.dims()[0],
        }
    }

    /// Restrict the labels to the given rows, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NodeOutOfRange`] if any row does not exist.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Self> {
        let num_rows = self.num_rows();
        if let Some(&bad) = rows.iter().find(|&&r| r >= num_rows) {
            return Err(CoreError::NodeOutOfRange {
                node: bad,
                num_nodes: num_rows,
            });
        }
        Ok(match self {
            Target::Classes(t) => {
                let idx = index_tensor(rows, &t.device());
                Target::Classes(t.clone().select(0, idx))
            }
            Target::Values(t) => {
                let idx = index_tensor(rows, &t.device());
                Target::Values(t.clone().select(0, idx))
            }
        })
    }
}

/// A graph with node features, edges and optional labels.
#[derive(Debug, Clone)]
pub struct Graph<B: Backend> {
    /// Node feature matrix `(N, D)`.
    pub x: Tensor<B, 2>,
    /// Directed edge list.
    pub edge_index: EdgeIndex,
    /// Optional node or graph labels.
    pub y: Option<Target<B>>,
}

impl<B: Backend> Graph<B> {
    /// Create a graph, validating edges against the number of feature rows.
    ///
    /// # Errors
    ///
    /// Returns an error if an edge endpoint is not a valid node.
    pub fn new(x: Tensor<B, 2>, edge_index: EdgeIndex) -> Result<Self> {
        let [num_nodes, _] = x.dims();
        edge_index.validate(num_nodes)?;
        Ok(Self {
            x,
            edge_index,
            y: None,
        })
    }

    /// Attach labels.
    #[must_use]
    pub fn with_labels(mut self, y: Target<B>) -> Self {
        self.y = Some(y);
        self
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.x.dims()[0]
    }

    /// Number of features per node.
    pub fn num_features(&self) -> usize {
        self.x.dims()[1]
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edge_index.len()
    }

    /// Build a graph from its serialized form.
    ///
    /// # Errors
    ///
    /// Returns an error if feature rows are ragged, the graph is empty,
    /// edges are out of range, or the label count differs from the node count.
    pub fn from_spec(spec: &GraphSpec, device: &B::Device) -> Result<Self> {
        let x = features_from_rows::<B>(&spec.x, device)?;
        let mut graph = Self::new(x, spec.edge_index.clone())?;
        if let Some(y) = &spec.y {
            if y.len() != graph.num_nodes() {
                return Err(CoreError::ShapeMismatch(format!(
                    "{} labels for {} nodes",
                    y.len(),
                    graph.num_nodes()
                )));
            }
            graph = graph.with_labels(Target::classes(y, device));
        }
        Ok(graph)
    }
}

/// Serialized graph: feature rows, `[source, target]` edges, optional class labels.
///
/// ```json
/// { "x": [[1.0, 0.0], [0.0, 1.0]], "edge_index": [[0, 1], [1, 0]], "y": [0, 1] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    /// Feature rows, one per node.
    pub x: Vec<Vec<f32>>,
    /// Directed edges.
    #[serde(default)]
    pub edge_index: EdgeIndex,
    /// Optional class label per node.
    #[serde(default)]
    pub y: Option<Vec<usize>>,
}

impl GraphSpec {
    /// Parse a graph from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SerializationError`] on malformed input.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Stack equally sized feature rows into an `(N, D)` tensor.
///
/// # Errors
///
/// Returns an error for an empty row set or ragged rows.
pub fn features_from_rows<B: Backend>(rows: &[Vec<f32>], device: &B::Device) -> Result<Tensor<B, 2>> {
    let Some(first) = rows.first() else {
        return Err(CoreError::InvalidShape {
            expected: "at least one node".to_string(),
            got: "0 rows".to_string(),
        });
    };
    let dim = first.len();
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
        return Err(CoreError::InvalidShape {
            expected: format!("{dim} features per node"),
            got: format!("{} features in row {i}", row.len()),
        });
    }
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Ok(Tensor::from_data(TensorData::new(flat, [rows.len(), dim]), device))
}
