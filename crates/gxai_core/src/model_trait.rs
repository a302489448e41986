//! Predictive model trait for explanation.
//!
//! Defines the contract explainers rely on: a differentiable function from
//! node features and edges to scores.

use std::collections::BTreeMap;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::edge_index::EdgeIndex;

/// Extra arguments forwarded verbatim to [`GraphModel::forward`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardArgs {
    /// Graph assignment per node for batched graph-level models.
    pub batch: Option<Vec<usize>>,
    /// Named scalar options understood by specific models.
    #[serde(default)]
    pub extras: BTreeMap<String, f64>,
}

impl ForwardArgs {
    /// Empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the node-to-graph assignment.
    #[must_use]
    pub fn with_batch(mut self, batch: Vec<usize>) -> Self {
        self.batch = Some(batch);
        self
    }

    /// Set a named scalar option.
    #[must_use]
    pub fn with_extra(mut self, key: &str, value: f64) -> Self {
        self.extras.insert(key.to_string(), value);
        self
    }

    /// Look up a named scalar option.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<f64> {
        self.extras.get(key).copied()
    }
}

/// Trait for graph models that can be explained.
///
/// On an autodiff backend the output must be differentiable with respect
/// to `x`, so explainers can propagate gradients back to node features.
pub trait GraphModel<B: Backend> {
    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// * `x` - Node features of shape (num_nodes, in_features)
    /// * `edge_index` - Directed edges between rows of `x`
    /// * `args` - Model-specific extra arguments
    ///
    /// # Returns
    ///
    /// Per-node scores (num_nodes, out) or per-graph scores (num_graphs, out)
    fn forward(&self, x: Tensor<B, 2>, edge_index: &EdgeIndex, args: &ForwardArgs) -> Tensor<B, 2>;

    /// Number of message-passing layers, i.e. the receptive field in hops.
    fn num_layers(&self) -> Option<usize> {
        None
    }
}

impl<B: Backend, M: GraphModel<B> + ?Sized> GraphModel<B> for &M {
    fn forward(&self, x: Tensor<B, 2>, edge_index: &EdgeIndex, args: &ForwardArgs) -> Tensor<B, 2> {
        (**self).forward(x, edge_index, args)
    }

    fn num_layers(&self) -> Option<usize> {
        (**self).num_layers()
    }
}
