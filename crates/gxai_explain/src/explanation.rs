//! Explanation results.

use burn::prelude::*;
use gxai_core::{EdgeIndex, SubgraphContext};
use serde::{Deserialize, Serialize};

use crate::error::{ExplainError, Result};
use crate::explainer::ExplainerKind;

/// Structure the importance indices refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExplanationContext {
    /// Node explanation on the k-hop neighborhood of the explained node.
    EnclosingSubgraph(SubgraphContext),
    /// Graph explanation over every node and edge.
    WholeGraph {
        /// Number of nodes in the graph.
        num_nodes: usize,
        /// Edges of the graph.
        edge_index: EdgeIndex,
    },
}

impl ExplanationContext {
    /// Original node id for each position of `node_imp`.
    pub fn node_ids(&self) -> Vec<usize> {
        match self {
            ExplanationContext::EnclosingSubgraph(ctx) => ctx.subset.clone(),
            ExplanationContext::WholeGraph { num_nodes, .. } => (0..*num_nodes).collect(),
        }
    }

    /// Edges `edge_imp` is aligned to, in original node ids.
    pub fn edges(&self) -> EdgeIndex {
        match self {
            ExplanationContext::EnclosingSubgraph(ctx) => EdgeIndex::new(
                ctx.edge_index
                    .iter()
                    .map(|&[s, t]| [ctx.subset[s], ctx.subset[t]])
                    .collect(),
            ),
            ExplanationContext::WholeGraph { edge_index, .. } => edge_index.clone(),
        }
    }
}

/// Importance scores for one prediction.
///
/// Node explanations index `node_imp` and `edge_imp` by position in the
/// enclosing subgraph; graph explanations by original node and edge index.
#[derive(Debug, Clone)]
pub struct Explanation<B: Backend> {
    /// Explainer that produced the scores.
    pub method: ExplainerKind,
    /// Explained node, `None` for graph explanations.
    pub node_idx: Option<usize>,
    /// One score per feature dimension, shape `(D,)`.
    pub feature_imp: Tensor<B, 1>,
    /// One score per considered node, shape `(n,)`.
    pub node_imp: Tensor<B, 1>,
    /// One score per considered edge, when the explainer scores edges.
    pub edge_imp: Option<Tensor<B, 1>>,
    /// Per-node, per-feature attributions `(n, D)`, when available.
    pub attributions: Option<Tensor<B, 2>>,
    /// Structure the indices refer to.
    pub context: ExplanationContext,
}

impl<B: Backend> Explanation<B> {
    /// Create an explanation without edge scores or attribution matrix.
    pub fn new(
        method: ExplainerKind,
        feature_imp: Tensor<B, 1>,
        node_imp: Tensor<B, 1>,
        context: ExplanationContext,
    ) -> Self {
        Self {
            method,
            node_idx: None,
            feature_imp,
            node_imp,
            edge_imp: None,
            attributions: None,
            context,
        }
    }

    /// Set the explained node.
    #[must_use]
    pub fn with_node_idx(mut self, node_idx: usize) -> Self {
        self.node_idx = Some(node_idx);
        self
    }

    /// Attach edge scores.
    #[must_use]
    pub fn with_edge_imp(mut self, edge_imp: Tensor<B, 1>) -> Self {
        self.edge_imp = Some(edge_imp);
        self
    }

    /// Attach the per-node, per-feature attribution matrix.
    #[must_use]
    pub fn with_attributions(mut self, attributions: Tensor<B, 2>) -> Self {
        self.attributions = Some(attributions);
        self
    }

    /// Original node id for each position of `node_imp`.
    pub fn node_ids(&self) -> Vec<usize> {
        self.context.node_ids()
    }

    /// Min-max scale every importance vector to `[0, 1]`.
    ///
    /// Constant and empty vectors are left unchanged.
    pub fn normalize(&self) -> Self {
        Self {
            method: self.method,
            node_idx: self.node_idx,
            feature_imp: min_max(self.feature_imp.clone()),
            node_imp: min_max(self.node_imp.clone()),
            edge_imp: self.edge_imp.clone().map(min_max),
            attributions: self.attributions.clone(),
            context: self.context.clone(),
        }
    }

    /// The `k` most important nodes as `(original id, score)`, highest first.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::TensorData`] if the scores cannot be read.
    pub fn top_nodes(&self, k: usize) -> Result<Vec<(usize, f32)>> {
        let scores = to_vec(self.node_imp.clone())?;
        let mut ranked: Vec<(usize, f32)> = self.node_ids().into_iter().zip(scores).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        Ok(ranked)
    }

    /// Plain-data copy of the explanation for serialization.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::TensorData`] if tensor data cannot be read.
    pub fn to_report(&self) -> Result<ExplanationReport> {
        Ok(ExplanationReport {
            method: self.method,
            node_idx: self.node_idx,
            node_ids: self.node_ids(),
            feature_imp: to_vec(self.feature_imp.clone())?,
            node_imp: to_vec(self.node_imp.clone())?,
            edge_imp: self.edge_imp.clone().map(to_vec).transpose()?,
            context: self.context.clone(),
        })
    }
}

/// Serializable form of an [`Explanation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationReport {
    /// Explainer that produced the scores.
    pub method: ExplainerKind,
    /// Explained node, `None` for graph explanations.
    pub node_idx: Option<usize>,
    /// Original node id for each entry of `node_imp`.
    pub node_ids: Vec<usize>,
    /// One score per feature dimension.
    pub feature_imp: Vec<f32>,
    /// One score per considered node.
    pub node_imp: Vec<f32>,
    /// One score per considered edge.
    pub edge_imp: Option<Vec<f32>>,
    /// Structure the indices refer to.
    pub context: ExplanationContext,
}

fn to_vec<B: Backend>(tensor: Tensor<B, 1>) -> Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| ExplainError::TensorData(format!("{e:?}")))
}

fn min_max<B: Backend>(values: Tensor<B, 1>) -> Tensor<B, 1> {
    if values.dims()[0] == 0 {
        return values;
    }
    let min_val: f32 = values.clone().min().into_scalar().elem();
    let max_val: f32 = values.clone().max().into_scalar().elem();
    let range = max_val - min_val;

    if range > 1e-8 {
        (values - min_val) / range
    } else {
        values
    }
}
