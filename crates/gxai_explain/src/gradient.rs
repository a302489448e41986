//! Input-gradient saliency.

use std::sync::Arc;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use gxai_core::{index_tensor, GraphModel, SubgraphExtractor};
use serde::{Deserialize, Serialize};

use crate::criterion::Criterion;
use crate::error::Result;
use crate::explainer::{Explainer, ExplainerBase, ExplainerKind, GraphRequest, NodeRequest};
use crate::explanation::{Explanation, ExplanationContext};
use crate::path::PathSample;

/// Configuration for gradient saliency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradConfig {
    /// Default neighborhood size for node explanations.
    pub num_hops: Option<usize>,
}

impl GradConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default neighborhood size.
    #[must_use]
    pub fn with_num_hops(mut self, num_hops: usize) -> Self {
        self.num_hops = Some(num_hops);
        self
    }
}

/// Scores inputs by the magnitude of the loss gradient at the input.
#[derive(Debug)]
pub struct GradExplainer<M, C> {
    model: M,
    criterion: C,
    base: ExplainerBase,
}

impl<M, C> GradExplainer<M, C> {
    /// Create an explainer with the default configuration.
    pub fn new(model: M, criterion: C) -> Self {
        Self::with_config(model, criterion, GradConfig::default())
    }

    /// Create an explainer with the given configuration.
    pub fn with_config(model: M, criterion: C, config: GradConfig) -> Self {
        Self {
            model,
            criterion,
            base: ExplainerBase::new(config.num_hops),
        }
    }

    /// Replace the subgraph extractor used for node explanations.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn SubgraphExtractor>) -> Self {
        self.base = self.base.with_extractor(extractor);
        self
    }

    /// The explained model.
    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<B, M, C> Explainer<B> for GradExplainer<M, C>
where
    B: AutodiffBackend,
    M: GraphModel<B>,
    C: Criterion<B>,
{
    fn kind(&self) -> ExplainerKind {
        ExplainerKind::Grad
    }

    fn explain_node(&self, request: &NodeRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        let label = request.resolve_label()?;
        let scope = self.base.node_scope(request, self.model.num_layers())?;

        tracing::debug!(
            node_idx = request.node_idx,
            num_hops = scope.num_hops,
            subset = scope.context.num_nodes(),
            "saliency: node"
        );

        let local = scope.local;
        let device = request.x.device();
        let sample = PathSample::<B>::new(scope.features.clone(), 1.0, 0);
        let grad = sample
            .backward(None, |features| {
                let out = self
                    .model
                    .forward(features, &scope.context.edge_index, &request.forward_args);
                let row = out.select(0, index_tensor(&[local], &device));
                self.criterion.loss(row, label)
            })?
            .abs();

        let [n, d] = grad.dims();
        let node_imp = grad.clone().sum_dim(1).reshape([n]);
        let local_idx = index_tensor(&[local], &grad.device());
        let feature_imp = grad.select(0, local_idx).reshape([d]);

        Ok(Explanation::new(
            ExplainerKind::Grad,
            feature_imp,
            node_imp,
            ExplanationContext::EnclosingSubgraph(scope.context),
        )
        .with_node_idx(request.node_idx))
    }

    fn explain_graph(&self, request: &GraphRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        let label = request.resolve_label()?;
        request.check_edges()?;

        tracing::debug!(num_nodes = request.num_nodes(), "saliency: graph");

        let sample = PathSample::<B>::new(request.x.clone().inner(), 1.0, 0);
        let grad = sample
            .backward(None, |features| {
                let out = self
                    .model
                    .forward(features, request.edge_index, &request.forward_args);
                self.criterion.loss(out, label)
            })?
            .abs();

        let [n, d] = grad.dims();
        Ok(Explanation::new(
            ExplainerKind::Grad,
            grad.clone().sum_dim(0).reshape([d]),
            grad.clone().sum_dim(1).reshape([n]),
            ExplanationContext::WholeGraph {
                num_nodes: n,
                edge_index: request.edge_index.clone(),
            },
        )
        .with_attributions(grad))
    }
}
