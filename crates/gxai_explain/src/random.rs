//! Random importances.
//!
//! Any explainer worth using should beat these scores on faithfulness
//! metrics. Draws come from a seeded generator so runs are reproducible.

use std::sync::Arc;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::TensorData;
use gxai_core::{Seed, SubgraphExtractor};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::explainer::{Explainer, ExplainerBase, ExplainerKind, GraphRequest, NodeRequest};
use crate::explanation::{Explanation, ExplanationContext};

/// Configuration for the random explainer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomConfig {
    /// Seed of the score generator.
    pub seed: Seed,
    /// Default neighborhood size for node explanations.
    pub num_hops: Option<usize>,
}

impl RandomConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Set the default neighborhood size.
    #[must_use]
    pub fn with_num_hops(mut self, num_hops: usize) -> Self {
        self.num_hops = Some(num_hops);
        self
    }
}

/// Assigns uniform random scores in `[0, 1)` to features, nodes and edges.
///
/// Labels are not needed and the model is never run.
#[derive(Debug, Clone)]
pub struct RandomExplainer {
    config: RandomConfig,
    base: ExplainerBase,
}

impl Default for RandomExplainer {
    fn default() -> Self {
        Self::new(RandomConfig::default())
    }
}

impl RandomExplainer {
    /// Create an explainer with the given configuration.
    pub fn new(config: RandomConfig) -> Self {
        Self {
            config,
            base: ExplainerBase::new(config.num_hops),
        }
    }

    /// Replace the subgraph extractor used for node explanations.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn SubgraphExtractor>) -> Self {
        self.base = self.base.with_extractor(extractor);
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &RandomConfig {
        &self.config
    }
}

/// Uniform scores drawn in order: features, then nodes, then edges.
fn draw_scores<B: Backend>(
    seed: Seed,
    sizes: [usize; 3],
    device: &B::Device,
) -> [Tensor<B, 1>; 3] {
    let mut rng = seed.to_rng();
    sizes.map(|len| {
        let data: Vec<f32> = (0..len).map(|_| rng.gen::<f32>()).collect();
        Tensor::from_data(TensorData::new(data, [len]), device)
    })
}

impl<B: AutodiffBackend> Explainer<B> for RandomExplainer {
    fn kind(&self) -> ExplainerKind {
        ExplainerKind::Random
    }

    fn explain_node(&self, request: &NodeRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        let scope = self.base.node_scope(request, None)?;
        let [n, d] = scope.features.dims();
        let num_edges = scope.context.num_edges();

        tracing::debug!(
            node_idx = request.node_idx,
            num_hops = scope.num_hops,
            seed = self.config.seed.value(),
            "random: node"
        );

        let seed = self.config.seed.derive(&format!("node-{}", request.node_idx));
        let [feature_imp, node_imp, edge_imp] =
            draw_scores::<B::InnerBackend>(seed, [d, n, num_edges], &scope.features.device());

        Ok(Explanation::new(
            ExplainerKind::Random,
            feature_imp,
            node_imp,
            ExplanationContext::EnclosingSubgraph(scope.context),
        )
        .with_node_idx(request.node_idx)
        .with_edge_imp(edge_imp))
    }

    fn explain_graph(&self, request: &GraphRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        request.check_edges()?;
        let [n, d] = request.x.dims();
        let num_edges = request.edge_index.len();

        tracing::debug!(num_nodes = n, seed = self.config.seed.value(), "random: graph");

        let device = request.x.clone().inner().device();
        let seed = self.config.seed.derive("graph");
        let [feature_imp, node_imp, edge_imp] =
            draw_scores::<B::InnerBackend>(seed, [d, n, num_edges], &device);

        Ok(Explanation::new(
            ExplainerKind::Random,
            feature_imp,
            node_imp,
            ExplanationContext::WholeGraph {
                num_nodes: n,
                edge_index: request.edge_index.clone(),
            },
        )
        .with_edge_imp(edge_imp))
    }
}
