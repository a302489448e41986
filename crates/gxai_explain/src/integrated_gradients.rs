//! Integrated Gradients for node and graph predictions.
//!
//! Node explanations integrate over the features of the k-hop neighborhood
//! of the explained node and keep only that node's gradient row. Graph
//! explanations integrate over the full feature matrix.

use std::sync::Arc;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use gxai_core::{index_tensor, GraphModel, SubgraphExtractor};
use serde::{Deserialize, Serialize};

use crate::baseline::BaselineType;
use crate::criterion::Criterion;
use crate::error::Result;
use crate::explainer::{Explainer, ExplainerBase, ExplainerKind, GraphRequest, NodeRequest};
use crate::explanation::{Explanation, ExplanationContext};
use crate::path::PathIntegrator;

/// Configuration for Integrated Gradients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegratedGradientsConfig {
    /// Number of path intervals; `n_steps + 1` forward/backward passes.
    pub n_steps: usize,
    /// Starting point of the path.
    pub baseline: BaselineType,
    /// Default neighborhood size for node explanations.
    pub num_hops: Option<usize>,
}

impl Default for IntegratedGradientsConfig {
    fn default() -> Self {
        Self {
            n_steps: 40,
            baseline: BaselineType::Zeros,
            num_hops: None,
        }
    }
}

impl IntegratedGradientsConfig {
    /// Create a new config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of path intervals.
    #[must_use]
    pub fn with_steps(mut self, n_steps: usize) -> Self {
        self.n_steps = n_steps;
        self
    }

    /// Set the baseline.
    #[must_use]
    pub fn with_baseline(mut self, baseline: BaselineType) -> Self {
        self.baseline = baseline;
        self
    }

    /// Set the default neighborhood size.
    #[must_use]
    pub fn with_num_hops(mut self, num_hops: usize) -> Self {
        self.num_hops = Some(num_hops);
        self
    }
}

/// Integrated Gradients explainer.
///
/// Attributes a prediction to input features by integrating the gradient of
/// `criterion(model(x), label)` along the straight path from a baseline to `x`.
#[derive(Debug)]
pub struct IntegratedGradExplainer<M, C> {
    model: M,
    criterion: C,
    config: IntegratedGradientsConfig,
    base: ExplainerBase,
}

impl<M, C> IntegratedGradExplainer<M, C> {
    /// Create an explainer with the default configuration.
    pub fn new(model: M, criterion: C) -> Self {
        Self::with_config(model, criterion, IntegratedGradientsConfig::default())
    }

    /// Create an explainer with the given configuration.
    pub fn with_config(model: M, criterion: C, config: IntegratedGradientsConfig) -> Self {
        Self {
            model,
            criterion,
            base: ExplainerBase::new(config.num_hops),
            config,
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

    /// Current configuration.
    pub fn config(&self) -> &IntegratedGradientsConfig {
        &self.config
    }
}

impl<B, M, C> Explainer<B> for IntegratedGradExplainer<M, C>
where
    B: AutodiffBackend,
    M: GraphModel<B>,
    C: Criterion<B>,
{
    fn kind(&self) -> ExplainerKind {
        ExplainerKind::IntegratedGradients
    }

    fn explain_node(&self, request: &NodeRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        let label = request.resolve_label()?;
        let integrator = PathIntegrator::new(self.config.n_steps)?;
        let scope = self.base.node_scope(request, self.model.num_layers())?;

        tracing::debug!(
            node_idx = request.node_idx,
            num_hops = scope.num_hops,
            subset = scope.context.num_nodes(),
            steps = integrator.steps(),
            "integrated gradients: node"
        );

        let local = scope.local;
        let device = request.x.device();
        let baseline = self.config.baseline.build(&scope.features);

        let avg_grad = integrator.integrate::<B, _>(&scope.features, &baseline, |sample| {
            sample.backward(Some(&[local]), |features| {
                let out = self
                    .model
                    .forward(features, &scope.context.edge_index, &request.forward_args);
                let row = out.select(0, index_tensor(&[local], &device));
                self.criterion.loss(row, label.clone())
            })
        })?;

        let [n, d] = scope.features.dims();
        let delta = scope.features.clone() - baseline;
        let attributions = delta.clone() * avg_grad.clone().repeat_dim(0, n);
        let node_imp = attributions.sum_dim(1).reshape([n]);

        let local_idx = index_tensor(&[local], &delta.device());
        let feature_imp = (delta.select(0, local_idx) * avg_grad).reshape([d]);

        Ok(Explanation::new(
            ExplainerKind::IntegratedGradients,
            feature_imp,
            node_imp,
            ExplanationContext::EnclosingSubgraph(scope.context),
        )
        .with_node_idx(request.node_idx))
    }

    fn explain_graph(&self, request: &GraphRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        let label = request.resolve_label()?;
        request.check_edges()?;
        let integrator = PathIntegrator::new(self.config.n_steps)?;

        tracing::debug!(
            num_nodes = request.num_nodes(),
            num_edges = request.edge_index.len(),
            steps = integrator.steps(),
            "integrated gradients: graph"
        );

        let x = request.x.clone().inner();
        let baseline = self.config.baseline.build(&x);

        let avg_grad = integrator.integrate::<B, _>(&x, &baseline, |sample| {
            sample.backward(None, |features| {
                let out = self
                    .model
                    .forward(features, request.edge_index, &request.forward_args);
                self.criterion.loss(out, label.clone())
            })
        })?;

        let [n, d] = x.dims();
        let attributions = (x - baseline) * avg_grad;
        let node_imp = attributions.clone().sum_dim(1).reshape([n]);
        let feature_imp = attributions.clone().sum_dim(0).reshape([d]);

        Ok(Explanation::new(
            ExplainerKind::IntegratedGradients,
            feature_imp,
            node_imp,
            ExplanationContext::WholeGraph {
                num_nodes: n,
                edge_index: request.edge_index.clone(),
            },
        )
        .with_attributions(attributions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use burn::tensor::TensorData;
    use burn_autodiff::Autodiff;
    use burn_ndarray::NdArray;
    use gxai_core::{CoreError, EdgeIndex, ForwardArgs, SubgraphContext, Target};
    use gxai_models::{GcnConfig, IdentityModel, LinearProbe};

    use crate::criterion::MseCriterion;
    use crate::error::ExplainError;
    use crate::explainer::LinkRequest;

    type TestBackend = Autodiff<NdArray>;
    type Inner = NdArray;

    fn values<const D: usize>(t: Tensor<Inner, D>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-5, "{actual:?} vs {expected:?}");
        }
    }

    /// Ring features with `x[i] = [i; 3]` except `x[2] = [-1; 3]`.
    fn ring_features() -> Tensor<TestBackend, 2> {
        let device = Default::default();
        let mut data = Vec::new();
        for i in 0..5 {
            let v = if i == 2 { -1.0 } else { i as f32 };
            data.extend([v; 3]);
        }
        Tensor::from_data(TensorData::new(data, [5, 3]), &device)
    }

    /// Identity model counting forward passes.
    #[derive(Default)]
    struct CountingModel {
        calls: AtomicUsize,
    }

    impl<B: Backend> GraphModel<B> for CountingModel {
        fn forward(&self, x: Tensor<B, 2>, _edge_index: &EdgeIndex, _args: &ForwardArgs) -> Tensor<B, 2> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            x
        }
    }

    /// Extractor that never finds anything.
    struct EmptyExtractor;

    impl SubgraphExtractor for EmptyExtractor {
        fn extract(
            &self,
            _node_idx: usize,
            _num_hops: usize,
            edge_index: &EdgeIndex,
            _num_nodes: usize,
        ) -> gxai_core::Result<SubgraphContext> {
            Ok(SubgraphContext {
                subset: Vec::new(),
                edge_index: EdgeIndex::default(),
                mapping: Vec::new(),
                edge_mask: vec![false; edge_index.len()],
            })
        }
    }

    /// Loss equal to the sum of the model output.
    struct SumCriterion;

    impl<B: Backend> Criterion<B> for SumCriterion {
        fn loss(&self, output: Tensor<B, 2>, _target: Target<B>) -> Result<Tensor<B, 1>> {
            Ok(output.sum())
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = IntegratedGradientsConfig::default();
        assert_eq!(config.n_steps, 40);
        assert_eq!(config.baseline, BaselineType::Zeros);
        assert_eq!(config.num_hops, None);

        let config = IntegratedGradientsConfig::new()
            .with_steps(8)
            .with_baseline(BaselineType::Mean)
            .with_num_hops(2);
        assert_eq!(config.n_steps, 8);
        assert_eq!(config.num_hops, Some(2));
    }

    #[test]
    fn test_ring_identity_end_to_end() {
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let y = Target::Values(x.clone());
        let config = IntegratedGradientsConfig::new().with_steps(2).with_num_hops(1);
        let explainer = IntegratedGradExplainer::with_config(IdentityModel, MseCriterion::sum(), config);

        let request = NodeRequest::new(2, &x, &edges).with_y(&y);
        let exp = explainer.explain_node(&request).unwrap();

        // gradient is 2(1 - alpha) per feature; trapezoid over {0, 0.5, 1} gives 1.0
        assert_close(&values(exp.feature_imp.clone()), &[-1.0, -1.0, -1.0]);
        assert_eq!(exp.node_ids(), vec![1, 2, 3]);
        assert_close(&values(exp.node_imp.clone()), &[3.0, -3.0, 9.0]);
        assert_eq!(exp.node_idx, Some(2));
        assert_eq!(exp.method, ExplainerKind::IntegratedGradients);
    }

    #[test]
    fn test_default_hops_cover_ring() {
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let y = Target::Values(x.clone());
        let config = IntegratedGradientsConfig::new().with_steps(2);
        let explainer = IntegratedGradExplainer::with_config(IdentityModel, MseCriterion::sum(), config);

        let exp = explainer
            .explain_node(&NodeRequest::new(2, &x, &edges).with_y(&y))
            .unwrap();
        assert_eq!(exp.node_ids(), vec![0, 1, 2, 3, 4]);
        assert_close(&values(exp.node_imp), &[0.0, 3.0, -3.0, 9.0, 12.0]);
    }

    #[test]
    fn test_exact_number_of_passes() {
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let y = Target::Values(x.clone());
        let config = IntegratedGradientsConfig::new().with_steps(7);
        let explainer = IntegratedGradExplainer::with_config(CountingModel::default(), MseCriterion::sum(), config);

        explainer
            .explain_node(&NodeRequest::new(0, &x, &edges).with_y(&y))
            .unwrap();
        assert_eq!(explainer.model().calls.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_missing_label_before_forward() {
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let explainer = IntegratedGradExplainer::new(CountingModel::default(), MseCriterion::sum());

        let node = explainer.explain_node(&NodeRequest::new(2, &x, &edges));
        assert!(matches!(node, Err(ExplainError::MissingLabel)));

        let graph = explainer.explain_graph(&GraphRequest::new(&x, &edges));
        assert!(matches!(graph, Err(ExplainError::MissingLabel)));

        assert_eq!(explainer.model().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_node_missing_from_subgraph() {
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let y = Target::Values(x.clone());
        let explainer = IntegratedGradExplainer::new(CountingModel::default(), MseCriterion::sum())
            .with_extractor(Arc::new(EmptyExtractor));

        let result = explainer.explain_node(&NodeRequest::new(2, &x, &edges).with_y(&y));
        assert!(matches!(
            result,
            Err(ExplainError::NodeNotInSubgraph { node: 2, subset_len: 0 })
        ));
        assert_eq!(explainer.model().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_node_out_of_range() {
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let device = Default::default();
        let explainer = IntegratedGradExplainer::new(IdentityModel, MseCriterion::sum());
        let label = Target::Values(Tensor::<TestBackend, 2>::zeros([1, 3], &device));

        let result = explainer.explain_node(&NodeRequest::new(9, &x, &edges).with_label(label));
        assert!(matches!(result, Err(ExplainError::NodeOutOfRange { node: 9, num_nodes: 5 })));
    }

    #[test]
    fn test_graph_edge_out_of_range() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::ones([3, 3], &device);
        let edges = EdgeIndex::from_pairs(&[(0, 1), (0, 9)]);
        let label = Target::Values(Tensor::<TestBackend, 2>::zeros([3, 3], &device));
        let config = IntegratedGradientsConfig::new().with_steps(2);
        let explainer = IntegratedGradExplainer::with_config(CountingModel::default(), MseCriterion::sum(), config);

        let result = explainer.explain_graph(&GraphRequest::new(&x, &edges).with_label(label));
        assert!(matches!(
            result,
            Err(ExplainError::Core(CoreError::EdgeOutOfRange {
                edge: 1,
                target_node: 9,
                num_nodes: 3,
                ..
            }))
        ));
        assert_eq!(explainer.model().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_steps_rejected() {
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let y = Target::Values(x.clone());
        let config = IntegratedGradientsConfig::new().with_steps(0);
        let explainer = IntegratedGradExplainer::with_config(IdentityModel, MseCriterion::sum(), config);

        let result = explainer.explain_node(&NodeRequest::new(2, &x, &edges).with_y(&y));
        assert!(matches!(result, Err(ExplainError::InvalidSteps(0))));
    }

    #[test]
    fn test_link_unimplemented() {
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let explainer = IntegratedGradExplainer::new(IdentityModel, MseCriterion::sum());
        let request = LinkRequest {
            source: 0,
            target: 1,
            x: &x,
            edge_index: &edges,
        };
        let result = Explainer::<TestBackend>::explain_link(&explainer, &request);
        assert!(matches!(result, Err(ExplainError::Unimplemented { mode: "link", .. })));
    }

    #[test]
    fn test_linear_probe_constant_gradient() {
        let device = Default::default();
        // W is (3, 2); d(sum(xW + b))/dx[d] = W[d, 0] + W[d, 1] = [3, 7, 11]
        let weight = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], [3, 2]),
            &device,
        );
        let bias = Tensor::<TestBackend, 1>::from_data(TensorData::new(vec![0.5f32, -0.5], [2]), &device);
        let model = LinearProbe::from_weights(weight, Some(bias));

        let x = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 0.0, 2.0, -1.0, 1.0, 1.0, 0.5, 0.5, 0.5], [3, 3]),
            &device,
        );
        let edges = EdgeIndex::from_pairs(&[(0, 1), (1, 2)]);
        let label = Target::Values(Tensor::<TestBackend, 2>::zeros([1, 2], &device));
        let config = IntegratedGradientsConfig::new().with_steps(5);
        let explainer = IntegratedGradExplainer::with_config(model, SumCriterion, config);

        let exp = explainer
            .explain_node(&NodeRequest::new(1, &x, &edges).with_label(label.clone()))
            .unwrap();
        assert_eq!(exp.node_ids(), vec![0, 1]);
        assert_close(&values(exp.feature_imp), &[-3.0, 7.0, 11.0]);
        assert_close(&values(exp.node_imp), &[25.0, 15.0]);

        let graph = explainer
            .explain_graph(&GraphRequest::new(&x, &edges).with_label(label))
            .unwrap();
        assert_close(&values(graph.node_imp), &[25.0, 15.0, 10.5]);
        assert_close(&values(graph.feature_imp), &[1.5, 10.5, 38.5]);
    }

    #[test]
    fn test_graph_conservation_with_pooled_gcn() {
        let device = Default::default();
        let model = GcnConfig::new(3, 2)
            .with_hidden_sizes(vec![4])
            .with_pool(true)
            .init::<TestBackend>(&device);
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let y = Target::<TestBackend>::classes(&[1], &device);
        let explainer = IntegratedGradExplainer::with_config(
            model,
            crate::criterion::CrossEntropyCriterion::new(),
            IntegratedGradientsConfig::new().with_steps(10),
        );

        let exp = explainer
            .explain_graph(&GraphRequest::new(&x, &edges).with_y(&y))
            .unwrap();
        assert_eq!(exp.node_idx, None);
        assert_eq!(exp.node_imp.dims(), [5]);
        assert_eq!(exp.feature_imp.dims(), [3]);

        let attributions = exp.attributions.clone().unwrap();
        assert_eq!(attributions.dims(), [5, 3]);
        let total: f32 = attributions.sum().into_scalar().elem();
        let node_total: f32 = exp.node_imp.clone().sum().into_scalar().elem();
        let feature_total: f32 = exp.feature_imp.clone().sum().into_scalar().elem();
        assert!((total - node_total).abs() < 1e-4);
        assert!((total - feature_total).abs() < 1e-4);
    }

    #[test]
    fn test_idempotent() {
        let device = Default::default();
        let model = GcnConfig::new(3, 3).with_hidden_sizes(vec![4]).init::<TestBackend>(&device);
        let x = ring_features();
        let edges = EdgeIndex::ring(5);
        let y = Target::<TestBackend>::classes(&[0, 1, 2, 0, 1], &device);
        let explainer = IntegratedGradExplainer::with_config(
            model,
            crate::criterion::CrossEntropyCriterion::new(),
            IntegratedGradientsConfig::new().with_steps(6),
        );
        let request = NodeRequest::new(3, &x, &edges).with_y(&y);

        let first = explainer.explain_node(&request).unwrap();
        let second = explainer.explain_node(&request).unwrap();
        // two GCN layers: the 2-hop ring neighborhood is the whole ring
        assert_eq!(first.node_ids(), vec![0, 1, 2, 3, 4]);
        assert_eq!(values(first.feature_imp), values(second.feature_imp));
        assert_eq!(values(first.node_imp), values(second.node_imp));
    }
}
