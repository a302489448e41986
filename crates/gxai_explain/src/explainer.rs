//! Explainer trait, requests and shared subgraph handling.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use gxai_core::{
    index_tensor, EdgeIndex, ForwardArgs, GraphModel, KHopExtractor, SubgraphContext,
    SubgraphExtractor, Target,
};
use serde::{Deserialize, Serialize};

use crate::criterion::Criterion;
use crate::error::{ExplainError, Result};
use crate::explanation::Explanation;
use crate::gradient::GradExplainer;
use crate::integrated_gradients::IntegratedGradExplainer;
use crate::random::RandomExplainer;

/// Hop count used when neither the request, the explainer nor the model sets one.
pub const DEFAULT_NUM_HOPS: usize = 3;

/// The closed set of explainer variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplainerKind {
    /// Integrated Gradients.
    IntegratedGradients,
    /// Input-gradient saliency.
    Grad,
    /// Seeded random scores.
    Random,
}

impl ExplainerKind {
    /// Short name used on the command line.
    pub const fn short_name(&self) -> &'static str {
        match self {
            ExplainerKind::IntegratedGradients => "ig",
            ExplainerKind::Grad => "grad",
            ExplainerKind::Random => "random",
        }
    }
}

impl fmt::Display for ExplainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplainerKind::IntegratedGradients => write!(f, "IntegratedGradients"),
            ExplainerKind::Grad => write!(f, "Grad"),
            ExplainerKind::Random => write!(f, "Random"),
        }
    }
}

impl FromStr for ExplainerKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ig" | "integrated_gradients" | "integratedgradients" => {
                Ok(ExplainerKind::IntegratedGradients)
            }
            "grad" | "gradient" | "saliency" => Ok(ExplainerKind::Grad),
            "rand" | "random" => Ok(ExplainerKind::Random),
            other => Err(format!("unknown explainer '{other}' (expected ig, grad or random)")),
        }
    }
}

/// Request to explain one node's prediction.
#[derive(Debug, Clone)]
pub struct NodeRequest<'a, B: Backend> {
    /// Node to explain.
    pub node_idx: usize,
    /// Node features of the full graph `(N, D)`.
    pub x: &'a Tensor<B, 2>,
    /// Edges of the full graph.
    pub edge_index: &'a EdgeIndex,
    /// Label to explain, used as-is.
    pub label: Option<Target<B>>,
    /// Labels of every node; row `node_idx` is used when `label` is absent.
    pub y: Option<&'a Target<B>>,
    /// Neighborhood size; falls back to the explainer default.
    pub num_hops: Option<usize>,
    /// Extra model arguments.
    pub forward_args: ForwardArgs,
}

impl<'a, B: Backend> NodeRequest<'a, B> {
    /// Create a request without labels.
    pub fn new(node_idx: usize, x: &'a Tensor<B, 2>, edge_index: &'a EdgeIndex) -> Self {
        Self {
            node_idx,
            x,
            edge_index,
            label: None,
            y: None,
            num_hops: None,
            forward_args: ForwardArgs::default(),
        }
    }

    /// Set the label to explain.
    #[must_use]
    pub fn with_label(mut self, label: Target<B>) -> Self {
        self.label = Some(label);
        self
    }

    /// Set the labels of every node.
    #[must_use]
    pub fn with_y(mut self, y: &'a Target<B>) -> Self {
        self.y = Some(y);
        self
    }

    /// Set the neighborhood size.
    #[must_use]
    pub fn with_num_hops(mut self, num_hops: usize) -> Self {
        self.num_hops = Some(num_hops);
        self
    }

    /// Set extra model arguments.
    #[must_use]
    pub fn with_forward_args(mut self, forward_args: ForwardArgs) -> Self {
        self.forward_args = forward_args;
        self
    }

    /// Number of nodes in the full graph.
    pub fn num_nodes(&self) -> usize {
        self.x.dims()[0]
    }

    /// The explicit label, or row `node_idx` of `y`.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::MissingLabel`] if neither is set.
    pub fn resolve_label(&self) -> Result<Target<B>> {
        match (&self.label, self.y) {
            (Some(label), _) => Ok(label.clone()),
            (None, Some(y)) => Ok(y.select_rows(&[self.node_idx])?),
            (None, None) => Err(ExplainError::MissingLabel),
        }
    }

    /// Check that `node_idx` is a node of the graph.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::NodeOutOfRange`] otherwise.
    pub fn check_node(&self) -> Result<()> {
        let num_nodes = self.num_nodes();
        if self.node_idx >= num_nodes {
            return Err(ExplainError::NodeOutOfRange {
                node: self.node_idx,
                num_nodes,
            });
        }
        Ok(())
    }
}

/// Request to explain a whole-graph prediction.
#[derive(Debug, Clone)]
pub struct GraphRequest<'a, B: Backend> {
    /// Node features `(N, D)`.
    pub x: &'a Tensor<B, 2>,
    /// Edges of the graph.
    pub edge_index: &'a EdgeIndex,
    /// Label to explain, used as-is.
    pub label: Option<Target<B>>,
    /// Graph labels, used when `label` is absent.
    pub y: Option<&'a Target<B>>,
    /// Extra model arguments, e.g. the node-to-graph batch assignment.
    pub forward_args: ForwardArgs,
}

impl<'a, B: Backend> GraphRequest<'a, B> {
    /// Create a request without labels.
    pub fn new(x: &'a Tensor<B, 2>, edge_index: &'a EdgeIndex) -> Self {
        Self {
            x,
            edge_index,
            label: None,
            y: None,
            forward_args: ForwardArgs::default(),
        }
    }

    /// Set the label to explain.
    #[must_use]
    pub fn with_label(mut self, label: Target<B>) -> Self {
        self.label = Some(label);
        self
    }

    /// Set the graph labels.
    #[must_use]
    pub fn with_y(mut self, y: &'a Target<B>) -> Self {
        self.y = Some(y);
        self
    }

    /// Set extra model arguments.
    #[must_use]
    pub fn with_forward_args(mut self, forward_args: ForwardArgs) -> Self {
        self.forward_args = forward_args;
        self
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.x.dims()[0]
    }

    /// The explicit label, or `y`.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::MissingLabel`] if neither is set.
    pub fn resolve_label(&self) -> Result<Target<B>> {
        self.label
            .clone()
            .or_else(|| self.y.cloned())
            .ok_or(ExplainError::MissingLabel)
    }

    /// Check that every edge connects nodes of the graph.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EdgeOutOfRange`](gxai_core::CoreError::EdgeOutOfRange)
    /// for the first offending edge.
    pub fn check_edges(&self) -> Result<()> {
        self.edge_index.validate(self.num_nodes())?;
        Ok(())
    }
}

/// Request to explain a predicted link between two nodes.
#[derive(Debug, Clone)]
pub struct LinkRequest<'a, B: Backend> {
    /// Source node of the link.
    pub source: usize,
    /// Target node of the link.
    pub target: usize,
    /// Node features `(N, D)`.
    pub x: &'a Tensor<B, 2>,
    /// Edges of the graph.
    pub edge_index: &'a EdgeIndex,
}

/// Shared interface of all explainers.
///
/// Each variant implements the modes it supports; the others return
/// [`ExplainError::Unimplemented`] without doing any work.
pub trait Explainer<B: AutodiffBackend> {
    /// Which variant this is.
    fn kind(&self) -> ExplainerKind;

    /// Explain a node prediction.
    ///
    /// # Errors
    ///
    /// Returns an error if the label is missing, the node is invalid, or the
    /// model/criterion pass fails.
    fn explain_node(&self, request: &NodeRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        let _ = request;
        Err(ExplainError::Unimplemented {
            mode: "node",
            explainer: self.kind().to_string(),
        })
    }

    /// Explain a whole-graph prediction.
    ///
    /// # Errors
    ///
    /// Returns an error if the label is missing or the model/criterion pass fails.
    fn explain_graph(&self, request: &GraphRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        let _ = request;
        Err(ExplainError::Unimplemented {
            mode: "graph",
            explainer: self.kind().to_string(),
        })
    }

    /// Explain a link prediction.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::Unimplemented`] unless the variant supports links.
    fn explain_link(&self, request: &LinkRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        let _ = request;
        Err(ExplainError::Unimplemented {
            mode: "link",
            explainer: self.kind().to_string(),
        })
    }
}

/// Subgraph extraction and hop defaults shared by node explainers.
#[derive(Clone)]
pub struct ExplainerBase {
    extractor: Arc<dyn SubgraphExtractor>,
    num_hops: Option<usize>,
}

impl fmt::Debug for ExplainerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplainerBase")
            .field("extractor", &"<dyn SubgraphExtractor>")
            .field("num_hops", &self.num_hops)
            .finish()
    }
}

impl Default for ExplainerBase {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ExplainerBase {
    /// Base with the k-hop extractor and an optional default hop count.
    pub fn new(num_hops: Option<usize>) -> Self {
        Self {
            extractor: Arc::new(KHopExtractor::default()),
            num_hops,
        }
    }

    /// Replace the subgraph extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn SubgraphExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Configured default hop count.
    pub fn num_hops(&self) -> Option<usize> {
        self.num_hops
    }

    /// Hop count: request, then configured default, then model depth, then [`DEFAULT_NUM_HOPS`].
    pub fn resolve_hops(&self, requested: Option<usize>, model_layers: Option<usize>) -> usize {
        requested
            .or(self.num_hops)
            .or(model_layers)
            .unwrap_or(DEFAULT_NUM_HOPS)
    }

    /// Neighborhood of `node_idx` from the configured extractor.
    ///
    /// # Errors
    ///
    /// Propagates extractor errors.
    pub fn enclosing_subgraph(
        &self,
        node_idx: usize,
        num_hops: usize,
        edge_index: &EdgeIndex,
        num_nodes: usize,
    ) -> Result<SubgraphContext> {
        let ctx = self
            .extractor
            .extract(node_idx, num_hops, edge_index, num_nodes)?;
        if ctx.subset.is_empty() {
            tracing::warn!(node_idx, num_hops, "extractor returned an empty subgraph");
        }
        Ok(ctx)
    }

    /// Local index of `node_idx` inside `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::NodeNotInSubgraph`] if the node is not in the subset.
    pub fn locate(ctx: &SubgraphContext, node_idx: usize) -> Result<usize> {
        ctx.local_index(node_idx)
            .ok_or(ExplainError::NodeNotInSubgraph {
                node: node_idx,
                subset_len: ctx.subset.len(),
            })
    }

    /// Extract the neighborhood of the requested node and gather its features.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::NodeOutOfRange`], extractor errors, or
    /// [`ExplainError::NodeNotInSubgraph`].
    pub fn node_scope<B: AutodiffBackend>(
        &self,
        request: &NodeRequest<'_, B>,
        model_layers: Option<usize>,
    ) -> Result<NodeScope<B::InnerBackend>> {
        request.check_node()?;
        let num_hops = self.resolve_hops(request.num_hops, model_layers);
        let context = self.enclosing_subgraph(
            request.node_idx,
            num_hops,
            request.edge_index,
            request.num_nodes(),
        )?;
        let local = Self::locate(&context, request.node_idx)?;

        let x = request.x.clone().inner();
        let idx = index_tensor(&context.subset, &x.device());
        let features = x.select(0, idx);

        Ok(NodeScope {
            context,
            local,
            num_hops,
            features,
        })
    }
}

/// Neighborhood of an explained node with its detached features.
#[derive(Debug, Clone)]
pub struct NodeScope<B: Backend> {
    /// Extracted neighborhood.
    pub context: SubgraphContext,
    /// Position of the explained node in `context.subset`.
    pub local: usize,
    /// Hop count the neighborhood was extracted with.
    pub num_hops: usize,
    /// Rows of `x` for `context.subset`, shape `(n, D)`.
    pub features: Tensor<B, 2>,
}

/// Runtime choice among the explainer variants.
#[derive(Debug)]
pub enum AnyExplainer<M, C> {
    /// Integrated Gradients.
    IntegratedGradients(IntegratedGradExplainer<M, C>),
    /// Input-gradient saliency.
    Grad(GradExplainer<M, C>),
    /// Seeded random scores.
    Random(RandomExplainer),
}

impl<B, M, C> Explainer<B> for AnyExplainer<M, C>
where
    B: AutodiffBackend,
    M: GraphModel<B>,
    C: Criterion<B>,
{
    fn kind(&self) -> ExplainerKind {
        match self {
            AnyExplainer::IntegratedGradients(_) => ExplainerKind::IntegratedGradients,
            AnyExplainer::Grad(_) => ExplainerKind::Grad,
            AnyExplainer::Random(_) => ExplainerKind::Random,
        }
    }

    fn explain_node(&self, request: &NodeRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        match self {
            AnyExplainer::IntegratedGradients(e) => e.explain_node(request),
            AnyExplainer::Grad(e) => e.explain_node(request),
            AnyExplainer::Random(e) => e.explain_node(request),
        }
    }

    fn explain_graph(&self, request: &GraphRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        match self {
            AnyExplainer::IntegratedGradients(e) => e.explain_graph(request),
            AnyExplainer::Grad(e) => e.explain_graph(request),
            AnyExplainer::Random(e) => e.explain_graph(request),
        }
    }

    fn explain_link(&self, request: &LinkRequest<'_, B>) -> Result<Explanation<B::InnerBackend>> {
        match self {
            AnyExplainer::IntegratedGradients(e) => e.explain_link(request),
            AnyExplainer::Grad(e) => e.explain_link(request),
            AnyExplainer::Random(e) => e.explain_link(request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_autodiff::Autodiff;
    use burn_ndarray::NdArray;
    use gxai_core::Flow;

    type TestBackend = Autodiff<NdArray>;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("ig".parse::<ExplainerKind>().unwrap(), ExplainerKind::IntegratedGradients);
        assert_eq!("Grad".parse::<ExplainerKind>().unwrap(), ExplainerKind::Grad);
        assert_eq!("rand".parse::<ExplainerKind>().unwrap(), ExplainerKind::Random);
        assert!("gnnex".parse::<ExplainerKind>().is_err());
        assert_eq!(ExplainerKind::IntegratedGradients.short_name(), "ig");
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&ExplainerKind::IntegratedGradients).unwrap();
        assert_eq!(json, r#""integrated_gradients""#);
    }

    #[test]
    fn test_resolve_hops_precedence() {
        let base = ExplainerBase::new(Some(2));
        assert_eq!(base.resolve_hops(Some(1), Some(4)), 1);
        assert_eq!(base.resolve_hops(None, Some(4)), 2);

        let base = ExplainerBase::default();
        assert_eq!(base.resolve_hops(None, Some(4)), 4);
        assert_eq!(base.resolve_hops(None, None), DEFAULT_NUM_HOPS);
    }

    #[test]
    fn test_enclosing_subgraph_uses_extractor() {
        let base = ExplainerBase::default()
            .with_extractor(Arc::new(KHopExtractor::new(Flow::TargetToSource)));
        let edges = EdgeIndex::from_pairs(&[(0, 1), (1, 2)]);
        let ctx = base.enclosing_subgraph(0, 1, &edges, 3).unwrap();
        assert_eq!(ctx.subset, vec![0, 1]);
        assert_eq!(ExplainerBase::locate(&ctx, 1).unwrap(), 1);
        assert!(matches!(
            ExplainerBase::locate(&ctx, 2),
            Err(ExplainError::NodeNotInSubgraph { node: 2, subset_len: 2 })
        ));
    }

    #[test]
    fn test_node_request_label_resolution() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::zeros([3, 2], &device);
        let edges = EdgeIndex::ring(3);
        let y = Target::<TestBackend>::classes(&[0, 1, 2], &device);

        let missing = NodeRequest::new(1, &x, &edges);
        assert!(matches!(missing.resolve_label(), Err(ExplainError::MissingLabel)));

        let from_y = NodeRequest::new(1, &x, &edges).with_y(&y);
        match from_y.resolve_label().unwrap() {
            Target::Classes(t) => {
                let values: Vec<i64> = t.into_data().convert::<i64>().to_vec().unwrap();
                assert_eq!(values, vec![1]);
            }
            Target::Values(_) => panic!("expected class label"),
        }

        let explicit = NodeRequest::new(1, &x, &edges)
            .with_y(&y)
            .with_label(Target::classes(&[7], &device));
        assert_eq!(explicit.resolve_label().unwrap().num_rows(), 1);
    }

    #[test]
    fn test_node_request_range_check() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::zeros([3, 2], &device);
        let edges = EdgeIndex::ring(3);
        assert!(NodeRequest::new(2, &x, &edges).check_node().is_ok());
        assert!(matches!(
            NodeRequest::new(3, &x, &edges).check_node(),
            Err(ExplainError::NodeOutOfRange { node: 3, num_nodes: 3 })
        ));
    }

    #[test]
    fn test_graph_request_label_resolution() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 2>::zeros([3, 2], &device);
        let edges = EdgeIndex::ring(3);
        let y = Target::<TestBackend>::classes(&[1], &device);

        assert!(matches!(
            GraphRequest::new(&x, &edges).resolve_label(),
            Err(ExplainError::MissingLabel)
        ));
        assert_eq!(GraphRequest::new(&x, &edges).with_y(&y).resolve_label().unwrap().num_rows(), 1);
    }
}
