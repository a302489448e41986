//! # gxai
//!
//! Attribution explainers for graph neural network predictions.
//!
//! graphxai-rs attributes node-level and graph-level predictions of
//! differentiable graph models to node features, nodes and edges:
//!
//! - **Core**: graphs, edge lists, labels, k-hop subgraph extraction
//! - **Models**: identity, linear probe and GCN models for explanation
//! - **Explain**: Integrated Gradients, gradient saliency and random baselines
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gxai::prelude::*;
//!
//! let device = Default::default();
//! let model = GcnConfig::new(num_features, num_classes).init::<ExplainBackend>(&device);
//!
//! let explainer = IntegratedGradExplainer::new(model, CrossEntropyCriterion::new());
//! let request = NodeRequest::new(3, &graph.x, &graph.edge_index).with_y(&y);
//! let explanation = explainer.explain_node(&request)?;
//!
//! for (node, score) in explanation.top_nodes(5)? {
//!     println!("node {node}: {score:.4}");
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `backend-ndarray` (default): CPU backend aliases in [`core::backend`]

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all crates
pub use gxai_core as core;
pub use gxai_explain as explain;
pub use gxai_models as models;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use gxai::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use gxai_core::{
        EdgeIndex, Flow, ForwardArgs, Graph, GraphModel, GraphSpec, KHopExtractor, Seed,
        SubgraphContext, SubgraphExtractor, Target,
    };

    #[cfg(feature = "backend-ndarray")]
    pub use gxai_core::backend::ExplainBackend;

    // Models
    pub use gxai_models::{Gcn, GcnConfig, IdentityModel, LinearProbe};

    // Explain
    pub use gxai_explain::{
        AnyExplainer, BaselineType, CrossEntropyCriterion, Criterion, Explainer, ExplainerKind,
        Explanation, ExplanationReport, GradExplainer, GraphRequest, IntegratedGradExplainer,
        IntegratedGradientsConfig, MseCriterion, NodeRequest, RandomConfig, RandomExplainer,
    };
}
