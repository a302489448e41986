//! # gxai_explain
//!
//! Explainers for graph neural network predictions.
//!
//! This crate provides:
//! - [`IntegratedGradExplainer`] - Integrated Gradients over node features,
//!   run on the k-hop subgraph of the explained node
//! - [`GradExplainer`] - Plain input-gradient saliency
//! - [`RandomExplainer`] - Seeded random importances, the faithfulness floor
//! - [`Explanation`] - Feature, node and edge importances with their
//!   structural context
//!
//! All explainers implement [`Explainer`]; [`AnyExplainer`] dispatches over
//! the closed set when the variant is chosen at runtime.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gxai_explain::{Explainer, IntegratedGradExplainer, MseCriterion, NodeRequest};
//!
//! let explainer = IntegratedGradExplainer::new(model, MseCriterion::sum());
//! let request = NodeRequest::new(2, &x, &edge_index).with_y(&y);
//! let exp = explainer.explain_node(&request)?;
//! println!("{:?}", exp.feature_imp);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod baseline;
mod criterion;
mod error;
mod explainer;
mod explanation;
mod gradient;
mod integrated_gradients;
pub mod path;
mod random;

pub use baseline::BaselineType;
pub use criterion::{CrossEntropyCriterion, Criterion, LossReduction, MseCriterion};
pub use error::{ExplainError, Result};
pub use explainer::{
    AnyExplainer, Explainer, ExplainerBase, ExplainerKind, GraphRequest, LinkRequest, NodeRequest,
    NodeScope,
    DEFAULT_NUM_HOPS,
};
pub use explanation::{Explanation, ExplanationContext, ExplanationReport};
pub use gradient::{GradConfig, GradExplainer};
pub use integrated_gradients::{IntegratedGradExplainer, IntegratedGradientsConfig};
pub use path::{trapezoid_mean, PathIntegrator, PathSample};
pub use random::{RandomConfig, RandomExplainer};
