//! # gxai_core
//!
//! Core types and traits for graphxai-rs graph explainability.
//!
//! This crate provides:
//! - [`Graph`] and [`Target`] for node features, edges and labels
//! - [`EdgeIndex`] for edge lists with validation and tensor conversion
//! - [`SubgraphExtractor`] and [`KHopExtractor`] for k-hop neighborhoods
//! - [`GraphModel`] trait for differentiable predictive models
//! - [`Seed`] for deterministic random number generation
//! - Error types and common utilities
//!
//! ## Shape Convention
//!
//! Node features follow the convention `(N, D)`:
//! - `N`: Number of nodes
//! - `D`: Feature dimensions per node
//!
//! Edges are `(source, target)` pairs indexing rows of the feature matrix.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gxai_core::{EdgeIndex, KHopExtractor, SubgraphExtractor};
//!
//! let edges = EdgeIndex::ring(5);
//! let ctx = KHopExtractor::default().extract(2, 1, &edges, 5)?;
//! assert_eq!(ctx.subset, vec![1, 2, 3]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod edge_index;
mod error;
mod graph;
mod model_trait;
mod seed;
pub mod subgraph;

pub use edge_index::EdgeIndex;
pub use error::{CoreError, Result};
pub use graph::{features_from_rows, index_tensor, Graph, GraphSpec, Target};
pub use model_trait::{ForwardArgs, GraphModel};
pub use seed::Seed;
pub use subgraph::{Flow, KHopExtractor, SubgraphContext, SubgraphExtractor};

/// Backend type aliases for convenience
pub mod backend {
    #[cfg(feature = "backend-ndarray")]
    pub use burn_ndarray::NdArray;

    #[cfg(feature = "backend-ndarray")]
    pub use burn_autodiff::Autodiff;

    /// Autodiff-enabled CPU backend used for explanations.
    #[cfg(feature = "backend-ndarray")]
    pub type ExplainBackend = Autodiff<NdArray>;
}
