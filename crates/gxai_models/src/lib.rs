//! # gxai_models
//!
//! Differentiable graph models for graphxai-rs.
//!
//! These models are the predictive collaborators explainers run against:
//!
//! - [`IdentityModel`] - Output equals input, useful for analytic checks
//! - [`LinearProbe`] - Per-node linear map with known weights
//! - [`GcnConv`] / [`Gcn`] - Graph Convolutional Network (Kipf & Welling, 2017)
//! - [`global_mean_pool`] - Graph-level readout
//!
//! Models are inference-only: weights come from a seeded initializer or are
//! supplied by the caller.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod gcn;
mod identity;
mod pool;

pub use gcn::{normalized_adjacency, Gcn, GcnConfig, GcnConv};
pub use identity::{IdentityModel, LinearProbe};
pub use pool::global_mean_pool;
