//! Simple models with closed-form gradients.

use burn::module::Param;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use gxai_core::{EdgeIndex, ForwardArgs, GraphModel};

/// Model whose output is its input.
///
/// The gradient of any loss with respect to the input equals the gradient
/// with respect to the output, which makes attribution results computable
/// by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityModel;

impl<B: Backend> GraphModel<B> for IdentityModel {
    fn forward(&self, x: Tensor<B, 2>, _edge_index: &EdgeIndex, _args: &ForwardArgs) -> Tensor<B, 2> {
        x
    }
}

/// Per-node linear map `x W + b` ignoring graph structure.
#[derive(Module, Debug)]
pub struct LinearProbe<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> LinearProbe<B> {
    /// Randomly initialized probe.
    pub fn new(in_features: usize, out_features: usize, device: &B::Device) -> Self {
        Self {
            linear: LinearConfig::new(in_features, out_features).init(device),
        }
    }

    /// Probe with fixed weights of shape (in_features, out_features).
    pub fn from_weights(weight: Tensor<B, 2>, bias: Option<Tensor<B, 1>>) -> Self {
        Self {
            linear: Linear {
                weight: Param::from_tensor(weight),
                bias: bias.map(Param::from_tensor),
            },
        }
    }

    /// Weight matrix (in_features, out_features).
    pub fn weight(&self) -> Tensor<B, 2> {
        self.linear.weight.val()
    }
}

impl<B: Backend> GraphModel<B> for LinearProbe<B> {
    fn forward(&self, x: Tensor<B, 2>, _edge_index: &EdgeIndex, _args: &ForwardArgs) -> Tensor<B, 2> {
        self.linear.forward(x)
    }
}
