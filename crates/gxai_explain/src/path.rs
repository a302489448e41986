//! Straight-line path integration of gradients.
//!
//! Integrated Gradients approximates
//!
//! ```text
//! IG(x) = (x - x') * ∫₀¹ ∂L(x' + α(x - x')) / ∂x dα
//! ```
//!
//! by sampling the path at `steps + 1` evenly spaced points and averaging the
//! gradients with the trapezoidal rule.

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use gxai_core::index_tensor;

use crate::error::{ExplainError, Result};

/// One point on the integration path with a differentiable view of its features.
///
/// A sample is consumed by [`PathSample::backward`], so each differentiable
/// handle serves exactly one forward/backward pass.
#[derive(Debug)]
pub struct PathSample<B: AutodiffBackend> {
    features: Tensor<B, 2>,
    alpha: f32,
    step: usize,
}

impl<B: AutodiffBackend> PathSample<B> {
    /// Wrap detached features as a fresh differentiable leaf.
    pub fn new(features: Tensor<B::InnerBackend, 2>, alpha: f32, step: usize) -> Self {
        Self {
            features: Tensor::from_inner(features).require_grad(),
            alpha,
            step,
        }
    }

    /// Interpolation coefficient in `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Position of this sample on the path.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Shape of the sampled feature matrix.
    pub fn dims(&self) -> [usize; 2] {
        self.features.dims()
    }

    /// Run one forward/backward pass and return the input gradient.
    ///
    /// `loss_fn` receives the differentiable features and returns the scalar
    /// loss. The gradient is restricted to `rows` when given. Inputs the loss
    /// does not depend on get a zero gradient.
    ///
    /// # Errors
    ///
    /// Propagates errors from `loss_fn`.
    pub fn backward<F>(self, rows: Option<&[usize]>, loss_fn: F) -> Result<Tensor<B::InnerBackend, 2>>
    where
        F: FnOnce(Tensor<B, 2>) -> Result<Tensor<B, 1>>,
    {
        let loss = loss_fn(self.features.clone())?;
        let grads = loss.backward();
        let grad = self
            .features
            .grad(&grads)
            .unwrap_or_else(|| self.features.clone().inner().zeros_like());

        Ok(match rows {
            Some(rows) => {
                let idx = index_tensor(rows, &grad.device());
                grad.select(0, idx)
            }
            None => grad,
        })
    }
}

/// `baseline + alpha * (target - baseline)`.
pub fn interpolate<B: Backend>(target: &Tensor<B, 2>, baseline: &Tensor<B, 2>, alpha: f32) -> Tensor<B, 2> {
    baseline.clone() + (target.clone() - baseline.clone()) * alpha
}

/// Average adjacent gradient pairs, then average over the pairs.
///
/// Computes `(1/steps) * Σ (g[i] + g[i+1]) / 2` for `steps = grads.len() - 1`,
/// so every adjacent pair is used exactly once.
///
/// # Errors
///
/// Returns [`ExplainError::InvalidSteps`] when fewer than two samples are given.
pub fn trapezoid_mean<B: Backend>(grads: &[Tensor<B, 2>]) -> Result<Tensor<B, 2>> {
    if grads.len() < 2 {
        return Err(ExplainError::InvalidSteps(grads.len().saturating_sub(1)));
    }
    let steps = grads.len() - 1;
    let total = grads
        .windows(2)
        .map(|pair| (pair[0].clone() + pair[1].clone()) / 2.0)
        .reduce(|acc, g| acc + g)
        .ok_or(ExplainError::InvalidSteps(steps))?;
    Ok(total / steps as f32)
}

/// Drives the forward/backward passes along the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathIntegrator {
    steps: usize,
}

impl PathIntegrator {
    /// Create an integrator with `steps` intervals (`steps + 1` samples).
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::InvalidSteps`] if `steps` is zero.
    pub fn new(steps: usize) -> Result<Self> {
        if steps == 0 {
            return Err(ExplainError::InvalidSteps(steps));
        }
        Ok(Self { steps })
    }

    /// Number of intervals.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of samples, i.e. forward/backward passes.
    pub fn num_samples(&self) -> usize {
        self.steps + 1
    }

    /// Average gradient along the path from `baseline` to `target`.
    ///
    /// `pass` is called once per sample in path order, starting at the
    /// baseline and ending at the target.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `pass`; no partial result is kept.
    pub fn integrate<B, F>(
        &self,
        target: &Tensor<B::InnerBackend, 2>,
        baseline: &Tensor<B::InnerBackend, 2>,
        mut pass: F,
    ) -> Result<Tensor<B::InnerBackend, 2>>
    where
        B: AutodiffBackend,
        F: FnMut(PathSample<B>) -> Result<Tensor<B::InnerBackend, 2>>,
    {
        let mut grads = Vec::with_capacity(self.num_samples());
        for step in 0..=self.steps {
            let alpha = step as f32 / self.steps as f32;
            let features = interpolate(target, baseline, alpha);
            tracing::trace!(step, alpha, "path sample");
            grads.push(pass(PathSample::new(features, alpha, step))?);
        }
        trapezoid_mean(&grads)
    }
}
