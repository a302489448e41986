//! Loss functions explained predictions are differentiated through.

use burn::nn::loss::{CrossEntropyLossConfig, MseLoss, Reduction};
use burn::prelude::*;
use gxai_core::Target;
use serde::{Deserialize, Serialize};

use crate::error::{ExplainError, Result};

/// Loss between model output and the label being explained.
pub trait Criterion<B: Backend> {
    /// Compute a scalar loss of shape `(1,)`.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::Criterion`] if the label kind or shape does
    /// not fit this loss.
    fn loss(&self, output: Tensor<B, 2>, target: Target<B>) -> Result<Tensor<B, 1>>;
}

/// How per-element losses are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossReduction {
    /// Average over elements.
    #[default]
    Mean,
    /// Sum over elements.
    Sum,
}

impl From<LossReduction> for Reduction {
    fn from(reduction: LossReduction) -> Self {
        match reduction {
            LossReduction::Mean => Reduction::Mean,
            LossReduction::Sum => Reduction::Sum,
        }
    }
}

/// Mean squared error against value targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MseCriterion {
    /// Reduction over elements.
    pub reduction: LossReduction,
}

impl MseCriterion {
    /// MSE averaged over elements.
    pub fn mean() -> Self {
        Self {
            reduction: LossReduction::Mean,
        }
    }

    /// Squared error summed over elements.
    pub fn sum() -> Self {
        Self {
            reduction: LossReduction::Sum,
        }
    }
}

impl<B: Backend> Criterion<B> for MseCriterion {
    fn loss(&self, output: Tensor<B, 2>, target: Target<B>) -> Result<Tensor<B, 1>> {
        let Target::Values(target) = target else {
            return Err(ExplainError::Criterion(
                "MSE needs value targets, got class labels".to_string(),
            ));
        };
        if output.dims() != target.dims() {
            return Err(ExplainError::Criterion(format!(
                "output shape {:?} does not match target shape {:?}",
                output.dims(),
                target.dims()
            )));
        }
        Ok(MseLoss::new().forward(output, target, self.reduction.into()))
    }
}

/// Cross-entropy over logits against class labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossEntropyCriterion;

impl CrossEntropyCriterion {
    /// Create a new cross-entropy criterion.
    pub fn new() -> Self {
        Self
    }
}

impl<B: Backend> Criterion<B> for CrossEntropyCriterion {
    fn loss(&self, output: Tensor<B, 2>, target: Target<B>) -> Result<Tensor<B, 1>> {
        let Target::Classes(classes) = target else {
            return Err(ExplainError::Criterion(
                "cross-entropy needs class labels, got value targets".to_string(),
            ));
        };
        let [rows, _] = output.dims();
        if classes.dims()[0] != rows {
            return Err(ExplainError::Criterion(format!(
                "{} labels for {} output rows",
                classes.dims()[0],
                rows
            )));
        }
        let loss = CrossEntropyLossConfig::new().init(&output.device());
        Ok(loss.forward(output, classes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_scalar().elem()
    }

    #[test]
    fn test_mse_reductions() {
        let device = Default::default();
        let output = Tensor::<TestBackend, 2>::from_data(TensorData::new(vec![1.0f32, 3.0], [1, 2]), &device);
        let target = Tensor::<TestBackend, 2>::zeros([1, 2], &device);

        let mean = MseCriterion::mean()
            .loss(output.clone(), Target::Values(target.clone()))
            .unwrap();
        let sum = MseCriterion::sum().loss(output, Target::Values(target)).unwrap();

        assert!((scalar(mean) - 5.0).abs() < 1e-6);
        assert!((scalar(sum) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_mse_rejects_classes() {
        let device = Default::default();
        let output = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let result = MseCriterion::mean().loss(output, Target::classes(&[0], &device));
        assert!(matches!(result, Err(ExplainError::Criterion(_))));
    }

    #[test]
    fn test_mse_rejects_shape_mismatch() {
        let device = Default::default();
        let output = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let target = Tensor::<TestBackend, 2>::zeros([1, 3], &device);
        let result = MseCriterion::mean().loss(output, Target::Values(target));
        assert!(matches!(result, Err(ExplainError::Criterion(_))));
    }

    #[test]
    fn test_cross_entropy_uniform_logits() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::zeros([2, 4], &device);
        let loss = CrossEntropyCriterion::new()
            .loss(logits, Target::classes(&[1, 3], &device))
            .unwrap();
        assert!((scalar(loss) - 4.0f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_cross_entropy_rejects_values() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let target = Tensor::<TestBackend, 2>::zeros([1, 2], &device);
        let result = CrossEntropyCriterion::new().loss(logits, Target::Values(target));
        assert!(matches!(result, Err(ExplainError::Criterion(_))));
    }

    #[test]
    fn test_reduction_serde() {
        let json = serde_json::to_string(&MseCriterion::sum()).unwrap();
        assert_eq!(json, r#"{"reduction":"sum"}"#);
    }
}
