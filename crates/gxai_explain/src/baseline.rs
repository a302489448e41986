//! Baselines for path attribution.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Starting point of the integration path.
///
/// The attribution of a feature measures the change from its baseline
/// value, so the baseline should represent "absence of signal" for the data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaselineType {
    /// All-zero features.
    #[default]
    Zeros,
    /// All-one features.
    Ones,
    /// Every feature set to the same value.
    Constant(f32),
    /// Per-feature mean over the explained nodes, repeated for every node.
    Mean,
}

impl BaselineType {
    /// Build a baseline with the same shape as `x`.
    pub fn build<B: Backend>(&self, x: &Tensor<B, 2>) -> Tensor<B, 2> {
        match self {
            BaselineType::Zeros => x.zeros_like(),
            BaselineType::Ones => x.ones_like(),
            BaselineType::Constant(value) => x.zeros_like() + *value,
            BaselineType::Mean => {
                let [num_nodes, _] = x.dims();
                x.clone().mean_dim(0).repeat_dim(0, num_nodes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::tensor::TensorData;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn features() -> Tensor<TestBackend, 2> {
        let device = Default::default();
        Tensor::from_data(TensorData::new(vec![1.0f32, 2.0, 3.0, 6.0], [2, 2]), &device)
    }

    fn values(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().to_vec().unwrap()
    }

    #[test]
    fn test_zero_baseline() {
        let baseline = BaselineType::Zeros.build(&features());
        assert_eq!(baseline.dims(), [2, 2]);
        assert_eq!(values(baseline), vec![0.0; 4]);
    }

    #[test]
    fn test_ones_and_constant() {
        assert_eq!(values(BaselineType::Ones.build(&features())), vec![1.0; 4]);
        assert_eq!(
            values(BaselineType::Constant(-0.5).build(&features())),
            vec![-0.5; 4]
        );
    }

    #[test]
    fn test_mean_baseline() {
        let baseline = BaselineType::Mean.build(&features());
        assert_eq!(baseline.dims(), [2, 2]);
        assert_eq!(values(baseline), vec![2.0, 4.0, 2.0, 4.0]);
    }

    #[test]
    fn test_default_is_zeros() {
        assert_eq!(BaselineType::default(), BaselineType::Zeros);
    }

    #[test]
    fn test_baseline_serde() {
        let json = serde_json::to_string(&BaselineType::Constant(0.25)).unwrap();
        let decoded: BaselineType = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, BaselineType::Constant(0.25));
    }
}
