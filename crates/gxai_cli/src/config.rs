//! Settings for `gxai explain`, loadable from JSON and overridable by flags.

use std::path::Path;

use anyhow::{Context, Result};
use gxai_explain::{BaselineType, ExplainerKind};
use serde::{Deserialize, Serialize};

/// Explanation run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    /// Explainer variant.
    pub method: ExplainerKind,
    /// Integrated Gradients path intervals.
    pub steps: usize,
    /// Neighborhood size for node explanations; the model depth when unset.
    pub num_hops: Option<usize>,
    /// Hidden layer sizes of the GCN.
    pub hidden_sizes: Vec<usize>,
    /// Output classes; derived from the labels when unset.
    pub num_classes: Option<usize>,
    /// Seed for model initialization and random scores.
    pub seed: u64,
    /// Integration baseline.
    pub baseline: BaselineType,
    /// Min-max scale the importances before printing.
    pub normalize: bool,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            method: ExplainerKind::IntegratedGradients,
            steps: 40,
            num_hops: None,
            hidden_sizes: vec![16, 16],
            num_classes: None,
            seed: 42,
            baseline: BaselineType::Zeros,
            normalize: false,
        }
    }
}

impl ExplainConfig {
    /// Load a configuration file; missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Class count from the config, else from the labels, else 2.
    pub fn resolve_num_classes(&self, labels: Option<&[usize]>) -> usize {
        self.num_classes
            .or_else(|| labels.and_then(|y| y.iter().max()).map(|&max| max + 1))
            .unwrap_or(2)
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ExplainConfig = serde_json::from_str(r#"{"method": "grad", "steps": 8}"#).unwrap();
        assert_eq!(config.method, ExplainerKind::Grad);
        assert_eq!(config.steps, 8);
        assert_eq!(config.hidden_sizes, vec![16, 16]);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_baseline_from_json() {
        let config: ExplainConfig = serde_json::from_str(r#"{"baseline": {"constant": 0.5}}"#).unwrap();
        assert_eq!(config.baseline, BaselineType::Constant(0.5));
    }

    #[test]
    fn test_num_classes_resolution() {
        let config = ExplainConfig::default();
        assert_eq!(config.resolve_num_classes(None), 2);
        assert_eq!(config.resolve_num_classes(Some(&[0, 3, 1])), 4);

        let config = ExplainConfig {
            num_classes: Some(6),
            ..ExplainConfig::default()
        };
        assert_eq!(config.resolve_num_classes(Some(&[0, 1])), 6);
    }
}
