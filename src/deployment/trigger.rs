//! Deployment gate

use serde::{Deserialize, Serialize};

/// Returns `true` when `metric_value` is strictly greater than `min_threshold`.
///
/// # Known defect
///
/// The continuous deployment pipeline gates on MSE by default, an error
/// metric where lower is better, so a *worse* model is *more* likely to be
/// deployed. The comparison is kept as-is until the product requirement is
/// clarified; see `PipelineConfig::trigger_metric`.
pub fn deployment_trigger(metric_value: f64, min_threshold: f64) -> bool {
    metric_value > min_threshold
}

/// Parameters that decide whether a model gets deployed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeploymentTriggerConfig {
    /// Threshold the gated metric has to exceed
    pub min_accuracy: f64,
}

impl Default for DeploymentTriggerConfig {
    fn default() -> Self {
        Self { min_accuracy: 0.9 }
    }
}

impl DeploymentTriggerConfig {
    pub fn new(min_accuracy: f64) -> Self {
        Self { min_accuracy }
    }

    /// Apply [`deployment_trigger`] with this threshold
    pub fn should_deploy(&self, metric_value: f64) -> bool {
        deployment_trigger(metric_value, self.min_accuracy)
    }
}
