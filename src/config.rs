//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cleaning::{DataSplitStrategy, TARGET_COLUMN};
use crate::deployment::{DeploymentTarget, DeploymentTriggerConfig, DEFAULT_SERVICE_START_STOP_TIMEOUT};
use crate::error::{PipelineError, Result};
use crate::evaluation::MetricKind;
use crate::tracking::ExperimentConfig;
use crate::training::Hyperparameters;

/// Everything a pipeline run needs besides the data itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Dataset to ingest (CSV, JSON or JSON lines)
    pub data_path: PathBuf,
    /// Target column
    pub target: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the train/test shuffle
    pub random_state: u64,
    /// Passed through to the model unchanged
    pub hyperparameters: Hyperparameters,
    /// Metric handed to the deployment trigger
    pub trigger_metric: MetricKind,
    /// Threshold the trigger metric has to exceed
    pub min_accuracy: f64,
    /// Worker count recorded on the deployed service
    pub workers: usize,
    /// Service start/stop timeout in seconds
    pub timeout_secs: u64,
    /// Experiment tracking store
    pub tracking_dir: PathBuf,
    pub experiment_name: String,
    /// Model registry and service records
    pub registry_dir: PathBuf,
    /// Name the deployed model is registered under
    pub model_name: String,
    /// Rows sampled by the inference pipeline
    pub sample_size: usize,
    pub sample_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let experiment = ExperimentConfig::default();
        let trigger = DeploymentTriggerConfig::default();
        Self {
            data_path: PathBuf::from("data/olist_customers_dataset.csv"),
            target: TARGET_COLUMN.to_string(),
            test_size: 0.2,
            random_state: 42,
            hyperparameters: Hyperparameters::new(),
            trigger_metric: MetricKind::Mse,
            min_accuracy: trigger.min_accuracy,
            workers: 1,
            timeout_secs: DEFAULT_SERVICE_START_STOP_TIMEOUT,
            tracking_dir: experiment.output_dir,
            experiment_name: experiment.experiment_name,
            registry_dir: PathBuf::from("./model_registry"),
            model_name: "model".to_string(),
            sample_size: 100,
            sample_seed: 42,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_hyperparameters(mut self, params: Hyperparameters) -> Self {
        self.hyperparameters = params;
        self
    }

    pub fn with_trigger_metric(mut self, metric: MetricKind) -> Self {
        self.trigger_metric = metric;
        self
    }

    pub fn with_min_accuracy(mut self, min_accuracy: f64) -> Self {
        self.min_accuracy = min_accuracy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_tracking_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tracking_dir = dir.into();
        self
    }

    pub fn with_registry_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.registry_dir = dir.into();
        self
    }

    pub fn with_sample_size(mut self, n: usize) -> Self {
        self.sample_size = n;
        self
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| {
            PipelineError::ConfigError(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::ConfigError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.target.is_empty() {
            return Err(PipelineError::ConfigError("target must not be empty".to_string()));
        }
        if !self.min_accuracy.is_finite() {
            return Err(PipelineError::ConfigError(format!(
                "min_accuracy must be finite, got {}",
                self.min_accuracy
            )));
        }
        if self.workers == 0 {
            return Err(PipelineError::ConfigError("workers must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(PipelineError::ConfigError("timeout_secs must be positive".to_string()));
        }
        if self.sample_size == 0 {
            return Err(PipelineError::ConfigError("sample_size must be positive".to_string()));
        }
        if self.model_name.is_empty() {
            return Err(PipelineError::ConfigError("model_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Split strategy for this configuration
    pub fn split_strategy(&self) -> DataSplitStrategy {
        DataSplitStrategy::new()
            .with_target(self.target.clone())
            .with_test_size(self.test_size)
            .with_random_state(self.random_state)
    }

    pub fn experiment_config(&self) -> ExperimentConfig {
        ExperimentConfig {
            output_dir: self.tracking_dir.clone(),
            experiment_name: self.experiment_name.clone(),
            ..Default::default()
        }
    }

    pub fn deployment_target(&self) -> DeploymentTarget {
        DeploymentTarget::default().with_model_name(self.model_name.clone())
    }
}
