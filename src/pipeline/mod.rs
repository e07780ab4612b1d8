//! Pipeline orchestration
//!
//! Steps are plain functions over an explicit [`PipelineContext`]; the
//! pipelines sequence them inside one tracked run. [`run_step`] is the only
//! place where a failing step is logged.

mod pipelines;
mod steps;

pub use pipelines::{
    continuous_deployment_pipeline, continuous_deployment_pipeline_with_data, get_data_for_test,
    inference_pipeline, inference_pipeline_with_data, train_pipeline, train_pipeline_with_data,
    DeploymentOutcome, DeploymentParams, InferenceOutcome, TrainingOutcome,
    CONTINUOUS_DEPLOYMENT_PIPELINE, INFERENCE_PIPELINE, TRAINING_PIPELINE,
};
pub use steps::{clean_data, deploy_model, deployment_trigger_step, evaluate_step, train_model};

use tracing::{error, warn};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::tracking::ExperimentTracker;

/// Configuration and experiment tracker shared by the steps of one run
#[derive(Debug)]
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub tracker: ExperimentTracker,
}

impl PipelineContext {
    /// Validate `config` and open its tracking store
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let tracker = ExperimentTracker::new(config.experiment_config())?;
        Ok(Self { config, tracker })
    }

    pub fn with_tracker(config: PipelineConfig, tracker: ExperimentTracker) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tracker })
    }
}

/// Run one pipeline step.
///
/// On failure the error is logged once with the step name, the active
/// tracker run is ended as failed, and the error is returned unchanged.
pub fn run_step<T>(ctx: &PipelineContext, step: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    f().map_err(|e| {
        error!(step, error = %e, "Pipeline step failed");
        if ctx.tracker.has_active_run() {
            if let Err(tracking_err) = ctx.tracker.end_run_failed() {
                warn!(step, error = %tracking_err, "Could not mark run as failed");
            }
        }
        e
    })
}
