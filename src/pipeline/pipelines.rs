//! Training, continuous deployment and inference pipelines

use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::steps::{clean_data, deploy_model, deployment_trigger_step, evaluate_step, train_model};
use super::{run_step, PipelineContext};
use crate::cleaning::{DataCleaning, DataProcessStrategy};
use crate::config::PipelineConfig;
use crate::deployment::{DeploymentService, ModelDeployer, VersionedModel};
use crate::error::{PipelineError, Result};
use crate::evaluation::EvaluationReport;
use crate::ingest::ingest_data;
use crate::training::{LinearRegression, Regressor};
use crate::utils::{columns_to_array2, sample_rows};

pub const TRAINING_PIPELINE: &str = "train_pipeline";
pub const CONTINUOUS_DEPLOYMENT_PIPELINE: &str = "continuous_deployment_pipeline";
pub const INFERENCE_PIPELINE: &str = "inference_pipeline";

/// Trained model and its holdout scores
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: LinearRegression,
    pub feature_names: Vec<String>,
    pub report: EvaluationReport,
    pub n_train: usize,
    pub n_test: usize,
    pub run_id: String,
}

/// Parameters of the continuous deployment pipeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeploymentParams {
    /// Threshold handed to the deployment trigger
    pub min_accuracy: f64,
    pub workers: usize,
    pub timeout_secs: u64,
}

impl Default for DeploymentParams {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl DeploymentParams {
    /// Trigger threshold, worker count and timeout of `config`
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_accuracy: config.min_accuracy,
            workers: config.workers,
            timeout_secs: config.timeout_secs,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeploymentOutcome {
    pub training: TrainingOutcome,
    pub decision: bool,
    /// The service started for the new model, if it was deployed
    pub service: Option<DeploymentService>,
}

#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub service: DeploymentService,
    pub predictions: Array1<f64>,
}

fn training_steps(ctx: &PipelineContext, df: &DataFrame, run_id: String) -> Result<TrainingOutcome> {
    let split = run_step(ctx, "clean_data", || clean_data(df, &ctx.config.split_strategy()))?;
    let model = run_step(ctx, "train_model", || train_model(ctx, &split.x_train, &split.y_train))?;
    let report = run_step(ctx, "evaluation", || {
        evaluate_step(ctx, &model, &split.x_test, &split.y_test)
    })?;

    Ok(TrainingOutcome {
        n_train: split.n_train(),
        n_test: split.n_test(),
        feature_names: split.feature_names,
        model,
        report,
        run_id,
    })
}

/// ingest → clean → train → evaluate
pub fn train_pipeline(ctx: &PipelineContext) -> Result<TrainingOutcome> {
    let df = run_step(ctx, "ingest_data", || ingest_data(&ctx.config.data_path))?;
    train_pipeline_with_data(ctx, &df)
}

/// [`train_pipeline`] on an already loaded frame
pub fn train_pipeline_with_data(ctx: &PipelineContext, df: &DataFrame) -> Result<TrainingOutcome> {
    let run_id = ctx.tracker.start_run(TRAINING_PIPELINE)?;
    let outcome = training_steps(ctx, df, run_id)?;
    ctx.tracker.end_run_success()?;

    info!(
        mse = outcome.report.mse,
        r2 = outcome.report.r2,
        rmse = outcome.report.rmse,
        "Training pipeline finished"
    );
    Ok(outcome)
}

/// ingest → clean → train → evaluate → trigger → deploy
pub fn continuous_deployment_pipeline(ctx: &PipelineContext, params: DeploymentParams) -> Result<DeploymentOutcome> {
    let df = run_step(ctx, "ingest_data", || ingest_data(&ctx.config.data_path))?;
    continuous_deployment_pipeline_with_data(ctx, params, &df)
}

/// [`continuous_deployment_pipeline`] on an already loaded frame
pub fn continuous_deployment_pipeline_with_data(
    ctx: &PipelineContext,
    params: DeploymentParams,
    df: &DataFrame,
) -> Result<DeploymentOutcome> {
    let run_id = ctx.tracker.start_run(CONTINUOUS_DEPLOYMENT_PIPELINE)?;
    run_step(ctx, "log_deployment_params", || {
        ctx.tracker.log_param("min_accuracy", params.min_accuracy.to_string())?;
        ctx.tracker.log_param("workers", params.workers.to_string())?;
        ctx.tracker.log_param("trigger_metric", ctx.config.trigger_metric.as_str())
    })?;

    let training = training_steps(ctx, df, run_id)?;
    let decision = deployment_trigger_step(ctx, &training.report, params.min_accuracy);
    let service = run_step(ctx, "model_deployer_step", || {
        deploy_model(
            ctx,
            &training.model,
            &training.feature_names,
            &training.report,
            decision,
            params.workers,
            params.timeout_secs,
        )
    })?;
    ctx.tracker.end_run_success()?;

    info!(
        decision,
        deployed = service.is_some(),
        "Continuous deployment pipeline finished"
    );
    Ok(DeploymentOutcome {
        training,
        decision,
        service,
    })
}

/// Sample rows of the raw export and clean them the way training does, with
/// the target column removed.
pub fn get_data_for_test(config: &PipelineConfig, df: &DataFrame) -> Result<DataFrame> {
    let sampled = sample_rows(df, config.sample_size, config.sample_seed)?;
    let processed = DataCleaning::new(sampled, DataProcessStrategy::new()).handle_data()?;
    processed
        .drop(&config.target)
        .map_err(|_| PipelineError::FeatureNotFound(config.target.clone()))
}

/// Load the running model and predict on a cleaned sample of the dataset
pub fn inference_pipeline(ctx: &PipelineContext) -> Result<InferenceOutcome> {
    let df = run_step(ctx, "ingest_data", || ingest_data(&ctx.config.data_path))?;
    inference_pipeline_with_data(ctx, &df)
}

/// [`inference_pipeline`] on an already loaded frame
pub fn inference_pipeline_with_data(ctx: &PipelineContext, df: &DataFrame) -> Result<InferenceOutcome> {
    ctx.tracker.start_run(INFERENCE_PIPELINE)?;

    let batch = run_step(ctx, "dynamic_importer", || get_data_for_test(&ctx.config, df))?;
    let (service, deployed) = run_step(ctx, "prediction_service_loader", || load_running_model(ctx))?;
    let predictions = run_step(ctx, "predictor", || {
        let x = columns_to_array2(&batch, &deployed.metadata.feature_names)?;
        let predictions = deployed.model.predict(&x)?;
        ctx.tracker.log_metric("n_predictions", predictions.len() as f64, None)?;
        Ok(predictions)
    })?;
    ctx.tracker.end_run_success()?;

    info!(
        n_predictions = predictions.len(),
        version = %service.version,
        "Inference pipeline finished"
    );
    Ok(InferenceOutcome { service, predictions })
}

fn load_running_model(ctx: &PipelineContext) -> Result<(DeploymentService, VersionedModel<LinearRegression>)> {
    let target = ctx.config.deployment_target();
    let deployer = ModelDeployer::open(&ctx.config.registry_dir)?;

    let service = deployer.active_service(&target).cloned().ok_or_else(|| {
        PipelineError::RegistryError(format!(
            "No running prediction service deployed by the {} step in the {} pipeline for the '{}' model",
            target.pipeline_step_name, target.pipeline_name, target.model_name
        ))
    })?;
    let model = deployer.load_model(&service)?;
    Ok((service, model))
}
