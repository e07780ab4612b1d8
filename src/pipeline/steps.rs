//! Individual pipeline steps

use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::PipelineContext;
use crate::cleaning::{DataCleaning, DataProcessStrategy, DataSplitStrategy, TrainTestSplit};
use crate::deployment::{deployment_trigger, DeploymentService, ModelDeployer, ModelMetadata};
use crate::error::Result;
use crate::evaluation::{evaluate_model, EvaluationReport};
use crate::training::{LinearRegression, LinearRegressionModel, Model};

/// Process the raw frame, then split it into a train/test holdout.
pub fn clean_data(df: &DataFrame, split: &DataSplitStrategy) -> Result<TrainTestSplit> {
    let processed = DataCleaning::new(df.clone(), DataProcessStrategy::new()).handle_data()?;
    DataCleaning::new(processed, split.clone()).handle_data()
}

/// Train a linear regression with the configured hyperparameters.
///
/// The model name and hyperparameters are logged to the active run.
pub fn train_model(ctx: &PipelineContext, x_train: &Array2<f64>, y_train: &Array1<f64>) -> Result<LinearRegression> {
    let model = LinearRegressionModel;
    let params = &ctx.config.hyperparameters;

    if ctx.tracker.has_active_run() {
        ctx.tracker.log_param("model", model.name())?;
        ctx.tracker
            .log_params(params.iter().map(|(k, v)| (k.clone(), v.to_string())))?;
        ctx.tracker.log_param("n_train", x_train.nrows().to_string())?;
    }

    model.train(x_train, y_train, params)
}

/// Score the model on the test set and log every metric to the active run.
pub fn evaluate_step(
    ctx: &PipelineContext,
    model: &LinearRegression,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<EvaluationReport> {
    let report = evaluate_model(model, x_test, y_test)?;
    if ctx.tracker.has_active_run() {
        ctx.tracker.log_metrics(report.as_pairs(), None)?;
    }
    Ok(report)
}

/// Decide whether to deploy by gating the configured metric on `min_accuracy`.
pub fn deployment_trigger_step(ctx: &PipelineContext, report: &EvaluationReport, min_accuracy: f64) -> bool {
    let metric = ctx.config.trigger_metric;
    if metric.lower_is_better() {
        warn!(
            metric = %metric,
            "Deployment gate compares an error metric with '>'; worse models are more likely to deploy"
        );
    }

    let value = report.metric(metric);
    let decision = deployment_trigger(value, min_accuracy);
    info!(metric = %metric, value, threshold = min_accuracy, decision, "Deployment decision");
    decision
}

/// Hand the model to the deployer. Only registers it when `decision` is true.
pub fn deploy_model(
    ctx: &PipelineContext,
    model: &LinearRegression,
    feature_names: &[String],
    report: &EvaluationReport,
    decision: bool,
    workers: usize,
    timeout_secs: u64,
) -> Result<Option<DeploymentService>> {
    let config = &ctx.config;
    let run_id = ctx.tracker.current_run().map(|r| r.run_id);

    let metadata = ModelMetadata {
        model_type: LinearRegressionModel.name().to_string(),
        feature_names: feature_names.to_vec(),
        target: config.target.clone(),
        metrics: report
            .as_pairs()
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect::<BTreeMap<_, _>>(),
        run_id,
    };

    let mut deployer = ModelDeployer::open(&config.registry_dir)?;
    let service = deployer.deploy(
        model,
        metadata,
        &config.deployment_target(),
        decision,
        workers,
        timeout_secs,
    )?;

    if ctx.tracker.has_active_run() {
        ctx.tracker.log_tag("deployed", decision.to_string())?;
        if let Some(service) = &service {
            ctx.tracker.log_artifact(service.artifact_path.clone())?;
        }
    }
    Ok(service)
}
