//! Customer satisfaction pipeline
//!
//! Predicts the review score of an order from the Olist order export:
//! - Data cleaning and a seeded train/test split
//! - Ordinary least squares training
//! - Evaluation with MSE, R2 and RMSE
//! - A threshold-gated deployment into a local model registry
//!
//! # Modules
//!
//! - [`ingest`] - Load the raw export (CSV, JSON or JSON lines)
//! - [`cleaning`] - Cleaning and splitting strategies
//! - [`training`] - Model abstraction and linear regression
//! - [`evaluation`] - Scoring strategies
//! - [`deployment`] - Deployment trigger, registry and deployer
//! - [`tracking`] - Experiment tracking
//! - [`pipeline`] - Training, continuous deployment and inference pipelines
//! - [`config`] - Pipeline configuration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

pub mod config;

// Pipeline steps
pub mod ingest;
pub mod cleaning;
pub mod training;
pub mod evaluation;
pub mod deployment;

// Infrastructure
pub mod tracking;
pub mod pipeline;
pub mod utils;

// Services
pub mod cli;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PipelineError, Result};

    // Configuration
    pub use crate::config::PipelineConfig;

    // Cleaning
    pub use crate::cleaning::{DataCleaning, DataProcessStrategy, DataSplitStrategy, DataStrategy, TrainTestSplit};

    // Training
    pub use crate::training::{Hyperparameters, LinearRegression, LinearRegressionModel, Model, Regressor};

    // Evaluation
    pub use crate::evaluation::{evaluate_model, Evaluation, EvaluationReport, MetricKind, Mse, Rmse, R2};

    // Deployment
    pub use crate::deployment::{deployment_trigger, DeploymentTriggerConfig, ModelDeployer, ModelRegistry};

    // Experiment tracking
    pub use crate::tracking::{ExperimentTracker, ExperimentConfig, Experiment, Run, RunStatus};

    // Pipelines
    pub use crate::pipeline::{
        continuous_deployment_pipeline, inference_pipeline, train_pipeline, DeploymentParams, PipelineContext,
    };
}
