//! Experiment Tracking
//!
//! Records parameters and metrics of pipeline runs and persists them as JSON.

mod storage;
mod tracker;

pub use storage::{LocalStorage, StorageBackend};
pub use tracker::{Experiment, ExperimentConfig, ExperimentTracker, Metric, Run, RunStatus};
