//! Experiment Tracker Implementation
//!
//! Track experiments, runs, parameters and metrics.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use super::storage::{LocalStorage, StorageBackend};
use crate::error::{PipelineError, Result};

/// Configuration for experiment tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Output directory for experiments
    pub output_dir: PathBuf,
    /// Experiment name
    pub experiment_name: String,
    /// Keep every logged value, not only the latest per metric
    pub enable_metrics_history: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./mlruns"),
            experiment_name: "customer_satisfaction".to_string(),
            enable_metrics_history: true,
        }
    }
}

/// A single metric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: f64,
    /// Step/epoch number
    pub step: u64,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    pub fn new(name: impl Into<String>, value: f64, step: u64) -> Self {
        Self {
            name: name.into(),
            value,
            step,
            timestamp: Utc::now(),
        }
    }
}

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// A run within an experiment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub run_name: String,
    pub start_time: DateTime<Utc>,
    /// End time (None if still running)
    pub end_time: Option<DateTime<Utc>>,
    pub params: BTreeMap<String, String>,
    /// Latest value per metric
    pub metrics: BTreeMap<String, f64>,
    pub metrics_history: Vec<Metric>,
    pub tags: BTreeMap<String, String>,
    /// Artifact paths
    pub artifacts: Vec<String>,
    pub status: RunStatus,
}

impl Run {
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().simple().to_string(),
            run_name: run_name.into(),
            start_time: Utc::now(),
            end_time: None,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            metrics_history: Vec::new(),
            tags: BTreeMap::new(),
            artifacts: Vec::new(),
            status: RunStatus::Running,
        }
    }

    /// Run duration in seconds
    pub fn duration_secs(&self) -> f64 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

/// An experiment containing multiple runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub runs: Vec<Run>,
    pub tags: BTreeMap<String, String>,
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            experiment_id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            created_at: Utc::now(),
            runs: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Best finished run by a metric
    pub fn best_run(&self, metric_name: &str, maximize: bool) -> Option<&Run> {
        self.runs
            .iter()
            .filter(|r| r.status == RunStatus::Finished)
            .filter_map(|r| r.metrics.get(metric_name).map(|v| (r, *v)))
            .max_by(|(_, a), (_, b)| {
                let ord = a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal);
                if maximize {
                    ord
                } else {
                    ord.reverse()
                }
            })
            .map(|(r, _)| r)
    }
}

/// Experiment tracker
///
/// Holds one active experiment and at most one active run. Logging calls
/// fail with [`PipelineError::TrackingError`] when no run is active.
pub struct ExperimentTracker {
    config: ExperimentConfig,
    storage: Box<dyn StorageBackend + Send + Sync>,

    current_experiment: RwLock<Option<String>>,
    current_run: RwLock<Option<Run>>,

    experiments: RwLock<HashMap<String, Experiment>>,
}

impl std::fmt::Debug for ExperimentTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperimentTracker")
            .field("config", &self.config)
            .field("current_experiment", &*self.current_experiment.read())
            .field("experiments", &self.experiments.read().len())
            .finish()
    }
}

impl ExperimentTracker {
    /// Create a tracker backed by local JSON storage, loading any
    /// experiments already stored there.
    pub fn new(config: ExperimentConfig) -> Result<Self> {
        let storage = LocalStorage::new(config.output_dir.clone())?;
        Self::with_storage(config, Box::new(storage))
    }

    /// Create a tracker on a custom storage backend
    pub fn with_storage(
        config: ExperimentConfig,
        storage: Box<dyn StorageBackend + Send + Sync>,
    ) -> Result<Self> {
        let tracker = Self {
            config,
            storage,
            current_experiment: RwLock::new(None),
            current_run: RwLock::new(None),
            experiments: RwLock::new(HashMap::new()),
        };
        tracker.load()?;
        Ok(tracker)
    }

    /// Tracker writing under `output_dir` with default settings
    pub fn with_dir(output_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::new(ExperimentConfig {
            output_dir: output_dir.into(),
            ..Default::default()
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Create an experiment, or reuse the stored one with the same name.
    /// It becomes the active experiment.
    pub fn create_experiment(&self, name: impl Into<String>) -> String {
        let name = name.into();
        let mut experiments = self.experiments.write();

        let experiment_id = match experiments.values().find(|e| e.name == name) {
            Some(existing) => existing.experiment_id.clone(),
            None => {
                let experiment = Experiment::new(&name);
                let id = experiment.experiment_id.clone();
                experiments.insert(id.clone(), experiment);
                id
            }
        };

        *self.current_experiment.write() = Some(experiment_id.clone());
        experiment_id
    }

    /// Start a new run in the active experiment (the configured experiment
    /// is created if none is active).
    pub fn start_run(&self, run_name: impl Into<String>) -> Result<String> {
        let mut current = self.current_run.write();
        if let Some(run) = current.as_ref() {
            return Err(PipelineError::TrackingError(format!(
                "Run {} is still active",
                run.run_id
            )));
        }

        if self.current_experiment.read().is_none() {
            self.create_experiment(self.config.experiment_name.clone());
        }

        let run = Run::new(run_name);
        let run_id = run.run_id.clone();
        debug!(run_id = %run_id, run_name = %run.run_name, "Run started");
        *current = Some(run);
        Ok(run_id)
    }

    fn with_active_run<T>(&self, f: impl FnOnce(&mut Run) -> T) -> Result<T> {
        let mut current = self.current_run.write();
        let run = current
            .as_mut()
            .ok_or_else(|| PipelineError::TrackingError("No active run".to_string()))?;
        Ok(f(run))
    }

    /// Log a parameter
    pub fn log_param(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        self.with_active_run(|r| {
            r.params.insert(key, value);
        })
    }

    /// Log multiple parameters
    pub fn log_params<I, K, V>(&self, params: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.with_active_run(|r| {
            r.params
                .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        })
    }

    /// Log a metric
    pub fn log_metric(&self, name: impl Into<String>, value: f64, step: Option<u64>) -> Result<()> {
        let name = name.into();
        let keep_history = self.config.enable_metrics_history;
        self.with_active_run(|r| {
            if keep_history {
                r.metrics_history
                    .push(Metric::new(&name, value, step.unwrap_or(0)));
            }
            r.metrics.insert(name, value);
        })
    }

    /// Log multiple metrics
    pub fn log_metrics<'a>(&self, metrics: impl IntoIterator<Item = (&'a str, f64)>, step: Option<u64>) -> Result<()> {
        for (name, value) in metrics {
            self.log_metric(name, value, step)?;
        }
        Ok(())
    }

    /// Log a tag
    pub fn log_tag(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        self.with_active_run(|r| {
            r.tags.insert(key, value);
        })
    }

    /// Log an artifact path
    pub fn log_artifact(&self, path: impl Into<String>) -> Result<()> {
        let path = path.into();
        self.with_active_run(|r| r.artifacts.push(path))
    }

    /// End the active run, attach it to the active experiment and persist.
    pub fn end_run(&self, status: RunStatus) -> Result<Run> {
        let mut run = self
            .current_run
            .write()
            .take()
            .ok_or_else(|| PipelineError::TrackingError("No active run".to_string()))?;
        run.end_time = Some(Utc::now());
        run.status = status;

        let experiment_id = self.current_experiment.read().clone().ok_or_else(|| {
            PipelineError::TrackingError("No active experiment".to_string())
        })?;
        {
            let mut experiments = self.experiments.write();
            let experiment = experiments.get_mut(&experiment_id).ok_or_else(|| {
                PipelineError::TrackingError(format!("Experiment not found: {}", experiment_id))
            })?;
            experiment.runs.push(run.clone());
        }

        debug!(run_id = %run.run_id, status = ?status, "Run ended");
        self.save()?;
        Ok(run)
    }

    /// End run as finished
    pub fn end_run_success(&self) -> Result<Run> {
        self.end_run(RunStatus::Finished)
    }

    /// End run as failed
    pub fn end_run_failed(&self) -> Result<Run> {
        self.end_run(RunStatus::Failed)
    }

    pub fn has_active_run(&self) -> bool {
        self.current_run.read().is_some()
    }

    /// Snapshot of the active run
    pub fn current_run(&self) -> Option<Run> {
        self.current_run.read().clone()
    }

    /// Snapshot of the active experiment
    pub fn current_experiment(&self) -> Option<Experiment> {
        let id = self.current_experiment.read().clone()?;
        self.get_experiment(&id)
    }

    /// Get an experiment by ID
    pub fn get_experiment(&self, experiment_id: &str) -> Option<Experiment> {
        self.experiments.read().get(experiment_id).cloned()
    }

    /// List all experiments, oldest first
    pub fn list_experiments(&self) -> Vec<Experiment> {
        let mut experiments: Vec<Experiment> = self.experiments.read().values().cloned().collect();
        experiments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        experiments
    }

    /// Save all experiments to storage
    pub fn save(&self) -> Result<()> {
        self.storage.save_experiments(&self.list_experiments())
    }

    /// Merge experiments from storage into memory
    pub fn load(&self) -> Result<()> {
        let loaded = self.storage.load_experiments()?;
        let mut experiments = self.experiments.write();
        for exp in loaded {
            experiments.insert(exp.experiment_id.clone(), exp);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tracker_basic() {
        let dir = TempDir::new().unwrap();
        let tracker = ExperimentTracker::with_dir(dir.path()).unwrap();

        let exp_id = tracker.create_experiment("test_experiment");
        assert!(!exp_id.is_empty());

        let run_id = tracker.start_run("run_1").unwrap();
        assert!(!run_id.is_empty());

        tracker.log_param("fit_intercept", "true").unwrap();
        tracker.log_metric("mse", 0.5, Some(1)).unwrap();
        tracker.log_tag("stage", "train").unwrap();

        let run = tracker.end_run_success().unwrap();
        assert_eq!(run.run_id, run_id);

        let exp = tracker.current_experiment().unwrap();
        assert_eq!(exp.runs.len(), 1);
        assert_eq!(exp.runs[0].status, RunStatus::Finished);
        assert_eq!(exp.runs[0].params.get("fit_intercept").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_logging_without_run_fails() {
        let dir = TempDir::new().unwrap();
        let tracker = ExperimentTracker::with_dir(dir.path()).unwrap();

        assert!(matches!(
            tracker.log_metric("mse", 1.0, None),
            Err(PipelineError::TrackingError(_))
        ));
        assert!(tracker.end_run(RunStatus::Finished).is_err());
    }

    #[test]
    fn test_only_one_active_run() {
        let dir = TempDir::new().unwrap();
        let tracker = ExperimentTracker::with_dir(dir.path()).unwrap();

        tracker.start_run("first").unwrap();
        assert!(tracker.start_run("second").is_err());
        tracker.end_run_failed().unwrap();
        assert!(tracker.start_run("second").is_ok());
    }

    #[test]
    fn test_metrics_history() {
        let dir = TempDir::new().unwrap();
        let tracker = ExperimentTracker::with_dir(dir.path()).unwrap();
        tracker.start_run("run").unwrap();

        tracker.log_metric("loss", 1.0, Some(0)).unwrap();
        tracker.log_metric("loss", 0.5, Some(1)).unwrap();
        tracker.log_metric("loss", 0.1, Some(2)).unwrap();

        let run = tracker.current_run().unwrap();
        assert_eq!(run.metrics_history.len(), 3);
        assert_eq!(run.metrics.get("loss"), Some(&0.1));
    }

    #[test]
    fn test_runs_survive_reload() {
        let dir = TempDir::new().unwrap();
        {
            let tracker = ExperimentTracker::with_dir(dir.path()).unwrap();
            tracker.create_experiment("persisted");
            tracker.start_run("run").unwrap();
            tracker.log_metric("r2", 0.75, None).unwrap();
            tracker.end_run_success().unwrap();
        }

        let tracker = ExperimentTracker::with_dir(dir.path()).unwrap();
        let id = tracker.create_experiment("persisted");
        let exp = tracker.get_experiment(&id).unwrap();
        assert_eq!(exp.runs.len(), 1);
        assert_eq!(exp.runs[0].metrics.get("r2"), Some(&0.75));
    }

    #[test]
    fn test_best_run() {
        let mut exp = Experiment::new("test");

        let mut run1 = Run::new("run1");
        run1.metrics.insert("mse".to_string(), 0.8);
        run1.status = RunStatus::Finished;

        let mut run2 = Run::new("run2");
        run2.metrics.insert("mse".to_string(), 0.2);
        run2.status = RunStatus::Finished;

        let mut run3 = Run::new("run3");
        run3.metrics.insert("mse".to_string(), 0.1);
        run3.status = RunStatus::Failed;

        exp.runs = vec![run1, run2, run3];

        let best = exp.best_run("mse", false).unwrap();
        assert_eq!(best.run_name, "run2");
        let worst = exp.best_run("mse", true).unwrap();
        assert_eq!(worst.run_name, "run1");
    }

    #[test]
    fn test_run_duration() {
        let mut run = Run::new("timed");
        run.end_time = Some(run.start_time + chrono::Duration::milliseconds(1500));
        assert_eq!(run.duration_secs(), 1.5);

        let open = Run::new("open");
        assert!(open.duration_secs() >= 0.0);
    }
}
