//! Model evaluation
//!
//! Scoring strategies ([`Mse`], [`R2`], [`Rmse`]) behind the [`Evaluation`]
//! trait, and the [`evaluate_model`] step that applies all three to a
//! held-out test set.

mod metrics;

pub use metrics::{Evaluation, Mse, Rmse, R2};

use crate::error::Result;
use crate::training::Regressor;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Selects one of the evaluation metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Mse,
    R2,
    Rmse,
}

impl MetricKind {
    /// Whether lower values mean a better model
    pub fn lower_is_better(&self) -> bool {
        matches!(self, MetricKind::Mse | MetricKind::Rmse)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Mse => "mse",
            MetricKind::R2 => "r2",
            MetricKind::Rmse => "rmse",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores of one model on one test set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub mse: f64,
    pub r2: f64,
    pub rmse: f64,
}

impl EvaluationReport {
    /// Value of the selected metric
    pub fn metric(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Mse => self.mse,
            MetricKind::R2 => self.r2,
            MetricKind::Rmse => self.rmse,
        }
    }

    /// `(name, value)` pairs in evaluation order
    pub fn as_pairs(&self) -> [(&'static str, f64); 3] {
        [("mse", self.mse), ("r2", self.r2), ("rmse", self.rmse)]
    }
}

/// Predict on the test set and score the predictions with MSE, R2 and RMSE.
pub fn evaluate_model(
    model: &dyn Regressor,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<EvaluationReport> {
    let predictions = model.predict(x_test)?;

    let mse = Mse.calculate_score(y_test, &predictions)?;
    let r2 = R2.calculate_score(y_test, &predictions)?;
    let rmse = Rmse.calculate_score(y_test, &predictions)?;

    Ok(EvaluationReport { mse, r2, rmse })
}
