//! Ordinary least squares linear regression

use super::models::{Hyperparameters, Model, Regressor};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Cholesky factorisation `A = L Lᵀ` followed by forward/back substitution.
/// Returns `None` if `a` is not positive definite.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Matrix inversion by Gauss-Jordan elimination with partial pivoting
fn matrix_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    // [M | I]
    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut max_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[max_row, col]].abs() {
                max_row = row;
            }
        }

        if max_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [max_row, j]);
            }
        }

        if aug[[col, col]].abs() < 1e-10 {
            return None;
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    Some(aug.slice(ndarray::s![.., n..]).to_owned())
}

/// Solve the normal equations `(XᵀX) w = Xᵀy`.
///
/// Rank-deficient systems (constant or collinear features) are retried with a
/// ridge term scaled to the diagonal, which drives the coefficients of
/// redundant directions towards zero.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    if let Some(w) = cholesky_solve(&xtx, &xty) {
        return Some(w);
    }

    let n = xtx.nrows();
    let mean_diag = xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    let ridge = (1e-10 * mean_diag).max(1e-12);
    debug!(ridge, "Normal equations not positive definite, retrying with ridge");

    let mut xtx_reg = xtx.clone();
    for i in 0..n {
        xtx_reg[[i, i]] += ridge;
    }
    if let Some(w) = cholesky_solve(&xtx_reg, &xty) {
        return Some(w);
    }

    matrix_inverse(&xtx).map(|inv| inv.dot(&xty))
}

/// Hyperparameters accepted by [`LinearRegressionModel`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinearRegressionParams {
    /// Whether to fit an intercept term
    pub fit_intercept: bool,
}

impl Default for LinearRegressionParams {
    fn default() -> Self {
        Self { fit_intercept: true }
    }
}

impl LinearRegressionParams {
    /// Deserialize from pass-through hyperparameters
    pub fn from_hyperparameters(params: &Hyperparameters) -> Result<Self> {
        serde_json::from_value(serde_json::Value::Object(params.clone())).map_err(|e| {
            PipelineError::InvalidParameter {
                name: "hyperparameters".to_string(),
                value: serde_json::Value::Object(params.clone()).to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// Fitted linear regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
    /// Whether to fit intercept
    pub fit_intercept: bool,
    /// Whether model is fitted
    pub is_fitted: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new, unfitted linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
            fit_intercept: true,
            is_fitted: false,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PipelineError::InvalidInput(
                "Cannot fit linear regression on 0 samples".to_string(),
            ));
        }

        let (coefficients, intercept) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .ok_or_else(|| PipelineError::ComputationError("Empty feature matrix".to_string()))?;
            let y_mean = y.mean().unwrap_or(0.0);

            let x_centered = x - &x_mean.view().insert_axis(Axis(0));
            let y_centered = y - y_mean;

            let w = solve_least_squares(&x_centered, &y_centered).ok_or_else(|| {
                PipelineError::ComputationError("Matrix is singular, cannot solve least squares".to_string())
            })?;
            let b = y_mean - w.dot(&x_mean);
            (w, b)
        } else {
            let w = solve_least_squares(x, y).ok_or_else(|| {
                PipelineError::ComputationError("Matrix is singular, cannot solve least squares".to_string())
            })?;
            (w, 0.0)
        };

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        self.is_fitted = true;

        Ok(self)
    }

    /// Number of features seen during fit
    pub fn n_features(&self) -> Option<usize> {
        self.coefficients.as_ref().map(|c| c.len())
    }
}

impl Regressor for LinearRegression {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = match (&self.coefficients, self.is_fitted) {
            (Some(c), true) => c,
            _ => return Err(PipelineError::ModelNotFitted),
        };

        if x.ncols() != coefficients.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }
}

/// Model strategy producing an OLS [`LinearRegression`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRegressionModel;

impl Model for LinearRegressionModel {
    type Fitted = LinearRegression;

    fn name(&self) -> &'static str {
        "linear_regression"
    }

    fn train(&self, x: &Array2<f64>, y: &Array1<f64>, params: &Hyperparameters) -> Result<LinearRegression> {
        let params = LinearRegressionParams::from_hyperparameters(params)?;

        let mut model = LinearRegression::new().with_fit_intercept(params.fit_intercept);
        model.fit(x, y)?;

        info!(
            n_samples = x.nrows(),
            n_features = x.ncols(),
            fit_intercept = params.fit_intercept,
            "Model trained successfully"
        );
        Ok(model)
    }
}
