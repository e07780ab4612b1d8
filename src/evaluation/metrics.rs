//! Regression scoring strategies

use crate::error::{PipelineError, Result};
use ndarray::Array1;
use tracing::info;

/// A scoring strategy over true and predicted targets
pub trait Evaluation {
    /// Metric name used in logs and tracking
    fn name(&self) -> &'static str;

    /// Score `y_pred` against `y_true`
    fn calculate_score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64>;
}

fn check_inputs(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("y_pred length = {}", y_true.len()),
            actual: format!("y_pred length = {}", y_pred.len()),
        });
    }
    if y_true.is_empty() {
        return Err(PipelineError::InvalidInput(
            "Cannot score an empty set of predictions".to_string(),
        ));
    }
    Ok(())
}

fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_inputs(y_true, y_pred)?;
    let n = y_true.len() as f64;
    Ok((y_true - y_pred).mapv(|e| e * e).sum() / n)
}

/// Mean squared error
#[derive(Debug, Clone, Copy, Default)]
pub struct Mse;

impl Evaluation for Mse {
    fn name(&self) -> &'static str {
        "mse"
    }

    fn calculate_score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        let mse = mean_squared_error(y_true, y_pred)?;
        info!(mse, "Mean Squared Error");
        Ok(mse)
    }
}

/// Coefficient of determination.
///
/// When the true values have zero variance the ratio is undefined; the score
/// is then `1.0` for exact predictions and `0.0` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct R2;

impl Evaluation for R2 {
    fn name(&self) -> &'static str {
        "r2"
    }

    fn calculate_score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        check_inputs(y_true, y_pred)?;

        let y_mean = y_true.mean().unwrap_or(0.0);
        let ss_res = (y_true - y_pred).mapv(|e| e * e).sum();
        let ss_tot = y_true.mapv(|v| (v - y_mean) * (v - y_mean)).sum();

        let r2 = if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };

        info!(r2, "R2 Score");
        Ok(r2)
    }
}

/// Root mean squared error
#[derive(Debug, Clone, Copy, Default)]
pub struct Rmse;

impl Evaluation for Rmse {
    fn name(&self) -> &'static str {
        "rmse"
    }

    fn calculate_score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        let rmse = mean_squared_error(y_true, y_pred)?.sqrt();
        info!(rmse, "Root Mean Squared Error");
        Ok(rmse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mse() {
        let y_true = array![3.0, -0.5, 2.0, 7.0];
        let y_pred = array![2.5, 0.0, 2.0, 8.0];
        assert!((Mse.calculate_score(&y_true, &y_pred).unwrap() - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_r2() {
        let y_true = array![3.0, -0.5, 2.0, 7.0];
        let y_pred = array![2.5, 0.0, 2.0, 8.0];
        let r2 = R2.calculate_score(&y_true, &y_pred).unwrap();
        assert!((r2 - 0.948_608_137_044_968).abs() < 1e-9);
    }

    #[test]
    fn test_r2_can_be_negative() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![3.0, 2.0, 1.0];
        assert!((R2.calculate_score(&y_true, &y_pred).unwrap() + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rmse_is_sqrt_of_mse() {
        let cases = [
            (array![1.0, 2.0, 3.0], array![1.5, 2.5, 2.0]),
            (array![10.0, -4.0], array![0.0, 0.0]),
            (array![0.1, 0.2, 0.3, 0.4, 0.5], array![0.5, 0.4, 0.3, 0.2, 0.1]),
        ];
        for (y_true, y_pred) in cases {
            let mse = Mse.calculate_score(&y_true, &y_pred).unwrap();
            let rmse = Rmse.calculate_score(&y_true, &y_pred).unwrap();
            assert!((rmse - mse.sqrt()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_perfect_predictions() {
        let y = array![1.0, 4.0, 2.5, 5.0];
        assert_eq!(Mse.calculate_score(&y, &y).unwrap(), 0.0);
        assert_eq!(Rmse.calculate_score(&y, &y).unwrap(), 0.0);
        assert_eq!(R2.calculate_score(&y, &y).unwrap(), 1.0);
    }

    #[test]
    fn test_r2_zero_variance() {
        let y_true = array![5.0, 5.0, 5.0];
        assert_eq!(R2.calculate_score(&y_true, &array![5.0, 5.0, 5.0]).unwrap(), 1.0);
        assert_eq!(R2.calculate_score(&y_true, &array![4.0, 5.0, 6.0]).unwrap(), 0.0);
        // single sample has zero variance by construction
        assert_eq!(R2.calculate_score(&array![3.0], &array![2.0]).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_input_errors() {
        let empty = Array1::<f64>::zeros(0);
        assert!(matches!(Mse.calculate_score(&empty, &empty), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(R2.calculate_score(&empty, &empty), Err(PipelineError::InvalidInput(_))));
        assert!(matches!(Rmse.calculate_score(&empty, &empty), Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_length_mismatch_errors() {
        let err = Mse.calculate_score(&array![1.0, 2.0], &array![1.0]).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeError { .. }));
    }
}
