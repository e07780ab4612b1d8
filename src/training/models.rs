//! Model traits

use crate::error::Result;
use ndarray::{Array1, Array2};

/// Pass-through hyperparameters, interpreted by the concrete model
pub type Hyperparameters = serde_json::Map<String, serde_json::Value>;

/// Anything that can predict a scalar target per feature row
pub trait Regressor {
    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// A training strategy for one regression algorithm
pub trait Model {
    /// The fitted model produced by [`Model::train`]
    type Fitted: Regressor;

    /// Short identifier used in logs and tracking
    fn name(&self) -> &'static str;

    /// Fit a new model on `(x, y)`
    fn train(&self, x: &Array2<f64>, y: &Array1<f64>, params: &Hyperparameters) -> Result<Self::Fitted>;
}
