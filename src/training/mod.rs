//! Model training
//!
//! A [`Model`] is a training strategy; training produces a fitted
//! [`Regressor`]. The only algorithm is ordinary least squares
//! ([`LinearRegressionModel`]).

mod models;
pub mod linear_models;

pub use linear_models::{LinearRegression, LinearRegressionModel, LinearRegressionParams};
pub use models::{Hyperparameters, Model, Regressor};
