//! Seeded train/test holdout

use super::{DataStrategy, TARGET_COLUMN};
use crate::error::{PipelineError, Result};
use crate::utils::{column_to_array1, columns_to_array2};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Features and targets for both sides of a holdout split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    /// Feature column names, in matrix column order
    pub feature_names: Vec<String>,
}

impl TrainTestSplit {
    pub fn n_train(&self) -> usize {
        self.y_train.len()
    }

    pub fn n_test(&self) -> usize {
        self.y_test.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

/// Splits a cleaned frame into features/target and a random holdout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSplitStrategy {
    /// Target column
    pub target: String,
    /// Fraction of rows held out for testing
    pub test_size: f64,
    /// Seed for the row permutation
    pub random_state: u64,
}

impl Default for DataSplitStrategy {
    fn default() -> Self {
        Self {
            target: TARGET_COLUMN.to_string(),
            test_size: 0.2,
            random_state: 42,
        }
    }
}

impl DataSplitStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

impl DataStrategy for DataSplitStrategy {
    type Output = TrainTestSplit;

    fn handle_data(&self, data: &DataFrame) -> Result<TrainTestSplit> {
        if data.column(&self.target).is_err() {
            return Err(PipelineError::FeatureNotFound(self.target.clone()));
        }

        let feature_names: Vec<String> = data
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != self.target)
            .map(|name| name.to_string())
            .collect();

        let x = columns_to_array2(data, &feature_names)?;
        let y = column_to_array1(data, &self.target)?;

        let (train_idx, test_idx) = holdout_indices(data.height(), self.test_size, self.random_state)?;

        debug!(
            n_train = train_idx.len(),
            n_test = test_idx.len(),
            n_features = feature_names.len(),
            seed = self.random_state,
            "Split data"
        );

        Ok(TrainTestSplit {
            x_train: x.select(Axis(0), &train_idx),
            x_test: x.select(Axis(0), &test_idx),
            y_train: y.select(Axis(0), &train_idx),
            y_test: y.select(Axis(0), &test_idx),
            feature_names,
        })
    }
}

/// Row indices for a shuffled holdout of `n_samples` rows.
///
/// The test side holds `ceil(test_size * n_samples)` rows, the train side the
/// rest. Returns `(train, test)`.
pub fn holdout_indices(n_samples: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PipelineError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in the open interval (0, 1)".to_string(),
        });
    }

    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_train == 0 || n_test == 0 {
        return Err(PipelineError::ValidationError(format!(
            "With n_samples={}, test_size={} the resulting train set would be empty",
            n_samples, test_size
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}
