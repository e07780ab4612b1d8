//! DataFrame ↔ ndarray conversion helpers

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Read one column as `f64` values, rejecting nulls.
fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?
        .cast(&DataType::Float64)?;
    let ca = column.f64()?;

    if ca.null_count() > 0 {
        return Err(PipelineError::DataError(format!(
            "Column '{}' contains {} missing values",
            name,
            ca.null_count()
        )));
    }

    Ok(ca.into_no_null_iter().collect())
}

/// Extract named columns into a row-major `Array2<f64>`.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|name| column_values(df, name))
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}

/// Extract a single column as `Array1<f64>`.
pub fn column_to_array1(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    Ok(Array1::from(column_values(df, name)?))
}

/// Draw `n` rows without replacement using a seeded permutation.
/// Frames with at most `n` rows are returned whole.
pub fn sample_rows(df: &DataFrame, n: usize, seed: u64) -> Result<DataFrame> {
    if df.height() <= n {
        return Ok(df.clone());
    }

    let mut indices: Vec<IdxSize> = (0..df.height() as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices.truncate(n);

    let idx = IdxCa::from_vec("idx".into(), indices);
    Ok(df.take(&idx)?)
}
