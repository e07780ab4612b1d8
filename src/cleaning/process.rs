//! Raw order export → numeric feature frame

use super::{
    is_numeric_dtype, DataStrategy, DIMENSION_COLUMNS, IDENTIFIER_COLUMNS, NO_REVIEW_SENTINEL,
    REVIEW_TEXT_COLUMN, TIMESTAMP_COLUMNS,
};
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use tracing::{debug, warn};

/// Cleans the raw order export.
///
/// Drops the timestamp columns, fills missing product dimensions with their
/// median, fills empty review messages with [`NO_REVIEW_SENTINEL`], keeps the
/// numeric columns and finally drops the identifier columns. Every column the
/// strategy touches must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataProcessStrategy;

impl DataProcessStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl DataStrategy for DataProcessStrategy {
    type Output = DataFrame;

    fn handle_data(&self, data: &DataFrame) -> Result<DataFrame> {
        let mut df = drop_columns(data, &TIMESTAMP_COLUMNS)?;

        for name in DIMENSION_COLUMNS {
            fill_with_median(&mut df, name)?;
        }
        fill_with_constant(&mut df, REVIEW_TEXT_COLUMN, NO_REVIEW_SENTINEL)?;

        let numeric = select_numeric(&df)?;
        let cleaned = drop_columns(&numeric, &IDENTIFIER_COLUMNS)?;

        debug!(
            rows = cleaned.height(),
            cols_in = data.width(),
            cols_out = cleaned.width(),
            "Processed raw data"
        );
        Ok(cleaned)
    }
}

fn drop_columns(df: &DataFrame, names: &[&str]) -> Result<DataFrame> {
    let mut out = df.clone();
    for name in names {
        out = out
            .drop(name)
            .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?;
    }
    Ok(out)
}

/// Fill nulls of `name` with the median of its non-null values.
/// Returns the median used, or `None` if the column has no values at all.
fn fill_with_median(df: &mut DataFrame, name: &str) -> Result<Option<f64>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?
        .cast(&DataType::Float64)?;
    let ca = column.f64()?;

    let Some(median) = ca.median() else {
        warn!(column = name, "Column has no values, nulls left in place");
        df.with_column(ca.clone().with_name(name.into()).into_series())?;
        return Ok(None);
    };

    let filled: Float64Chunked = ca
        .into_iter()
        .map(|opt| Some(opt.unwrap_or(median)))
        .collect();
    df.with_column(filled.with_name(name.into()).into_series())?;

    debug!(column = name, median, "Filled nulls with median");
    Ok(Some(median))
}

fn fill_with_constant(df: &mut DataFrame, name: &str, value: &str) -> Result<()> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?
        .cast(&DataType::String)?;
    let ca = column.str()?;

    let filled: StringChunked = ca
        .into_iter()
        .map(|opt| Some(opt.unwrap_or(value)))
        .collect();
    df.with_column(filled.with_name(name.into()).into_series())?;
    Ok(())
}

fn select_numeric(df: &DataFrame) -> Result<DataFrame> {
    let numeric: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|c| is_numeric_dtype(c.dtype()))
        .map(|c| c.name().clone())
        .collect();
    Ok(df.select(numeric)?)
}
