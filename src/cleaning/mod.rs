//! Data cleaning strategies
//!
//! Cleaning is split into interchangeable strategies that share a single
//! entry point, [`DataStrategy::handle_data`]:
//! - [`DataProcessStrategy`] turns the raw order export into a numeric frame
//! - [`DataSplitStrategy`] splits a cleaned frame into a seeded train/test holdout
//!
//! [`DataCleaning`] pairs a frame with the active strategy and delegates to it.

mod process;
mod split;

pub use process::DataProcessStrategy;
pub use split::{holdout_indices, DataSplitStrategy, TrainTestSplit};

use crate::error::Result;
use polars::prelude::*;

/// Timestamp-like columns dropped unconditionally by [`DataProcessStrategy`]
pub const TIMESTAMP_COLUMNS: [&str; 5] = [
    "order_approved_at",
    "order_delivered_carrier_date",
    "order_delivered_customer_date",
    "order_estimated_delivery_date",
    "order_purchase_timestamp",
];

/// Product dimension columns whose nulls are filled with the column median
pub const DIMENSION_COLUMNS: [&str; 4] = [
    "product_weight_g",
    "product_length_cm",
    "product_height_cm",
    "product_width_cm",
];

/// Free-text review column
pub const REVIEW_TEXT_COLUMN: &str = "review_comment_message";

/// Value written into empty review messages
pub const NO_REVIEW_SENTINEL: &str = "No review";

/// Identifier columns dropped after the numeric filter
pub const IDENTIFIER_COLUMNS: [&str; 2] = ["customer_zip_code_prefix", "order_item_id"];

/// Regression target
pub const TARGET_COLUMN: &str = "review_score";

/// A data handling strategy
pub trait DataStrategy {
    /// What the strategy produces from a frame
    type Output;

    /// Apply the strategy to `data`
    fn handle_data(&self, data: &DataFrame) -> Result<Self::Output>;
}

/// Holds a frame and the strategy used to handle it
#[derive(Debug, Clone)]
pub struct DataCleaning<S: DataStrategy> {
    df: DataFrame,
    strategy: S,
}

impl<S: DataStrategy> DataCleaning<S> {
    /// Create a new cleaning context
    pub fn new(df: DataFrame, strategy: S) -> Self {
        Self { df, strategy }
    }

    /// Handle the held frame with the held strategy
    pub fn handle_data(&self) -> Result<S::Output> {
        self.strategy.handle_data(&self.df)
    }
}

/// Check if dtype is numeric
pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}
