//! Utility functions and types

pub mod data_loader;
mod frame;

pub use data_loader::{DataLoader, DataSaver};
pub use frame::{column_to_array1, columns_to_array2, sample_rows};
