//! Data loading utilities

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Loads the raw order export from disk
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows used for CSV schema inference
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)?;

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| PipelineError::DataError(e.to_string()))
    }

    /// Load a JSON file holding an array of records
    pub fn load_json(&self, path: &Path) -> Result<DataFrame> {
        self.read_json(path, JsonFormat::Json)
    }

    /// Load a line-delimited JSON file, one record per line
    pub fn load_jsonl(&self, path: &Path) -> Result<DataFrame> {
        self.read_json(path, JsonFormat::JsonLines)
    }

    fn read_json(&self, path: &Path, format: JsonFormat) -> Result<DataFrame> {
        let file = File::open(path)?;

        JsonReader::new(file)
            .with_json_format(format)
            .finish()
            .map_err(|e| PipelineError::DataError(e.to_string()))
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: &Path) -> Result<DataFrame> {
        let start = Instant::now();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let df = match ext.as_str() {
            "csv" => self.load_csv(path)?,
            "json" => self.load_json(path)?,
            "jsonl" => self.load_jsonl(path)?,
            _ => {
                return Err(PipelineError::DataError(format!(
                    "Unsupported file format: '{}' ({})",
                    ext,
                    path.display()
                )))
            }
        };

        info!(
            path = %path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded data"
        );
        Ok(df)
    }
}

/// Save DataFrame to various formats
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV
    pub fn save_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;

        CsvWriter::new(&mut file)
            .finish(df)
            .map_err(|e| PipelineError::DataError(e.to_string()))
    }
}
