//! Data ingestion

use polars::prelude::*;
use std::path::Path;

use crate::error::Result;
use crate::utils::DataLoader;

/// Load the order export from `path` (CSV, JSON or JSON lines, chosen by extension).
pub fn ingest_data(path: impl AsRef<Path>) -> Result<DataFrame> {
    DataLoader::new().load_auto(path.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::io::Write;

    #[test]
    fn test_ingest_csv() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "price,review_score").unwrap();
        writeln!(file, "10.5,4").unwrap();
        writeln!(file, "3.0,5").unwrap();

        let df = ingest_data(file.path()).unwrap();
        assert_eq!(df.shape(), (2, 2));
    }

    #[test]
    fn test_ingest_json_records() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"[{{"price":1.5,"review_score":5}},{{"price":2.5,"review_score":4}}]"#).unwrap();
        file.flush().unwrap();

        let df = ingest_data(file.path()).unwrap();
        assert_eq!(df.shape(), (2, 2));
    }

    #[test]
    fn test_ingest_json_lines() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, r#"{{"price":1.5,"review_score":5}}"#).unwrap();
        writeln!(file, r#"{{"price":2.5,"review_score":4}}"#).unwrap();
        file.flush().unwrap();

        let df = ingest_data(file.path()).unwrap();
        assert_eq!(df.shape(), (2, 2));
    }

    #[test]
    fn test_ingest_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        assert!(matches!(ingest_data(file.path()), Err(PipelineError::DataError(_))));
    }

    #[test]
    fn test_ingest_missing_file() {
        assert!(ingest_data("does/not/exist.csv").is_err());
    }
}
