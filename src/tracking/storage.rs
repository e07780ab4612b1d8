//! Storage Backend for Experiment Tracking
//!
//! Provides storage backends for persisting experiments.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use super::tracker::Experiment;
use crate::error::{PipelineError, Result};

/// Storage backend trait
pub trait StorageBackend {
    /// Save experiments to storage
    fn save_experiments(&self, experiments: &[Experiment]) -> Result<()>;

    /// Load experiments from storage
    fn load_experiments(&self) -> Result<Vec<Experiment>>;
}

/// Local file system storage backend, one `experiments.json` per directory
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend, creating the directory if needed
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir).map_err(|e| {
            PipelineError::TrackingError(format!(
                "Failed to create tracking directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn experiments_file(&self) -> PathBuf {
        self.base_dir.join("experiments.json")
    }
}

impl StorageBackend for LocalStorage {
    fn save_experiments(&self, experiments: &[Experiment]) -> Result<()> {
        let file = File::create(self.experiments_file()).map_err(|e| {
            PipelineError::TrackingError(format!("Failed to create experiments file: {}", e))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), experiments).map_err(|e| {
            PipelineError::SerializationError(format!("Failed to write experiments: {}", e))
        })
    }

    fn load_experiments(&self) -> Result<Vec<Experiment>> {
        let file_path = self.experiments_file();
        if !file_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&file_path).map_err(|e| {
            PipelineError::TrackingError(format!("Failed to open experiments file: {}", e))
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            PipelineError::SerializationError(format!("Failed to read experiments: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_storage_save_load() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("tracking")).unwrap();

        let mut exp = Experiment::new("Test Experiment");
        exp.tags.insert("env".to_string(), "test".to_string());
        storage.save_experiments(&[exp.clone()]).unwrap();
        assert!(storage.experiments_file().exists());

        let loaded = storage.load_experiments().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].experiment_id, exp.experiment_id);
        assert_eq!(loaded[0].tags.get("env").map(String::as_str), Some("test"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf()).unwrap();
        assert!(storage.load_experiments().unwrap().is_empty());
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf()).unwrap();

        let keep = Experiment::new("keep");
        let gone = Experiment::new("gone");
        storage.save_experiments(&[keep.clone(), gone]).unwrap();
        storage.save_experiments(&[keep]).unwrap();

        let loaded = storage.load_experiments().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "keep");
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_path_buf()).unwrap();
        fs::write(storage.experiments_file(), "not json").unwrap();
        assert!(matches!(
            storage.load_experiments(),
            Err(PipelineError::SerializationError(_))
        ));
    }
}
