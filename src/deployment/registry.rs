//! Model versioning and registry
//!
//! Deployed models are stored as JSON files under the registry root, one
//! directory per model name, with an `index.json` describing every version.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

const INDEX_FILE: &str = "index.json";

/// Semantic version
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ModelVersion {
    /// Create new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Bump patch version
    pub fn bump_patch(&self) -> Self {
        Self::new(self.major, self.minor, self.patch + 1)
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Default for ModelVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

/// What is known about a registered model besides its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Training algorithm
    pub model_type: String,
    /// Feature columns in the order the model expects them
    pub feature_names: Vec<String>,
    /// Target column
    pub target: String,
    /// Evaluation metrics on the holdout set
    pub metrics: BTreeMap<String, f64>,
    /// Tracking run that produced the model
    pub run_id: Option<String>,
}

/// A model together with its version and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedModel<M> {
    pub version: ModelVersion,
    pub metadata: ModelMetadata,
    pub model: M,
}

impl<M> VersionedModel<M> {
    pub fn new(model: M, metadata: ModelMetadata) -> Self {
        Self {
            version: ModelVersion::default(),
            metadata,
            model,
        }
    }

    pub fn with_version(mut self, version: ModelVersion) -> Self {
        self.version = version;
        self
    }
}

/// Model registry entry (metadata only, without model data)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub name: String,
    pub version: ModelVersion,
    pub metadata: ModelMetadata,
    /// File path relative to registry root
    pub path: String,
    pub registered_at: DateTime<Utc>,
}

/// Registry index
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistryIndex {
    /// All model versions by name
    pub models: HashMap<String, Vec<RegistryEntry>>,
}

/// Model registry for managing versioned models
#[derive(Debug)]
pub struct ModelRegistry {
    root: PathBuf,
    index: RegistryIndex,
}

impl ModelRegistry {
    /// Create or open registry at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| {
            PipelineError::RegistryError(format!("Failed to create registry at {}: {}", root.display(), e))
        })?;

        let index_path = root.join(INDEX_FILE);
        let index = if index_path.exists() {
            let file = File::open(&index_path)?;
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                PipelineError::SerializationError(format!("Failed to read index: {}", e))
            })?
        } else {
            RegistryIndex::default()
        };

        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn save_index(&self) -> Result<()> {
        let file = File::create(self.root.join(INDEX_FILE))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.index).map_err(|e| {
            PipelineError::SerializationError(format!("Failed to write index: {}", e))
        })
    }

    /// Register a model version. Fails if that version already exists.
    pub fn register<M: Serialize>(&mut self, name: &str, versioned: &VersionedModel<M>) -> Result<String> {
        if self.list_versions(name).contains(&versioned.version) {
            return Err(PipelineError::RegistryError(format!(
                "Model {} version {} is already registered",
                name, versioned.version
            )));
        }

        let model_dir = self.root.join(name);
        fs::create_dir_all(&model_dir)?;

        let file_name = format!("v{}.json", versioned.version);
        let relative_path = format!("{}/{}", name, file_name);

        let file = File::create(model_dir.join(&file_name))?;
        serde_json::to_writer(BufWriter::new(file), versioned).map_err(|e| {
            PipelineError::SerializationError(format!("Failed to serialize model: {}", e))
        })?;

        let entry = RegistryEntry {
            name: name.to_string(),
            version: versioned.version.clone(),
            metadata: versioned.metadata.clone(),
            path: relative_path.clone(),
            registered_at: Utc::now(),
        };
        self.index.models.entry(name.to_string()).or_default().push(entry);
        self.save_index()?;

        Ok(relative_path)
    }

    /// Highest registered version of a model
    pub fn latest_version(&self, name: &str) -> Option<ModelVersion> {
        self.index
            .models
            .get(name)
            .and_then(|entries| entries.iter().map(|e| e.version.clone()).max())
    }

    /// Version that the next registration of `name` should use
    pub fn next_version(&self, name: &str) -> ModelVersion {
        self.latest_version(name)
            .map(|v| v.bump_patch())
            .unwrap_or_default()
    }

    /// Get specific version of a model
    pub fn get_version<M: DeserializeOwned>(&self, name: &str, version: &ModelVersion) -> Result<VersionedModel<M>> {
        let entry = self
            .index
            .models
            .get(name)
            .and_then(|entries| entries.iter().find(|e| &e.version == version))
            .ok_or_else(|| {
                PipelineError::RegistryError(format!("Version not found: {} {}", name, version))
            })?;

        let file = File::open(self.root.join(&entry.path))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            PipelineError::SerializationError(format!("Failed to deserialize model: {}", e))
        })
    }

    /// List versions of a model, oldest first
    pub fn list_versions(&self, name: &str) -> Vec<ModelVersion> {
        let mut versions: Vec<ModelVersion> = self
            .index
            .models
            .get(name)
            .map(|entries| entries.iter().map(|e| e.version.clone()).collect())
            .unwrap_or_default();
        versions.sort();
        versions
    }

    /// Remove a model version and its file
    pub fn delete(&mut self, name: &str, version: &ModelVersion) -> Result<()> {
        let entries = self
            .index
            .models
            .get_mut(name)
            .ok_or_else(|| PipelineError::RegistryError(format!("Model not found: {}", name)))?;

        let idx = entries
            .iter()
            .position(|e| &e.version == version)
            .ok_or_else(|| PipelineError::RegistryError(format!("Version not found: {}", version)))?;
        let entry = entries.remove(idx);
        if entries.is_empty() {
            self.index.models.remove(name);
        }

        let path = self.root.join(&entry.path);
        if path.exists() {
            fs::remove_file(&path)?;
        }

        self.save_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn metadata() -> ModelMetadata {
        ModelMetadata {
            model_type: "linear_regression".to_string(),
            feature_names: vec!["price".to_string(), "freight_value".to_string()],
            target: "review_score".to_string(),
            metrics: BTreeMap::from([("mse".to_string(), 1.5)]),
            run_id: None,
        }
    }

    #[test]
    fn test_version_display_and_bump() {
        let v = ModelVersion::new(1, 2, 3);
        assert_eq!(v.to_string(), "1.2.3");
        assert_eq!(v.bump_patch(), ModelVersion::new(1, 2, 4));
        assert_eq!(ModelVersion::default().to_string(), "1.0.0");
    }

    #[test]
    fn test_register_and_load() {
        let dir = TempDir::new().unwrap();
        let mut registry = ModelRegistry::open(dir.path()).unwrap();

        let versioned = VersionedModel::new(vec![1.0, 2.0], metadata());
        let path = registry.register("model", &versioned).unwrap();
        assert_eq!(path, "model/v1.0.0.json");

        let loaded: VersionedModel<Vec<f64>> = registry.get_version("model", &ModelVersion::default()).unwrap();
        assert_eq!(loaded.model, vec![1.0, 2.0]);
        assert_eq!(loaded.metadata, metadata());
    }

    #[test]
    fn test_next_version_and_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut registry = ModelRegistry::open(dir.path()).unwrap();
            assert_eq!(registry.next_version("model"), ModelVersion::new(1, 0, 0));

            registry.register("model", &VersionedModel::new(1u8, metadata())).unwrap();
            let next = registry.next_version("model");
            assert_eq!(next, ModelVersion::new(1, 0, 1));
            registry
                .register("model", &VersionedModel::new(2u8, metadata()).with_version(next))
                .unwrap();
        }

        let registry = ModelRegistry::open(dir.path()).unwrap();
        assert_eq!(
            registry.list_versions("model"),
            vec![ModelVersion::new(1, 0, 0), ModelVersion::new(1, 0, 1)]
        );
        let latest_version = registry.latest_version("model").unwrap();
        let latest: VersionedModel<u8> = registry.get_version("model", &latest_version).unwrap();
        assert_eq!(latest.model, 2);
    }

    #[test]
    fn test_duplicate_version_rejected() {
        let dir = TempDir::new().unwrap();
        let mut registry = ModelRegistry::open(dir.path()).unwrap();
        registry.register("model", &VersionedModel::new(1u8, metadata())).unwrap();
        assert!(registry.register("model", &VersionedModel::new(1u8, metadata())).is_err());
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let mut registry = ModelRegistry::open(dir.path()).unwrap();
        registry.register("model", &VersionedModel::new(1u8, metadata())).unwrap();

        registry.delete("model", &ModelVersion::default()).unwrap();
        assert!(registry.list_versions("model").is_empty());
        assert!(!dir.path().join("model/v1.0.0.json").exists());
        assert!(registry.get_version::<u8>("model", &ModelVersion::default()).is_err());
        assert_eq!(registry.next_version("model"), ModelVersion::default());
    }
}
