//! Model deployer
//!
//! Registers approved models in a [`ModelRegistry`] and keeps a record of the
//! service that serves each one in `services.json` beside the registry index.
//! A service is a persisted description (model version, worker count, start
//! and stop timeout); no network endpoint is started.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use super::registry::{ModelMetadata, ModelRegistry, ModelVersion, VersionedModel};
use crate::error::{PipelineError, Result};

/// Seconds to wait for a service to start or stop
pub const DEFAULT_SERVICE_START_STOP_TIMEOUT: u64 = 60;

const SERVICES_FILE: &str = "services.json";

/// Which pipeline step deployed which model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub pipeline_name: String,
    pub pipeline_step_name: String,
    pub model_name: String,
}

impl Default for DeploymentTarget {
    fn default() -> Self {
        Self {
            pipeline_name: "continuous_deployment_pipeline".to_string(),
            pipeline_step_name: "model_deployer_step".to_string(),
            model_name: "model".to_string(),
        }
    }
}

impl DeploymentTarget {
    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    fn matches(&self, pipeline_name: &str, step_name: &str, model_name: &str) -> bool {
        self.pipeline_name == pipeline_name
            && self.pipeline_step_name == step_name
            && self.model_name == model_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStatus {
    Running,
    Stopped,
}

/// A deployed model version and how it is served
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentService {
    pub uuid: Uuid,
    pub target: DeploymentTarget,
    pub version: ModelVersion,
    pub status: ServiceStatus,
    pub workers: usize,
    pub timeout_secs: u64,
    /// Registry-relative path of the model file
    pub artifact_path: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
}

impl DeploymentService {
    pub fn is_running(&self) -> bool {
        self.status == ServiceStatus::Running
    }

    pub fn is_stopped(&self) -> bool {
        self.status == ServiceStatus::Stopped
    }
}

/// Registers models and tracks their services
#[derive(Debug)]
pub struct ModelDeployer {
    registry: ModelRegistry,
    services: Vec<DeploymentService>,
}

impl ModelDeployer {
    /// Open (or create) a deployer rooted at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let registry = ModelRegistry::open(path)?;

        let services_path = registry.root().join(SERVICES_FILE);
        let services = if services_path.exists() {
            let file = File::open(&services_path)?;
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                PipelineError::SerializationError(format!("Failed to read services: {}", e))
            })?
        } else {
            Vec::new()
        };

        Ok(Self { registry, services })
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn root(&self) -> PathBuf {
        self.registry.root().to_path_buf()
    }

    fn save_services(&self) -> Result<()> {
        let file = File::create(self.registry.root().join(SERVICES_FILE))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.services).map_err(|e| {
            PipelineError::SerializationError(format!("Failed to write services: {}", e))
        })
    }

    /// Deploy `model` when `decision` is true.
    ///
    /// The model is registered under the next patch version of
    /// `target.model_name`, any service running for the same target is
    /// stopped, and a new running service is recorded. When `decision` is
    /// false nothing changes and `Ok(None)` is returned.
    pub fn deploy<M: Serialize>(
        &mut self,
        model: &M,
        metadata: ModelMetadata,
        target: &DeploymentTarget,
        decision: bool,
        workers: usize,
        timeout_secs: u64,
    ) -> Result<Option<DeploymentService>> {
        if workers == 0 {
            return Err(PipelineError::InvalidParameter {
                name: "workers".to_string(),
                value: workers.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if timeout_secs == 0 {
            return Err(PipelineError::InvalidParameter {
                name: "timeout".to_string(),
                value: timeout_secs.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        if !decision {
            info!(model = %target.model_name, "Deployment decision is negative, skipping deployment");
            return Ok(None);
        }

        let version = self.registry.next_version(&target.model_name);
        let versioned = VersionedModel::new(model, metadata).with_version(version.clone());
        let artifact_path = self.registry.register(&target.model_name, &versioned)?;

        let previous = self.services.clone();
        let now = Utc::now();
        for service in self.services.iter_mut().filter(|s| s.target == *target && s.is_running()) {
            service.status = ServiceStatus::Stopped;
            service.stopped_at = Some(now);
        }

        let service = DeploymentService {
            uuid: Uuid::new_v4(),
            target: target.clone(),
            version,
            status: ServiceStatus::Running,
            workers,
            timeout_secs,
            artifact_path,
            started_at: now,
            stopped_at: None,
        };
        self.services.push(service.clone());

        // Keep the registry and the service records in step
        if let Err(e) = self.save_services() {
            self.services = previous;
            if let Err(rollback) = self.registry.delete(&target.model_name, &service.version) {
                warn!(
                    model = %target.model_name,
                    version = %service.version,
                    error = %rollback,
                    "Failed to unregister model after a failed deployment"
                );
            }
            return Err(e);
        }

        info!(
            model = %target.model_name,
            version = %service.version,
            uuid = %service.uuid,
            workers,
            "Model deployed"
        );
        Ok(Some(service))
    }

    /// Services recorded for a pipeline step and model, running ones first,
    /// then most recent first.
    pub fn find_model_server(
        &self,
        pipeline_name: &str,
        pipeline_step_name: &str,
        model_name: &str,
    ) -> Vec<DeploymentService> {
        let mut found: Vec<DeploymentService> = self
            .services
            .iter()
            .filter(|s| s.target.matches(pipeline_name, pipeline_step_name, model_name))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.is_running()
                .cmp(&a.is_running())
                .then_with(|| b.started_at.cmp(&a.started_at))
        });
        found
    }

    /// The running service for `target`, if any
    pub fn active_service(&self, target: &DeploymentTarget) -> Option<&DeploymentService> {
        self.services
            .iter()
            .find(|s| s.target == *target && s.is_running())
    }

    /// Stop a service
    pub fn stop(&mut self, uuid: &Uuid) -> Result<()> {
        let service = self
            .services
            .iter_mut()
            .find(|s| &s.uuid == uuid)
            .ok_or_else(|| PipelineError::RegistryError(format!("Service not found: {}", uuid)))?;

        if service.is_running() {
            service.status = ServiceStatus::Stopped;
            service.stopped_at = Some(Utc::now());
            info!(uuid = %uuid, "Service stopped");
        }
        self.save_services()
    }

    /// Load the model served by `service`
    pub fn load_model<M: DeserializeOwned>(&self, service: &DeploymentService) -> Result<VersionedModel<M>> {
        self.registry
            .get_version(&service.target.model_name, &service.version)
    }
}
