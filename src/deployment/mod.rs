//! Deployment
//!
//! The threshold gate deciding whether a model is deployed, and the
//! registry/deployer that persists deployed models.

pub mod trigger;
mod deployer;
mod registry;

pub use deployer::{
    DeploymentService, DeploymentTarget, ModelDeployer, ServiceStatus, DEFAULT_SERVICE_START_STOP_TIMEOUT,
};
pub use registry::{ModelMetadata, ModelRegistry, ModelVersion, RegistryEntry, VersionedModel};
pub use trigger::{deployment_trigger, DeploymentTriggerConfig};
