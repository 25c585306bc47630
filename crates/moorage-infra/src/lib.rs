//! Infrastructure-native environment construction for Moorage.
//!
//! This crate turns a declarative [`moorage_model::Environment`] into an
//! [`moorage_model::InternalEnvironment`] plus a native [`ResourceGraph`]
//! (pods, containers, claims): pluggable `EnvironmentFactory` trait with
//! compose, dockerfile, image, and cluster implementations selected through a
//! string-keyed registry, machine normalization, structural start-order
//! validation, and post-build configuration provisioners.

pub mod cluster;
pub mod compose;
pub mod dockerfile;
pub mod factory;
pub mod image;
pub mod normalizer;
pub mod provision;
pub mod resources;
pub mod validate;

pub use factory::{select_factory, EnvironmentFactory};
pub use normalizer::normalize_machine;
pub use provision::{ConfigurationProvisioner, EnvVarsConverter, RuntimeIdentity};
pub use resources::{
    new_pvc, new_volume, new_volume_mount, Container, EnvVar, PersistentVolumeClaim, Pod, PodSpec,
    ResourceGraph, Volume, VolumeMount, RESTART_POLICY_NEVER,
};
pub use validate::validate_start_order;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("environment validation failed: {0}")]
    Validation(String),
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
    #[error("unknown environment kind: {0}")]
    UnknownKind(String),
}
