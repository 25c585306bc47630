//! Core orchestration engine for the Moorage workspace environment lifecycle.
//!
//! This crate ties together the declarative environment model, the
//! infrastructure factories, and the persistent storage strategies into the
//! `Engine`: the central API for starting, deleting, and shutting down
//! workspace environments.

pub mod engine;

pub use engine::{Engine, StartResult};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("model error: {0}")]
    Model(#[from] moorage_model::ModelError),
    #[error("infrastructure error: {0}")]
    Infra(#[from] moorage_infra::InfraError),
    #[error("storage error: {0}")]
    Storage(#[from] moorage_storage::StorageError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
