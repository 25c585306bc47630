//! Persistent storage lifecycle for Moorage workspaces.
//!
//! Implements the two persistent-volume-claim strategies (one claim shared by
//! every workspace in a namespace with sub-path isolation, or one claim per
//! workspace), the short-lived job pods that create and remove workspace
//! directories inside a mounted volume, and the background worker pool that
//! runs best-effort cleanup. The cluster itself sits behind the
//! [`ClusterClient`] trait; a mock implementation backs the tests.

pub mod client;
pub mod common;
pub mod jobpod;
pub mod pool;
pub mod provision;
pub mod settings;
pub mod strategy;
pub mod unique;

pub use client::{ClusterClient, MockClusterClient, PodPhase, PodStatus};
pub use common::CommonPvcStrategy;
pub use jobpod::{JobCommand, JobPodRunner};
pub use pool::CleanupPool;
pub use provision::PvcProvisioner;
pub use settings::StorageSettings;
pub use strategy::{select_strategy, PvcStrategy};
pub use unique::UniqueWorkspacePvcStrategy;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
    #[error("cluster client error: {0}")]
    Client(String),
    #[error("job pod '{0}' finished in phase Failed")]
    JobFailed(String),
    #[error("job pod '{0}' did not reach a terminal phase within the poll budget")]
    JobTimeout(String),
    #[error("job pod '{0}' watch cancelled by shutdown")]
    JobCancelled(String),
    #[error("cleanup pool is shut down")]
    PoolShutDown,
    #[error("unknown storage strategy: {0}")]
    UnknownStrategy(String),
    #[error("failed to parse storage settings: {0}")]
    ParseSettings(#[from] toml::de::Error),
}
