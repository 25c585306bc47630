use crate::StorageError;
use serde::{Deserialize, Serialize};

/// Storage configuration consumed by this crate's strategies and job pods.
///
/// Values, not CLI flags; hosts deserialize this from their own
/// configuration surface.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StorageSettings {
    /// Base claim name; the unique strategy suffixes the workspace id.
    #[serde(default = "default_claim_name")]
    pub claim_name: String,
    #[serde(default = "default_claim_capacity")]
    pub claim_capacity: String,
    #[serde(default = "default_claim_access_mode")]
    pub claim_access_mode: String,
    /// Where workspace data is mounted inside machine containers.
    #[serde(default = "default_mount_path")]
    pub mount_path: String,
    #[serde(default = "default_job_image")]
    pub job_image: String,
    #[serde(default = "default_job_memory_limit")]
    pub job_memory_limit: String,
    /// Target namespace; job pods and claim deletes are no-ops without one.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Master switch for storage provisioning.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Strategy selector, `common` or `unique-workspace`.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            claim_name: default_claim_name(),
            claim_capacity: default_claim_capacity(),
            claim_access_mode: default_claim_access_mode(),
            mount_path: default_mount_path(),
            job_image: default_job_image(),
            job_memory_limit: default_job_memory_limit(),
            namespace: None,
            enabled: default_enabled(),
            strategy: default_strategy(),
            poll_attempts: default_poll_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl StorageSettings {
    pub fn parse_str(input: &str) -> Result<Self, StorageError> {
        Ok(toml::from_str(input)?)
    }
}

fn default_claim_name() -> String {
    "claim-workspace".to_owned()
}

fn default_claim_capacity() -> String {
    "10Gi".to_owned()
}

fn default_claim_access_mode() -> String {
    "ReadWriteOnce".to_owned()
}

fn default_mount_path() -> String {
    "/projects".to_owned()
}

fn default_job_image() -> String {
    "registry.centos.org/centos/centos:7".to_owned()
}

fn default_job_memory_limit() -> String {
    "250Mi".to_owned()
}

fn default_enabled() -> bool {
    true
}

fn default_strategy() -> String {
    crate::common::COMMON_STRATEGY.to_owned()
}

fn default_poll_attempts() -> u32 {
    150
}

fn default_poll_interval_ms() -> u64 {
    2000
}
