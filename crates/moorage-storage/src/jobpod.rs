use crate::client::{ClusterClient, PodPhase};
use crate::settings::StorageSettings;
use crate::StorageError;
use moorage_infra::{
    new_volume, new_volume_mount, Container, Pod, PodSpec, RESTART_POLICY_NEVER,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const IMAGE_PULL_POLICY: &str = "IfNotPresent";

/// Filesystem operation a job pod executes against the mounted volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCommand {
    Make,
    Remove,
}

impl JobCommand {
    fn base(self) -> [&'static str; 2] {
        match self {
            Self::Make => ["mkdir", "-p"],
            Self::Remove => ["rm", "-rf"],
        }
    }
}

/// Builds, submits, polls, and removes ephemeral helper pods that run
/// filesystem commands against a mounted claim.
///
/// Completion is observed by polling on a bounded attempt/interval budget;
/// there is no event subscription and no cancellation beyond the budget and
/// the shared shutdown flag.
pub struct JobPodRunner {
    settings: StorageSettings,
    client: Arc<dyn ClusterClient>,
    cancel: Arc<AtomicBool>,
}

impl JobPodRunner {
    pub fn new(settings: StorageSettings, client: Arc<dyn ClusterClient>) -> Self {
        Self::with_cancel_flag(settings, client, Arc::new(AtomicBool::new(false)))
    }

    /// Runner whose in-flight polls abort when `cancel` is set, used by the
    /// cleanup pool's forced shutdown.
    pub fn with_cancel_flag(
        settings: StorageSettings,
        client: Arc<dyn ClusterClient>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self {
            settings,
            client,
            cancel,
        }
    }

    /// Run one job pod to completion and report whether it succeeded.
    ///
    /// No-op when `paths` is empty or no namespace is configured. Create
    /// errors propagate; pod deletion after a terminal phase is best-effort.
    /// On budget exhaustion the pod is left in place for diagnostics and a
    /// timeout error is returned.
    pub fn perform(
        &self,
        job_name: &str,
        workspace_id: &str,
        claim_name: &str,
        command: JobCommand,
        paths: &[String],
    ) -> Result<(), StorageError> {
        if paths.is_empty() {
            return Ok(());
        }
        let Some(namespace) = self.settings.namespace.clone() else {
            debug!("no namespace configured, skipping job pod '{job_name}'");
            return Ok(());
        };

        let full_command = build_command(command, &self.settings.mount_path, paths);
        let pod = self.build_pod(job_name, claim_name, full_command.clone());

        debug!(
            "submitting job pod '{job_name}' for workspace '{workspace_id}': {:?}",
            full_command
        );
        self.client.create_pod(&namespace, &pod)?;

        for _ in 0..self.settings.poll_attempts {
            if self.cancel.load(Ordering::Relaxed) {
                return Err(StorageError::JobCancelled(job_name.to_owned()));
            }
            if let Some(status) = self.client.pod_status(&namespace, job_name)? {
                match status.phase {
                    PodPhase::Succeeded => {
                        self.delete_best_effort(&namespace, job_name);
                        return Ok(());
                    }
                    PodPhase::Failed => {
                        warn!("job pod command {:?} failed", full_command);
                        self.delete_best_effort(&namespace, job_name);
                        return Err(StorageError::JobFailed(job_name.to_owned()));
                    }
                    // Not terminal yet, keep waiting.
                    _ => {}
                }
            }
            thread::sleep(Duration::from_millis(self.settings.poll_interval_ms));
        }

        warn!("job pod '{job_name}' exhausted its poll budget, leaving the pod for diagnostics");
        Err(StorageError::JobTimeout(job_name.to_owned()))
    }

    fn build_pod(&self, job_name: &str, claim_name: &str, command: Vec<String>) -> Pod {
        let container = Container {
            name: job_name.to_owned(),
            image: Some(self.settings.job_image.clone()),
            image_pull_policy: Some(IMAGE_PULL_POLICY.to_owned()),
            command,
            memory_limit: Some(self.settings.job_memory_limit.clone()),
            privileged: false,
            // The mount covers the volume root, no sub-path, so the job can
            // reach every workspace's subtree.
            volume_mounts: vec![new_volume_mount(
                claim_name,
                self.settings.mount_path.clone(),
                None,
            )],
            ..Container::default()
        };
        Pod {
            name: job_name.to_owned(),
            spec: PodSpec {
                containers: vec![container],
                volumes: vec![new_volume(claim_name, claim_name)],
                restart_policy: Some(RESTART_POLICY_NEVER.to_owned()),
            },
        }
    }

    fn delete_best_effort(&self, namespace: &str, job_name: &str) {
        if let Err(e) = self.client.delete_pod(namespace, job_name) {
            warn!("failed to delete job pod '{job_name}': {e}");
        }
    }
}

/// Prefix each path with the mount path and attach to the base command.
fn build_command(command: JobCommand, mount_path: &str, paths: &[String]) -> Vec<String> {
    let mut full: Vec<String> = command.base().iter().map(|s| (*s).to_owned()).collect();
    full.extend(paths.iter().map(|p| join_path(mount_path, p)));
    full
}

/// Join two path segments without doubling or dropping the separator.
pub(crate) fn join_path(base: &str, tail: &str) -> String {
    if tail.starts_with('/') {
        format!("{base}{tail}")
    } else {
        format!("{base}/{tail}")
    }
}
