use crate::client::ClusterClient;
use crate::jobpod::{join_path, JobCommand, JobPodRunner};
use crate::pool::CleanupPool;
use crate::settings::StorageSettings;
use crate::strategy::PvcStrategy;
use crate::StorageError;
use moorage_infra::{new_pvc, new_volume, new_volume_mount, ResourceGraph};
use moorage_model::{InternalEnvironment, SERVER_WS_AGENT_HTTP};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const COMMON_STRATEGY: &str = "common";

const PREPARE_POD_PREFIX: &str = "pod-pvc-prepare-";
const CLEANUP_POD_PREFIX: &str = "pod-pvc-cleanup-";

/// One claim shared by every workspace in a namespace, isolated by sub-path.
///
/// Sub-paths resolve data path collisions: each workspace's data lives under
/// `{workspaceId}{mountPath}` inside the shared volume. The number of
/// workspaces that can store data in one volume is limited only by its
/// capacity.
pub struct CommonPvcStrategy {
    settings: StorageSettings,
    runner: Arc<JobPodRunner>,
    pool: CleanupPool,
}

impl CommonPvcStrategy {
    pub fn new(settings: StorageSettings, client: Arc<dyn ClusterClient>) -> Self {
        let pool = CleanupPool::new();
        let runner = Arc::new(JobPodRunner::with_cancel_flag(
            settings.clone(),
            client,
            pool.cancel_flag(),
        ));
        Self {
            settings,
            runner,
            pool,
        }
    }

    fn workspace_sub_path(&self, workspace_id: &str) -> String {
        join_path(workspace_id, &self.settings.mount_path)
    }
}

impl PvcStrategy for CommonPvcStrategy {
    fn prepare(
        &self,
        env: &InternalEnvironment,
        graph: &mut ResourceGraph,
        workspace_id: &str,
    ) -> Result<(), StorageError> {
        let sub_path = self.workspace_sub_path(workspace_id);

        // Idempotent mkdir, runs on every prepare.
        self.runner.perform(
            &format!("{PREPARE_POD_PREFIX}{workspace_id}"),
            workspace_id,
            &self.settings.claim_name,
            JobCommand::Make,
            &[sub_path.clone()],
        )?;

        if graph.claims.contains_key(&self.settings.claim_name) {
            return Ok(());
        }

        let agent_machine = env
            .machine_with_server(SERVER_WS_AGENT_HTTP)
            .ok_or_else(|| {
                StorageError::Infrastructure(
                    "machine with workspace agent not found".to_owned(),
                )
            })?
            .to_owned();

        let claim_name = self.settings.claim_name.clone();
        let mount_path = self.settings.mount_path.clone();
        let Some(pod) = graph.pod_with_container_mut(&agent_machine) else {
            return Err(StorageError::Infrastructure(format!(
                "no container found for machine '{agent_machine}'"
            )));
        };
        let container = pod
            .spec
            .containers
            .iter_mut()
            .find(|c| c.name == agent_machine)
            .expect("pod lookup guarantees the container");
        container
            .volume_mounts
            .push(new_volume_mount(&claim_name, &mount_path, Some(&sub_path)));
        pod.spec.volumes.push(new_volume(&claim_name, &claim_name));

        graph.claims.insert(
            claim_name.clone(),
            new_pvc(
                claim_name,
                self.settings.claim_access_mode.clone(),
                self.settings.claim_capacity.clone(),
            ),
        );
        Ok(())
    }

    /// Best-effort, asynchronous removal of the workspace's subtree.
    ///
    /// Job failures are logged and swallowed; only submission to the worker
    /// pool can fail.
    fn cleanup(&self, workspace_id: &str) -> Result<(), StorageError> {
        let runner = Arc::clone(&self.runner);
        let claim_name = self.settings.claim_name.clone();
        let workspace_id = workspace_id.to_owned();

        self.pool.submit(move || {
            let result = runner.perform(
                &format!("{CLEANUP_POD_PREFIX}{workspace_id}"),
                &workspace_id,
                &claim_name,
                JobCommand::Remove,
                &[workspace_id.clone()],
            );
            match result {
                Ok(()) => info!("cleaned up storage of workspace '{workspace_id}'"),
                Err(e) => warn!(
                    "cleanup of claim '{claim_name}' for workspace '{workspace_id}' failed: {e}"
                ),
            }
        })
    }

    fn shutdown(&self, grace: Duration) {
        self.pool.shutdown(grace);
    }
}
