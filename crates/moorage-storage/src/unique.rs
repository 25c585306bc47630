use crate::client::ClusterClient;
use crate::jobpod::join_path;
use crate::settings::StorageSettings;
use crate::strategy::PvcStrategy;
use crate::StorageError;
use moorage_infra::{new_pvc, new_volume, new_volume_mount, ResourceGraph};
use moorage_model::{InternalEnvironment, SERVER_WS_AGENT_HTTP};
use std::sync::Arc;
use tracing::{debug, info};

pub const UNIQUE_WORKSPACE_STRATEGY: &str = "unique-workspace";

/// One claim per workspace, named `{baseName}-{workspaceId}`.
///
/// No helper job pods: a fresh claim needs no mkdir, and cleanup is a direct
/// delete of the workspace's own claim.
pub struct UniqueWorkspacePvcStrategy {
    settings: StorageSettings,
    client: Arc<dyn ClusterClient>,
}

impl UniqueWorkspacePvcStrategy {
    pub fn new(settings: StorageSettings, client: Arc<dyn ClusterClient>) -> Self {
        Self { settings, client }
    }

    fn claim_name(&self, workspace_id: &str) -> String {
        format!("{}-{}", self.settings.claim_name, workspace_id)
    }
}

impl PvcStrategy for UniqueWorkspacePvcStrategy {
    fn prepare(
        &self,
        env: &InternalEnvironment,
        graph: &mut ResourceGraph,
        workspace_id: &str,
    ) -> Result<(), StorageError> {
        let claim_name = self.claim_name(workspace_id);
        if graph.claims.contains_key(&claim_name) {
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

        let mount_path = self.settings.mount_path.clone();
        let sub_path = join_path(workspace_id, &mount_path);
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

    /// One direct, namespace-scoped delete of the workspace's claim.
    fn cleanup(&self, workspace_id: &str) -> Result<(), StorageError> {
        let Some(namespace) = self.settings.namespace.as_deref() else {
            debug!("no namespace configured, skipping claim cleanup");
            return Ok(());
        };
        let claim_name = self.claim_name(workspace_id);
        let existed = self.client.delete_claim(namespace, &claim_name)?;
        if existed {
            info!("deleted claim '{claim_name}' of workspace '{workspace_id}'");
        } else {
            debug!("claim '{claim_name}' of workspace '{workspace_id}' was already gone");
        }
        Ok(())
    }
}
