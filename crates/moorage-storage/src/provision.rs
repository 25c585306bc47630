use crate::strategy::PvcStrategy;
use moorage_infra::{ConfigurationProvisioner, InfraError, ResourceGraph, RuntimeIdentity};
use moorage_model::InternalEnvironment;
use std::sync::Arc;
use tracing::debug;

/// Bridges the selected claim strategy into the provisioner pipeline.
///
/// Does nothing when persistent storage is disabled in settings.
pub struct PvcProvisioner {
    enabled: bool,
    strategy: Arc<dyn PvcStrategy>,
}

impl PvcProvisioner {
    pub fn new(enabled: bool, strategy: Arc<dyn PvcStrategy>) -> Self {
        Self { enabled, strategy }
    }
}

impl ConfigurationProvisioner for PvcProvisioner {
    fn provision(
        &self,
        env: &InternalEnvironment,
        graph: &mut ResourceGraph,
        identity: &RuntimeIdentity,
    ) -> Result<(), InfraError> {
        if !self.enabled {
            debug!("persistent storage disabled, skipping claim provisioning");
            return Ok(());
        }
        self.strategy
            .prepare(env, graph, &identity.workspace_id)
            .map_err(|e| InfraError::Infrastructure(e.to_string()))
    }
}
