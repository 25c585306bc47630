use crate::client::ClusterClient;
use crate::common::{CommonPvcStrategy, COMMON_STRATEGY};
use crate::settings::StorageSettings;
use crate::unique::{UniqueWorkspacePvcStrategy, UNIQUE_WORKSPACE_STRATEGY};
use crate::StorageError;
use moorage_infra::ResourceGraph;
use moorage_model::InternalEnvironment;
use std::sync::Arc;
use std::time::Duration;

/// Basic set of operations for workspace persistent-claim strategies.
///
/// A strategy decides claim identity and mount topology and owns the backing
/// storage lifecycle across workspace start and delete.
pub trait PvcStrategy: Send + Sync {
    /// Prepare the claim and mount for a workspace start.
    ///
    /// Mutates the graph in place; the pipeline is strictly sequential per
    /// start attempt. Repeated calls for a workspace whose claim is already
    /// present must be safe no-ops.
    fn prepare(
        &self,
        env: &InternalEnvironment,
        graph: &mut ResourceGraph,
        workspace_id: &str,
    ) -> Result<(), StorageError>;

    /// Clean up the workspace's backed-up data in a strategy-specific way.
    fn cleanup(&self, workspace_id: &str) -> Result<(), StorageError>;

    /// Release background resources; default is a no-op.
    fn shutdown(&self, _grace: Duration) {}
}

pub fn select_strategy(
    settings: &StorageSettings,
    client: Arc<dyn ClusterClient>,
) -> Result<Box<dyn PvcStrategy>, StorageError> {
    match settings.strategy.as_str() {
        COMMON_STRATEGY => Ok(Box::new(CommonPvcStrategy::new(settings.clone(), client))),
        UNIQUE_WORKSPACE_STRATEGY => Ok(Box::new(UniqueWorkspacePvcStrategy::new(
            settings.clone(),
            client,
        ))),
        other => Err(StorageError::UnknownStrategy(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockClusterClient;

    #[test]
    fn selects_known_strategies() {
        for name in [COMMON_STRATEGY, UNIQUE_WORKSPACE_STRATEGY] {
            let settings = StorageSettings {
                strategy: name.to_owned(),
                ..StorageSettings::default()
            };
            assert!(select_strategy(&settings, Arc::new(MockClusterClient::new())).is_ok());
        }
    }

    #[test]
    fn unknown_strategy_fails() {
        let settings = StorageSettings {
            strategy: "per-user".to_owned(),
            ..StorageSettings::default()
        };
        let result = select_strategy(&settings, Arc::new(MockClusterClient::new()));
        assert!(matches!(result, Err(StorageError::UnknownStrategy(s)) if s == "per-user"));
    }
}
