use crate::CoreError;
use moorage_infra::{
    select_factory, ConfigurationProvisioner, EnvVarsConverter, ResourceGraph, RuntimeIdentity,
};
use moorage_model::{Environment, InstallerRegistry, InternalEnvironment, RecipeRetriever};
use moorage_storage::{select_strategy, ClusterClient, PvcProvisioner, PvcStrategy, StorageSettings};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of a successful workspace start: the resolved model and the fully
/// provisioned native resource graph, ready to be applied to a cluster.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StartResult {
    pub env: InternalEnvironment,
    pub graph: ResourceGraph,
}

impl StartResult {
    /// JSON rendering of the provisioned result for inspection tooling.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Central orchestration engine for the workspace environment lifecycle.
///
/// Coordinates recipe retrieval, installer resolution, factory construction,
/// and the sequential provisioner pipeline for starts; delegates storage
/// cleanup and shutdown to the configured claim strategy.
pub struct Engine {
    retriever: Arc<dyn RecipeRetriever>,
    registry: Arc<dyn InstallerRegistry>,
    settings: StorageSettings,
    strategy: Arc<dyn PvcStrategy>,
}

impl Engine {
    /// Create an engine; fails when the configured storage strategy is
    /// unknown.
    pub fn new(
        retriever: Arc<dyn RecipeRetriever>,
        registry: Arc<dyn InstallerRegistry>,
        client: Arc<dyn ClusterClient>,
        settings: StorageSettings,
    ) -> Result<Self, CoreError> {
        let strategy: Arc<dyn PvcStrategy> = Arc::from(select_strategy(&settings, client)?);
        Ok(Self {
            retriever,
            registry,
            settings,
            strategy,
        })
    }

    /// Build and provision one runtime of a workspace environment.
    ///
    /// The factory for the recipe's kind resolves and validates the model,
    /// then each provisioner mutates the graph in turn. Any failure aborts
    /// the whole start without a partial result.
    pub fn start(
        &self,
        environment: &Environment,
        identity: &RuntimeIdentity,
    ) -> Result<StartResult, CoreError> {
        info!(
            "starting environment '{}' of workspace '{}'",
            identity.env_name, identity.workspace_id
        );

        let factory = select_factory(
            &environment.recipe.kind,
            Arc::clone(&self.retriever),
            Arc::clone(&self.registry),
        )?;
        let (env, mut graph) = factory.create(environment)?;
        debug!(
            "constructed {} pod(s) and {} machine(s) for '{}'",
            graph.pods.len(),
            env.machines().len(),
            identity.workspace_id
        );

        for provisioner in self.provisioners() {
            provisioner.provision(&env, &mut graph, identity)?;
        }

        Ok(StartResult { env, graph })
    }

    /// Remove the workspace's persisted data in a strategy-specific way.
    pub fn delete(&self, workspace_id: &str) -> Result<(), CoreError> {
        if !self.settings.enabled {
            debug!("persistent storage disabled, nothing to clean up");
            return Ok(());
        }
        info!("cleaning up storage of workspace '{workspace_id}'");
        self.strategy.cleanup(workspace_id)?;
        Ok(())
    }

    /// Drain background storage work for up to `grace`, then force-cancel.
    pub fn shutdown(&self, grace: Duration) {
        self.strategy.shutdown(grace);
    }

    fn provisioners(&self) -> Vec<Box<dyn ConfigurationProvisioner>> {
        vec![
            Box::new(EnvVarsConverter),
            Box::new(PvcProvisioner::new(
                self.settings.enabled,
                Arc::clone(&self.strategy),
            )),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moorage_model::{parse_environment_str, InlineRecipeRetriever, StaticInstallerRegistry};
    use moorage_storage::{MockClusterClient, StorageError};

    fn identity() -> RuntimeIdentity {
        RuntimeIdentity {
            workspace_id: "workspace123".to_owned(),
            env_name: "default".to_owned(),
            owner: "user".to_owned(),
        }
    }

    fn engine(settings: StorageSettings) -> Engine {
        Engine::new(
            Arc::new(InlineRecipeRetriever),
            Arc::new(StaticInstallerRegistry::default()),
            Arc::new(MockClusterClient::new()),
            settings,
        )
        .unwrap()
    }

    #[test]
    fn unknown_storage_strategy_fails_construction() {
        let settings = StorageSettings {
            strategy: "per-user".to_owned(),
            ..StorageSettings::default()
        };
        let result = Engine::new(
            Arc::new(InlineRecipeRetriever),
            Arc::new(StaticInstallerRegistry::default()),
            Arc::new(MockClusterClient::new()),
            settings,
        );
        assert!(matches!(
            result,
            Err(CoreError::Storage(StorageError::UnknownStrategy(_)))
        ));
    }

    #[test]
    fn unknown_recipe_kind_fails_start() {
        let env = parse_environment_str(
            r#"
[recipe]
kind = "vagrant"
content = "box"

[machines.main]
"#,
        )
        .unwrap();

        let result = engine(StorageSettings::default()).start(&env, &identity());
        assert!(matches!(result, Err(CoreError::Infra(_))));
    }

    #[test]
    fn start_applies_declared_env_with_last_writer_per_key() {
        let env = parse_environment_str(
            r#"
[recipe]
kind = "image"
content = "alpine:3.19"

[machines.main]
[machines.main.env]
JAVA_OPTS = "-Xmx512m"

[machines.main.servers."wsagent/http"]
port = "4401"
"#,
        )
        .unwrap();

        let result = engine(StorageSettings::default())
            .start(&env, &identity())
            .unwrap();

        let container = result.graph.container("main").unwrap();
        assert_eq!(container.image.as_deref(), Some("alpine:3.19"));
        assert_eq!(container.env.len(), 1);
        assert_eq!(container.env[0].name, "JAVA_OPTS");
        assert_eq!(result.graph.claims.len(), 1);
    }

    #[test]
    fn start_result_renders_as_json() {
        let env = parse_environment_str(
            r#"
[recipe]
kind = "image"
content = "alpine:3.19"

[machines.main.servers."wsagent/http"]
port = "4401"
"#,
        )
        .unwrap();

        let result = engine(StorageSettings::default())
            .start(&env, &identity())
            .unwrap();

        let json = result.to_json().unwrap();
        assert!(json.contains("alpine:3.19"));
        let back: StartResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn delete_with_storage_disabled_is_a_no_op() {
        let settings = StorageSettings {
            enabled: false,
            ..StorageSettings::default()
        };
        engine(settings).delete("workspace123").unwrap();
    }
}
