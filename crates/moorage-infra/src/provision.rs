use crate::resources::{EnvVar, ResourceGraph};
use crate::InfraError;
use moorage_model::InternalEnvironment;
use serde::{Deserialize, Serialize};

/// Identity of one runtime of a workspace environment.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RuntimeIdentity {
    pub workspace_id: String,
    pub env_name: String,
    pub owner: String,
}

/// Post-build mutator applied to the native graph after factory construction.
///
/// Provisioners run strictly sequentially on the caller's thread; the graph
/// is single-writer for the whole pipeline.
pub trait ConfigurationProvisioner: Send + Sync {
    fn provision(
        &self,
        env: &InternalEnvironment,
        graph: &mut ResourceGraph,
        identity: &RuntimeIdentity,
    ) -> Result<(), InfraError>;
}

/// Applies declared machine env onto containers with last-writer-per-key
/// semantics: any existing same-key entry is removed before the declared
/// value is appended, independent of declaration order across machines.
#[derive(Debug, Default)]
pub struct EnvVarsConverter;

impl ConfigurationProvisioner for EnvVarsConverter {
    fn provision(
        &self,
        env: &InternalEnvironment,
        graph: &mut ResourceGraph,
        _identity: &RuntimeIdentity,
    ) -> Result<(), InfraError> {
        for pod in graph.pods.values_mut() {
            for container in &mut pod.spec.containers {
                let Some(machine) = env.machines().get(&container.name) else {
                    continue;
                };
                for (key, value) in &machine.env {
                    container.env.retain(|e| &e.name != key);
                    container.env.push(EnvVar {
                        name: key.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
