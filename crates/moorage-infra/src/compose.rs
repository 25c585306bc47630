use crate::factory::{depends_on_edges, resolve_environment, EnvironmentFactory};
use crate::normalizer::normalize_machine;
use crate::resources::{Container, Pod, ResourceGraph};
use crate::validate::validate_start_order;
use crate::InfraError;
use moorage_model::{
    Environment, InstallerRegistry, InternalEnvironment, RecipeRetriever, Warning,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Warning code: compose recipe declares a service with no matching machine.
pub const WARNING_UNUSED_SERVICE: u32 = 4201;

/// Factory for multi-machine environments defined by a compose recipe.
///
/// The recipe content is a services document: per-service image and
/// `depends_on` edges, which merge with machine `dependsOn` attributes into
/// the start order. Every declared machine must have a matching service.
pub struct ComposeEnvironmentFactory {
    retriever: Arc<dyn RecipeRetriever>,
    registry: Arc<dyn InstallerRegistry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComposeDocument {
    #[serde(default)]
    services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ComposeService {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    depends_on: Vec<String>,
}

impl ComposeEnvironmentFactory {
    pub fn new(retriever: Arc<dyn RecipeRetriever>, registry: Arc<dyn InstallerRegistry>) -> Self {
        Self {
            retriever,
            registry,
        }
    }
}

impl EnvironmentFactory for ComposeEnvironmentFactory {
    fn kind(&self) -> &str {
        "compose"
    }

    fn create(
        &self,
        environment: &Environment,
    ) -> Result<(InternalEnvironment, ResourceGraph), InfraError> {
        let mut internal =
            resolve_environment(environment, self.retriever.as_ref(), self.registry.as_ref())?;

        let document: ComposeDocument = toml::from_str(&internal.recipe().content)
            .map_err(|e| InfraError::Validation(format!("failed to parse compose recipe: {e}")))?;

        let mut graph = ResourceGraph::new();
        let mut edges = depends_on_edges(internal.machines());
        for (name, machine) in internal.machines() {
            let service = document.services.get(name).ok_or_else(|| {
                InfraError::Validation(format!(
                    "machine '{name}' has no matching service in the compose recipe"
                ))
            })?;

            let mut container = Container::new(name.clone());
            container.image = service.image.clone();
            normalize_machine(name, &mut container, machine)?;
            graph.add_pod(Pod::single_container(name.clone(), container));

            if !service.depends_on.is_empty() {
                let machine_edges = edges.entry(name.clone()).or_default();
                for dep in &service.depends_on {
                    if !machine_edges.contains(dep) {
                        machine_edges.push(dep.clone());
                    }
                }
            }
        }

        graph.start_order = edges;
        validate_start_order(
            &internal.machines().keys().cloned().collect(),
            &graph.start_order,
        )?;

        for service_name in document.services.keys() {
            if !internal.machines().contains_key(service_name) {
                warn!("compose service '{service_name}' has no declared machine and is ignored");
                internal.add_warning(Warning {
                    code: WARNING_UNUSED_SERVICE,
                    message: format!(
                        "compose service '{service_name}' has no declared machine and is ignored"
                    ),
                });
            }
        }

        Ok((internal, graph))
    }
}
