use crate::factory::{depends_on_edges, resolve_environment, EnvironmentFactory};
use crate::normalizer::normalize_machine;
use crate::resources::{Container, Pod, ResourceGraph};
use crate::validate::validate_start_order;
use crate::InfraError;
use moorage_model::{Environment, InstallerRegistry, InternalEnvironment, RecipeRetriever};
use std::sync::Arc;

/// Factory for environments defined by a dockerfile recipe.
///
/// Single implicit machine; the recipe content becomes the container's build
/// context and the image is left for the infrastructure to assign after the
/// build.
pub struct DockerfileEnvironmentFactory {
    retriever: Arc<dyn RecipeRetriever>,
    registry: Arc<dyn InstallerRegistry>,
}

impl DockerfileEnvironmentFactory {
    pub fn new(retriever: Arc<dyn RecipeRetriever>, registry: Arc<dyn InstallerRegistry>) -> Self {
        Self {
            retriever,
            registry,
        }
    }
}

impl EnvironmentFactory for DockerfileEnvironmentFactory {
    fn kind(&self) -> &str {
        "dockerfile"
    }

    fn create(
        &self,
        environment: &Environment,
    ) -> Result<(InternalEnvironment, ResourceGraph), InfraError> {
        if environment.machines.len() != 1 {
            return Err(InfraError::Validation(format!(
                "dockerfile environment must declare exactly one machine, got {}",
                environment.machines.len()
            )));
        }

        let internal =
            resolve_environment(environment, self.retriever.as_ref(), self.registry.as_ref())?;

        let mut graph = ResourceGraph::new();
        let (name, machine) = internal.machines().iter().next().expect("one machine");
        let mut container = Container::new(name.clone());
        container.build_context = Some(internal.recipe().content.clone());
        normalize_machine(name, &mut container, machine)?;
        graph.add_pod(Pod::single_container(name.clone(), container));

        graph.start_order = depends_on_edges(internal.machines());
        validate_start_order(
            &internal.machines().keys().cloned().collect(),
            &graph.start_order,
        )?;

        Ok((internal, graph))
    }
}
