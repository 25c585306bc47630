use crate::factory::{depends_on_edges, resolve_environment, EnvironmentFactory};
use crate::normalizer::normalize_machine;
use crate::resources::{Container, Pod, ResourceGraph};
use crate::validate::validate_start_order;
use crate::InfraError;
use moorage_model::{Environment, InstallerRegistry, InternalEnvironment, RecipeRetriever};
use std::sync::Arc;

/// Factory for environments defined by a single image reference.
///
/// Only one implicit machine is allowed. A legacy `location` on the recipe is
/// treated as equivalent to `content` and rewritten transparently before
/// resolution, so the resolved recipe never carries both.
pub struct ImageEnvironmentFactory {
    retriever: Arc<dyn RecipeRetriever>,
    registry: Arc<dyn InstallerRegistry>,
}

impl ImageEnvironmentFactory {
    pub fn new(retriever: Arc<dyn RecipeRetriever>, registry: Arc<dyn InstallerRegistry>) -> Self {
        Self {
            retriever,
            registry,
        }
    }
}

impl EnvironmentFactory for ImageEnvironmentFactory {
    fn kind(&self) -> &str {
        "image"
    }

    fn create(
        &self,
        environment: &Environment,
    ) -> Result<(InternalEnvironment, ResourceGraph), InfraError> {
        if environment.machines.len() != 1 {
            return Err(InfraError::Validation(format!(
                "image environment must declare exactly one machine, got {}",
                environment.machines.len()
            )));
        }

        let mut environment = environment.clone();
        if let Some(location) = environment.recipe.location.take() {
            environment.recipe.content = Some(location);
        }

        let internal =
            resolve_environment(&environment, self.retriever.as_ref(), self.registry.as_ref())?;

        let mut graph = ResourceGraph::new();
        let (name, machine) = internal.machines().iter().next().expect("one machine");
        let mut container = Container::new(name.clone());
        container.image = Some(internal.recipe().content.clone());
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

#[cfg(test)]
mod tests {
    use super::*;
    use moorage_model::{parse_environment_str, InlineRecipeRetriever, StaticInstallerRegistry};

    fn factory() -> ImageEnvironmentFactory {
        ImageEnvironmentFactory::new(
            Arc::new(InlineRecipeRetriever),
            Arc::new(StaticInstallerRegistry::default()),
        )
    }

    #[test]
    fn legacy_location_rewritten_to_content() {
        let env = parse_environment_str(
            r#"
[recipe]
kind = "image"
location = "docker.io/foo:bar"

[machines.main]
"#,
        )
        .unwrap();

        let (internal, graph) = factory().create(&env).unwrap();

        assert_eq!(internal.recipe().content, "docker.io/foo:bar");
        assert_eq!(
            graph.container("main").unwrap().image.as_deref(),
            Some("docker.io/foo:bar")
        );
    }

    #[test]
    fn builds_one_container_per_machine() {
        let env = parse_environment_str(
            r#"
[recipe]
kind = "image"
content = "alpine:3.19"

[machines.main.servers.web]
port = "8080"
"#,
        )
        .unwrap();

        let (internal, graph) = factory().create(&env).unwrap();

        assert_eq!(internal.machines().len(), 1);
        assert_eq!(graph.pods.len(), 1);
        assert!(graph
            .container("main")
            .unwrap()
            .exposed_ports
            .contains("8080/tcp"));
    }

    #[test]
    fn rejects_multiple_machines() {
        let env = parse_environment_str(
            r#"
[recipe]
kind = "image"
content = "alpine:3.19"

[machines.a]
[machines.b]
"#,
        )
        .unwrap();

        assert!(matches!(
            factory().create(&env),
            Err(InfraError::Validation(_))
        ));
    }
}
