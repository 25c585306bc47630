use crate::factory::{depends_on_edges, resolve_environment, EnvironmentFactory};
use crate::normalizer::normalize_machine;
use crate::resources::{Container, Pod, PodSpec, ResourceGraph};
use crate::validate::validate_start_order;
use crate::InfraError;
use moorage_model::{
    Environment, InstallerRegistry, InternalEnvironment, RecipeRetriever, Warning,
};
use std::sync::Arc;
use tracing::warn;

/// Machine attribute naming the container image for cluster environments.
pub const IMAGE_ATTRIBUTE: &str = "image";

/// Warning code: cluster machine declares no image attribute.
pub const WARNING_NO_IMAGE: u32 = 4100;

/// Pod holding all machine containers of a cluster environment.
pub const WORKSPACE_POD: &str = "workspace";

/// Factory for cluster environments: one pod with a container per machine.
pub struct ClusterEnvironmentFactory {
    retriever: Arc<dyn RecipeRetriever>,
    registry: Arc<dyn InstallerRegistry>,
}

impl ClusterEnvironmentFactory {
    pub fn new(retriever: Arc<dyn RecipeRetriever>, registry: Arc<dyn InstallerRegistry>) -> Self {
        Self {
            retriever,
            registry,
        }
    }
}

impl EnvironmentFactory for ClusterEnvironmentFactory {
    fn kind(&self) -> &str {
        "cluster"
    }

    fn create(
        &self,
        environment: &Environment,
    ) -> Result<(InternalEnvironment, ResourceGraph), InfraError> {
        let mut internal =
            resolve_environment(environment, self.retriever.as_ref(), self.registry.as_ref())?;

        let mut spec = PodSpec::default();
        let mut missing_image = Vec::new();
        for (name, machine) in internal.machines() {
            let mut container = Container::new(name.clone());
            match machine.attributes.get(IMAGE_ATTRIBUTE) {
                Some(image) => container.image = Some(image.clone()),
                // The infrastructure may default the image; warn, don't fail.
                None => missing_image.push(name.clone()),
            }
            normalize_machine(name, &mut container, machine)?;
            spec.containers.push(container);
        }

        let mut graph = ResourceGraph::new();
        graph.add_pod(Pod {
            name: WORKSPACE_POD.to_owned(),
            spec,
        });

        graph.start_order = depends_on_edges(internal.machines());
        validate_start_order(
            &internal.machines().keys().cloned().collect(),
            &graph.start_order,
        )?;

        for name in missing_image {
            warn!("machine '{name}' declares no '{IMAGE_ATTRIBUTE}' attribute");
            internal.add_warning(Warning {
                code: WARNING_NO_IMAGE,
                message: format!("machine '{name}' declares no '{IMAGE_ATTRIBUTE}' attribute"),
            });
        }

        Ok((internal, graph))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moorage_model::{parse_environment_str, InlineRecipeRetriever, StaticInstallerRegistry};

    fn factory() -> ClusterEnvironmentFactory {
        ClusterEnvironmentFactory::new(
            Arc::new(InlineRecipeRetriever),
            Arc::new(StaticInstallerRegistry::default()),
        )
    }

    #[test]
    fn builds_one_pod_with_container_per_machine() {
        let env = parse_environment_str(
            r#"
[recipe]
kind = "cluster"
content = "manifest"

[machines.dev-machine.attributes]
image = "eclipse/ubuntu_jdk8"

[machines.dev-machine.servers."wsagent/http"]
port = "4401"

[machines.db.attributes]
image = "postgres:15"
"#,
        )
        .unwrap();

        let (internal, graph) = factory().create(&env).unwrap();

        assert_eq!(graph.pods.len(), 1);
        let pod = &graph.pods[WORKSPACE_POD];
        assert_eq!(pod.spec.containers.len(), 2);
        assert!(internal.warnings().is_empty());
        assert!(graph
            .container("dev-machine")
            .unwrap()
            .exposed_ports
            .contains("4401/tcp"));
    }

    #[test]
    fn missing_image_attribute_warns_instead_of_failing() {
        let env = parse_environment_str(
            r#"
[recipe]
kind = "cluster"
content = "manifest"

[machines.dev-machine]
"#,
        )
        .unwrap();

        let (internal, graph) = factory().create(&env).unwrap();

        assert!(graph.container("dev-machine").unwrap().image.is_none());
        assert_eq!(internal.warnings().len(), 1);
        assert_eq!(internal.warnings()[0].code, WARNING_NO_IMAGE);
    }

    #[test]
    fn start_order_cycle_fails() {
        let env = parse_environment_str(
            r#"
[recipe]
kind = "cluster"
content = "manifest"

[machines.a.attributes]
dependsOn = "b"

[machines.b.attributes]
dependsOn = "a"
"#,
        )
        .unwrap();

        assert!(matches!(
            factory().create(&env),
            Err(InfraError::Validation(_))
        ));
    }
}
