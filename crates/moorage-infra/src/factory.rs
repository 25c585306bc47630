use crate::resources::ResourceGraph;
use crate::InfraError;
use moorage_model::{
    Environment, InstallerRegistry, InternalEnvironment, InternalMachineConfig, RecipeRetriever,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Machine attribute listing machines that must start first, comma-separated.
pub const DEPENDS_ON_ATTRIBUTE: &str = "dependsOn";

/// Builds the internal model and the native resource graph for one
/// infrastructure kind.
///
/// Implementations share the resolve pipeline ([`resolve_environment`]) and
/// differ in how the graph is shaped and validated. Selected through
/// [`select_factory`] by the recipe kind string.
pub trait EnvironmentFactory: Send + Sync {
    fn kind(&self) -> &str;

    /// Resolve and validate the environment; aborts atomically on any
    /// resolution or validation failure, never returning a partial model.
    fn create(
        &self,
        environment: &Environment,
    ) -> Result<(InternalEnvironment, ResourceGraph), InfraError>;
}

pub fn select_factory(
    kind: &str,
    retriever: Arc<dyn RecipeRetriever>,
    registry: Arc<dyn InstallerRegistry>,
) -> Result<Box<dyn EnvironmentFactory>, InfraError> {
    match kind {
        "compose" => Ok(Box::new(crate::compose::ComposeEnvironmentFactory::new(
            retriever, registry,
        ))),
        "dockerfile" => Ok(Box::new(
            crate::dockerfile::DockerfileEnvironmentFactory::new(retriever, registry),
        )),
        "image" => Ok(Box::new(crate::image::ImageEnvironmentFactory::new(
            retriever, registry,
        ))),
        "cluster" => Ok(Box::new(crate::cluster::ClusterEnvironmentFactory::new(
            retriever, registry,
        ))),
        other => Err(InfraError::UnknownKind(other.to_owned())),
    }
}

/// Shared resolve pipeline: retrieve the recipe, resolve each machine's
/// installers in dependency order, and build the internal model.
///
/// An unresolved installer id is an infrastructure error and aborts the whole
/// construction.
pub(crate) fn resolve_environment(
    environment: &Environment,
    retriever: &dyn RecipeRetriever,
    registry: &dyn InstallerRegistry,
) -> Result<InternalEnvironment, InfraError> {
    if environment.machines.is_empty() {
        return Err(InfraError::Validation(
            "environment declares no machines".to_owned(),
        ));
    }

    let recipe = retriever
        .retrieve(&environment.recipe)
        .map_err(|e| InfraError::Infrastructure(e.to_string()))?;

    let mut machines = BTreeMap::new();
    for (name, config) in &environment.machines {
        let installers = registry
            .resolve_ordered(&config.installers)
            .map_err(|e| InfraError::Infrastructure(e.to_string()))?;
        machines.insert(
            name.clone(),
            InternalMachineConfig {
                installers,
                servers: config.servers.clone(),
                env: config.env.clone(),
                attributes: config.attributes.clone(),
            },
        );
    }

    Ok(InternalEnvironment::new(recipe, machines))
}

/// Start-order edges declared through machine `dependsOn` attributes.
pub(crate) fn depends_on_edges(
    machines: &BTreeMap<String, InternalMachineConfig>,
) -> BTreeMap<String, Vec<String>> {
    let mut edges = BTreeMap::new();
    for (name, machine) in machines {
        if let Some(raw) = machine.attributes.get(DEPENDS_ON_ATTRIBUTE) {
            let deps: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned)
                .collect();
            if !deps.is_empty() {
                edges.insert(name.clone(), deps);
            }
        }
    }
    edges
}
