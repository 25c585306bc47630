use crate::environment::ServerConfig;
use crate::installer::Installer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server reference exposed by the machine hosting the workspace agent.
pub const SERVER_WS_AGENT_HTTP: &str = "wsagent/http";

/// Recipe after resolution: content is always present, a `location` source
/// has been fetched and folded into `content`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct InternalRecipe {
    pub kind: String,
    pub content_type: Option<String>,
    pub content: String,
}

/// One machine after resolution: installers in dependency order, servers,
/// merged env, and free-form attributes.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct InternalMachineConfig {
    pub installers: Vec<Installer>,
    pub servers: BTreeMap<String, ServerConfig>,
    pub env: BTreeMap<String, String>,
    pub attributes: BTreeMap<String, String>,
}

/// Non-fatal constraint violation noticed during resolution.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Warning {
    pub code: u32,
    pub message: String,
}

/// Resolved, validated representation of a workspace environment.
///
/// Built exactly once per workspace-start attempt. The machine map is fixed
/// at construction; [`InternalEnvironment::add_warning`] is the only mutator.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct InternalEnvironment {
    recipe: InternalRecipe,
    machines: BTreeMap<String, InternalMachineConfig>,
    warnings: Vec<Warning>,
}

impl InternalEnvironment {
    pub fn new(
        recipe: InternalRecipe,
        machines: BTreeMap<String, InternalMachineConfig>,
    ) -> Self {
        Self {
            recipe,
            machines,
            warnings: Vec::new(),
        }
    }

    pub fn recipe(&self) -> &InternalRecipe {
        &self.recipe
    }

    pub fn machines(&self) -> &BTreeMap<String, InternalMachineConfig> {
        &self.machines
    }

    /// Name of the first machine exposing the given server reference.
    pub fn machine_with_server(&self, server_ref: &str) -> Option<&str> {
        self.machines
            .iter()
            .find(|(_, m)| m.servers.contains_key(server_ref))
            .map(|(name, _)| name.as_str())
    }

    pub fn add_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}
