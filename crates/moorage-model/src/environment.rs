use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Declarative, infrastructure-agnostic description of a workspace.
///
/// Parsed once and never mutated; resolution produces an
/// [`crate::InternalEnvironment`] instead of editing this document in place.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Environment {
    pub recipe: Recipe,
    #[serde(default)]
    pub machines: BTreeMap<String, MachineConfig>,
}

/// Base definition for a workspace's machines: an image reference, a
/// dockerfile, a compose document, or a cluster manifest.
///
/// `content` and `location` are both optional at the declarative level;
/// resolution enforces that exactly one source survives.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub installers: Vec<String>,
}

/// A named network endpoint exposed by a machine.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub port: String,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

pub fn parse_environment_str(input: &str) -> Result<Environment, ModelError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_environment_file(path: impl AsRef<Path>) -> Result<Environment, ModelError> {
    let content = fs::read_to_string(path)?;
    parse_environment_str(&content)
}
