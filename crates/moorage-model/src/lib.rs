//! Declarative workspace environment documents and the resolved internal model.
//!
//! This crate holds both sides of the environment pipeline's input boundary:
//! the immutable declarative `Environment` document as users write it, and the
//! `InternalEnvironment` aggregate produced once per workspace-start attempt
//! after recipes are retrieved and installers are resolved into dependency
//! order. The collaborators that perform that resolution (recipe retriever,
//! installer registry) are traits here so infrastructures can swap them.

pub mod environment;
pub mod installer;
pub mod internal;
pub mod recipe;

pub use environment::{
    parse_environment_file, parse_environment_str, Environment, MachineConfig, Recipe,
    ServerConfig,
};
pub use installer::{Installer, InstallerRegistry, StaticInstallerRegistry};
pub use internal::{
    InternalEnvironment, InternalMachineConfig, InternalRecipe, Warning, SERVER_WS_AGENT_HTTP,
};
pub use recipe::{FileRecipeRetriever, InlineRecipeRetriever, RecipeRetriever};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read environment file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse environment: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("environment declares no machines")]
    NoMachines,
    #[error("recipe has neither content nor location")]
    RecipeSourceMissing,
    #[error("recipe location is not retrievable: {0}")]
    RecipeUnretrievable(String),
    #[error("unknown installer: {0}")]
    UnknownInstaller(String),
    #[error("installer dependency cycle involving '{0}'")]
    InstallerCycle(String),
}
