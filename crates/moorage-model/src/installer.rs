use crate::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A unit of software provisioned into a machine.
///
/// Installers declare ordering dependencies on other installers by id; the
/// registry resolves a machine's requested ids into a dependency-ordered list.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Installer {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub script: Option<String>,
}

/// Resolves installer ids into concrete installers in a valid start order.
pub trait InstallerRegistry: Send + Sync {
    /// Resolve the requested ids, expand transitive dependencies, and return
    /// a topological order in which every dependency precedes its dependents.
    ///
    /// Fails if any id (requested or transitive) is unknown, or if the
    /// dependency graph contains a cycle.
    fn resolve_ordered(&self, ids: &[String]) -> Result<Vec<Installer>, ModelError>;
}

/// In-memory registry backed by a fixed installer catalog.
#[derive(Debug, Default)]
pub struct StaticInstallerRegistry {
    catalog: BTreeMap<String, Installer>,
}

impl StaticInstallerRegistry {
    pub fn new(installers: impl IntoIterator<Item = Installer>) -> Self {
        let catalog = installers
            .into_iter()
            .map(|i| (i.id.clone(), i))
            .collect();
        Self { catalog }
    }
}

impl InstallerRegistry for StaticInstallerRegistry {
    fn resolve_ordered(&self, ids: &[String]) -> Result<Vec<Installer>, ModelError> {
        let mut ordered = Vec::new();
        let mut done = BTreeSet::new();
        let mut in_progress = BTreeSet::new();
        for id in ids {
            self.visit(id, &mut done, &mut in_progress, &mut ordered)?;
        }
        Ok(ordered)
    }
}

impl StaticInstallerRegistry {
    fn visit(
        &self,
        id: &str,
        done: &mut BTreeSet<String>,
        in_progress: &mut BTreeSet<String>,
        ordered: &mut Vec<Installer>,
    ) -> Result<(), ModelError> {
        if done.contains(id) {
            return Ok(());
        }
        if !in_progress.insert(id.to_owned()) {
            return Err(ModelError::InstallerCycle(id.to_owned()));
        }
        let installer = self
            .catalog
            .get(id)
            .ok_or_else(|| ModelError::UnknownInstaller(id.to_owned()))?;
        for dep in &installer.dependencies {
            self.visit(dep, done, in_progress, ordered)?;
        }
        in_progress.remove(id);
        done.insert(id.to_owned());
        ordered.push(installer.clone());
        Ok(())
    }
}
