use crate::resources::{Container, EnvVar};
use crate::InfraError;
use moorage_model::InternalMachineConfig;
use std::collections::BTreeSet;

/// Machine attribute carrying the memory limit in bytes.
pub const MEMORY_LIMIT_ATTRIBUTE: &str = "memoryLimitBytes";

/// Normalize one machine's port exposures and env onto its container.
///
/// Exposure strings and server ports lacking a protocol suffix get `/tcp`
/// appended; the exposure set dedups. Machine env entries are appended
/// without conflict resolution, which is the env provisioner's job.
pub fn normalize_machine(
    name: &str,
    container: &mut Container,
    machine: &InternalMachineConfig,
) -> Result<(), InfraError> {
    if let Some(raw) = machine.attributes.get(MEMORY_LIMIT_ATTRIBUTE) {
        let bytes: u64 = raw.parse().map_err(|_| {
            InfraError::Validation(format!(
                "value of attribute '{MEMORY_LIMIT_ATTRIBUTE}' of machine '{name}' is illegal"
            ))
        })?;
        container.memory_limit = Some(bytes.to_string());
    }

    let normalized: BTreeSet<String> = container
        .exposed_ports
        .iter()
        .map(|e| normalize_port(e))
        .collect();
    container.exposed_ports = normalized;

    for server in machine.servers.values() {
        container.exposed_ports.insert(normalize_port(&server.port));
    }

    for (key, value) in &machine.env {
        container.env.push(EnvVar {
            name: key.clone(),
            value: value.clone(),
        });
    }

    Ok(())
}

fn normalize_port(port: &str) -> String {
    if port.contains('/') {
        port.to_owned()
    } else {
        format!("{port}/tcp")
    }
}
