use crate::InfraError;
use std::collections::{BTreeMap, BTreeSet};

/// Validate the machine start-order graph before the environment reaches the
/// orchestration layer.
///
/// Every edge must reference a declared machine and the graph must be
/// acyclic; an environment that cannot be scheduled fails here.
pub fn validate_start_order(
    machines: &BTreeSet<String>,
    start_order: &BTreeMap<String, Vec<String>>,
) -> Result<(), InfraError> {
    for (machine, deps) in start_order {
        if !machines.contains(machine) {
            return Err(InfraError::Validation(format!(
                "start order references undeclared machine '{machine}'"
            )));
        }
        for dep in deps {
            if !machines.contains(dep) {
                return Err(InfraError::Validation(format!(
                    "machine '{machine}' depends on undeclared machine '{dep}'"
                )));
            }
        }
    }

    let mut done = BTreeSet::new();
    let mut in_progress = BTreeSet::new();
    for machine in start_order.keys() {
        visit(machine, start_order, &mut done, &mut in_progress)?;
    }
    Ok(())
}

fn visit(
    machine: &str,
    start_order: &BTreeMap<String, Vec<String>>,
    done: &mut BTreeSet<String>,
    in_progress: &mut BTreeSet<String>,
) -> Result<(), InfraError> {
    if done.contains(machine) {
        return Ok(());
    }
    if !in_progress.insert(machine.to_owned()) {
        return Err(InfraError::Validation(format!(
            "machine start order contains a cycle involving '{machine}'"
        )));
    }
    if let Some(deps) = start_order.get(machine) {
        for dep in deps {
            visit(dep, start_order, done, in_progress)?;
        }
    }
    in_progress.remove(machine);
    done.insert(machine.to_owned());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machines(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    fn edges(pairs: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(m, deps)| {
                (
                    (*m).to_owned(),
                    deps.iter().map(|d| (*d).to_owned()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn accepts_acyclic_order() {
        let result = validate_start_order(
            &machines(&["app", "db", "cache"]),
            &edges(&[("app", &["db", "cache"]), ("cache", &["db"])]),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn accepts_empty_order() {
        assert!(validate_start_order(&machines(&["app"]), &BTreeMap::new()).is_ok());
    }

    #[test]
    fn rejects_cycle() {
        let result = validate_start_order(
            &machines(&["a", "b"]),
            &edges(&[("a", &["b"]), ("b", &["a"])]),
        );
        assert!(matches!(result, Err(InfraError::Validation(_))));
    }

    #[test]
    fn rejects_self_dependency() {
        let result = validate_start_order(&machines(&["a"]), &edges(&[("a", &["a"])]));
        assert!(matches!(result, Err(InfraError::Validation(_))));
    }

    #[test]
    fn rejects_undeclared_machine() {
        let result = validate_start_order(&machines(&["a"]), &edges(&[("a", &["ghost"])]));
        match result {
            Err(InfraError::Validation(msg)) => assert!(msg.contains("ghost")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
