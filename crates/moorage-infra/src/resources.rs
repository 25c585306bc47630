use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Restart policy for short-lived helper pods.
pub const RESTART_POLICY_NEVER: &str = "Never";

/// One environment variable entry on a container.
///
/// Container env is a list, not a map: machine normalization appends entries
/// without conflict resolution, and the env provisioner later enforces
/// last-writer-per-key by removing same-key entries before appending.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    /// Image reference; `None` for dockerfile-built containers.
    pub image: Option<String>,
    /// Dockerfile content for containers built from a dockerfile recipe.
    pub build_context: Option<String>,
    pub command: Vec<String>,
    pub env: Vec<EnvVar>,
    /// Deduplicated set of "port/protocol" exposure strings.
    pub exposed_ports: BTreeSet<String>,
    pub volume_mounts: Vec<VolumeMount>,
    /// Memory limit as an infrastructure quantity, e.g. "268435456" or "256Mi".
    pub memory_limit: Option<String>,
    pub privileged: bool,
    pub image_pull_policy: Option<String>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    pub sub_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Volume {
    pub name: String,
    pub claim_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PodSpec {
    pub containers: Vec<Container>,
    pub volumes: Vec<Volume>,
    pub restart_policy: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Pod {
    pub name: String,
    pub spec: PodSpec,
}

impl Pod {
    /// Single-container pod named after its machine.
    pub fn single_container(name: impl Into<String>, container: Container) -> Self {
        let name = name.into();
        Self {
            name,
            spec: PodSpec {
                containers: vec![container],
                volumes: Vec::new(),
                restart_policy: None,
            },
        }
    }
}

/// A request for durable storage bound to one or more workspaces.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PersistentVolumeClaim {
    pub name: String,
    pub access_mode: String,
    pub capacity: String,
}

/// Infrastructure-native resource graph built by an environment factory.
///
/// Owned by the factory during construction, then passed by reference through
/// the strictly sequential provisioner pipeline; never shared across
/// concurrent start attempts. All resources are keyed by stable string
/// identity.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ResourceGraph {
    pub pods: BTreeMap<String, Pod>,
    pub claims: BTreeMap<String, PersistentVolumeClaim>,
    /// Per-machine "starts after" edges, validated acyclic at construction.
    pub start_order: BTreeMap<String, Vec<String>>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pod(&mut self, pod: Pod) {
        self.pods.insert(pod.name.clone(), pod);
    }

    /// First container with the given name across all pods, in pod key order.
    pub fn container_mut(&mut self, container_name: &str) -> Option<&mut Container> {
        self.pods
            .values_mut()
            .flat_map(|p| p.spec.containers.iter_mut())
            .find(|c| c.name == container_name)
    }

    pub fn container(&self, container_name: &str) -> Option<&Container> {
        self.pods
            .values()
            .flat_map(|p| p.spec.containers.iter())
            .find(|c| c.name == container_name)
    }

    /// First pod holding a container with the given name, in pod key order.
    pub fn pod_with_container_mut(&mut self, container_name: &str) -> Option<&mut Pod> {
        self.pods
            .values_mut()
            .find(|p| p.spec.containers.iter().any(|c| c.name == container_name))
    }
}

pub fn new_pvc(
    name: impl Into<String>,
    access_mode: impl Into<String>,
    capacity: impl Into<String>,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        name: name.into(),
        access_mode: access_mode.into(),
        capacity: capacity.into(),
    }
}

pub fn new_volume(name: impl Into<String>, claim_name: impl Into<String>) -> Volume {
    Volume {
        name: name.into(),
        claim_name: claim_name.into(),
    }
}

pub fn new_volume_mount(
    name: impl Into<String>,
    mount_path: impl Into<String>,
    sub_path: Option<&str>,
) -> VolumeMount {
    VolumeMount {
        name: name.into(),
        mount_path: mount_path.into(),
        sub_path: sub_path.map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(pods: &[(&str, &[&str])]) -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        for (pod_name, containers) in pods {
            let mut spec = PodSpec::default();
            for c in *containers {
                spec.containers.push(Container::new(*c));
            }
            graph.add_pod(Pod {
                name: (*pod_name).to_owned(),
                spec,
            });
        }
        graph
    }

    #[test]
    fn container_lookup_finds_first_match_in_pod_key_order() {
        let mut graph = graph_with(&[("b-pod", &["app"]), ("a-pod", &["app", "db"])]);

        graph.container_mut("app").unwrap().privileged = true;

        // BTreeMap iterates "a-pod" first, so only its container changed.
        assert!(graph.pods["a-pod"].spec.containers[0].privileged);
        assert!(!graph.pods["b-pod"].spec.containers[0].privileged);
    }

    #[test]
    fn pod_with_container_lookup() {
        let mut graph = graph_with(&[("main", &["agent"]), ("aux", &["db"])]);
        assert_eq!(graph.pod_with_container_mut("db").unwrap().name, "aux");
        assert!(graph.pod_with_container_mut("missing").is_none());
    }

    #[test]
    fn resource_constructors() {
        let pvc = new_pvc("claim", "ReadWriteOnce", "10Gi");
        assert_eq!(pvc.capacity, "10Gi");

        let volume = new_volume("claim", "claim");
        assert_eq!(volume.claim_name, "claim");

        let mount = new_volume_mount("claim", "/projects", Some("ws/projects"));
        assert_eq!(mount.sub_path.as_deref(), Some("ws/projects"));
        let bare = new_volume_mount("claim", "/projects", None);
        assert!(bare.sub_path.is_none());
    }

    #[test]
    fn graph_serializes_to_json() {
        let graph = graph_with(&[("main", &["app"])]);
        let json = serde_json::to_string(&graph).unwrap();
        let back: ResourceGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }
}
