use crate::StorageError;
use moorage_infra::Pod;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct PodStatus {
    pub phase: PodPhase,
}

/// Namespace-scoped boundary to the orchestration cluster.
///
/// This core never talks to a cluster directly; hosts supply an
/// implementation. Calls may block on the network and the caller observes
/// their latency directly.
pub trait ClusterClient: Send + Sync {
    fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<(), StorageError>;

    /// Current status of a pod, `None` while no status is observable yet.
    fn pod_status(&self, namespace: &str, name: &str) -> Result<Option<PodStatus>, StorageError>;

    /// Delete a pod; reports whether it existed.
    fn delete_pod(&self, namespace: &str, name: &str) -> Result<bool, StorageError>;

    /// Delete a persistent volume claim; reports whether it existed.
    fn delete_claim(&self, namespace: &str, name: &str) -> Result<bool, StorageError>;
}

#[derive(Debug, Default)]
struct MockState {
    pods: BTreeMap<String, Pod>,
    scripted_phases: BTreeMap<String, VecDeque<PodPhase>>,
    claims: Vec<String>,
    deleted_pods: Vec<String>,
    deleted_claims: Vec<String>,
    fail_create: bool,
}

/// In-memory cluster client for tests: records every call and serves
/// scripted pod phases.
///
/// Keys are `namespace/name` so tests can assert scoping.
#[derive(Debug)]
pub struct MockClusterClient {
    state: Mutex<MockState>,
    default_phase: PodPhase,
}

impl Default for MockClusterClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClusterClient {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            default_phase: PodPhase::Succeeded,
        }
    }

    /// Client whose pods report the given phase unless scripted otherwise.
    pub fn with_default_phase(phase: PodPhase) -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            default_phase: phase,
        }
    }

    /// Queue phases a pod will report on successive status polls; once the
    /// queue drains the default phase is served.
    pub fn script_phases(&self, namespace: &str, name: &str, phases: &[PodPhase]) {
        let mut state = self.state.lock().expect("mock state lock");
        state
            .scripted_phases
            .insert(key(namespace, name), phases.iter().copied().collect());
    }

    pub fn seed_claim(&self, namespace: &str, name: &str) {
        let mut state = self.state.lock().expect("mock state lock");
        state.claims.push(key(namespace, name));
    }

    pub fn fail_next_create(&self) {
        self.state.lock().expect("mock state lock").fail_create = true;
    }

    pub fn created_pods(&self) -> Vec<String> {
        let state = self.state.lock().expect("mock state lock");
        state.pods.keys().cloned().collect()
    }

    pub fn created_pod(&self, namespace: &str, name: &str) -> Option<Pod> {
        let state = self.state.lock().expect("mock state lock");
        state.pods.get(&key(namespace, name)).cloned()
    }

    pub fn deleted_pods(&self) -> Vec<String> {
        self.state.lock().expect("mock state lock").deleted_pods.clone()
    }

    pub fn deleted_claims(&self) -> Vec<String> {
        self.state
            .lock()
            .expect("mock state lock")
            .deleted_claims
            .clone()
    }
}

fn key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}

impl ClusterClient for MockClusterClient {
    fn create_pod(&self, namespace: &str, pod: &Pod) -> Result<(), StorageError> {
        let mut state = self.state.lock().expect("mock state lock");
        if state.fail_create {
            state.fail_create = false;
            return Err(StorageError::Client("scripted create failure".to_owned()));
        }
        state.pods.insert(key(namespace, &pod.name), pod.clone());
        Ok(())
    }

    fn pod_status(&self, namespace: &str, name: &str) -> Result<Option<PodStatus>, StorageError> {
        let mut state = self.state.lock().expect("mock state lock");
        let k = key(namespace, name);
        if !state.pods.contains_key(&k) {
            return Ok(None);
        }
        let phase = state
            .scripted_phases
            .get_mut(&k)
            .and_then(VecDeque::pop_front)
            .unwrap_or(self.default_phase);
        Ok(Some(PodStatus { phase }))
    }

    fn delete_pod(&self, namespace: &str, name: &str) -> Result<bool, StorageError> {
        let mut state = self.state.lock().expect("mock state lock");
        let k = key(namespace, name);
        state.deleted_pods.push(k.clone());
        Ok(state.pods.remove(&k).is_some())
    }

    fn delete_claim(&self, namespace: &str, name: &str) -> Result<bool, StorageError> {
        let mut state = self.state.lock().expect("mock state lock");
        let k = key(namespace, name);
        state.deleted_claims.push(k.clone());
        let existed = state.claims.iter().any(|c| c == &k);
        state.claims.retain(|c| c != &k);
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moorage_infra::{Container, Pod};

    fn pod(name: &str) -> Pod {
        Pod::single_container(name, Container::new(name))
    }

    #[test]
    fn status_is_none_until_pod_created() {
        let client = MockClusterClient::new();
        assert!(client.pod_status("ns", "job").unwrap().is_none());

        client.create_pod("ns", &pod("job")).unwrap();
        let status = client.pod_status("ns", "job").unwrap().unwrap();
        assert_eq!(status.phase, PodPhase::Succeeded);
    }

    #[test]
    fn scripted_phases_served_in_order_then_default() {
        let client = MockClusterClient::new();
        client.create_pod("ns", &pod("job")).unwrap();
        client.script_phases("ns", "job", &[PodPhase::Pending, PodPhase::Running]);

        let phases: Vec<PodPhase> = (0..3)
            .map(|_| client.pod_status("ns", "job").unwrap().unwrap().phase)
            .collect();
        assert_eq!(
            phases,
            vec![PodPhase::Pending, PodPhase::Running, PodPhase::Succeeded]
        );
    }

    #[test]
    fn delete_claim_reports_existence() {
        let client = MockClusterClient::new();
        client.seed_claim("ns", "claim-ws1");

        assert!(client.delete_claim("ns", "claim-ws1").unwrap());
        assert!(!client.delete_claim("ns", "claim-ws1").unwrap());
        assert_eq!(client.deleted_claims().len(), 2);
    }

    #[test]
    fn namespace_scopes_pods() {
        let client = MockClusterClient::new();
        client.create_pod("a", &pod("job")).unwrap();
        assert!(client.pod_status("b", "job").unwrap().is_none());
        assert!(!client.delete_pod("b", "job").unwrap());
    }
}
