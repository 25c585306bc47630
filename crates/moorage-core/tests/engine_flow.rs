//! End-to-end workspace lifecycle against the mock cluster client: start an
//! environment, inspect the provisioned graph, delete the workspace, shut the
//! engine down.

use moorage_core::Engine;
use moorage_infra::RuntimeIdentity;
use moorage_model::{
    parse_environment_str, Environment, InlineRecipeRetriever, Installer,
    StaticInstallerRegistry,
};
use moorage_storage::{ClusterClient, MockClusterClient, StorageSettings};
use std::sync::Arc;
use std::time::Duration;

fn compose_environment() -> Environment {
    parse_environment_str(
        r#"
[recipe]
kind = "compose"
content = """
[services.dev-machine]
image = "eclipse/ubuntu_jdk8"
depends_on = ["db"]

[services.db]
image = "postgres:15"
"""

[machines.dev-machine]
installers = ["org.eclipse.che.ws-agent"]

[machines.dev-machine.servers."wsagent/http"]
port = "4401"
protocol = "http"

[machines.dev-machine.env]
JAVA_OPTS = "-Xmx512m"

[machines.dev-machine.attributes]
memoryLimitBytes = "2147483648"

[machines.db]
"#,
    )
    .unwrap()
}

fn identity() -> RuntimeIdentity {
    RuntimeIdentity {
        workspace_id: "workspace123".to_owned(),
        env_name: "default".to_owned(),
        owner: "user".to_owned(),
    }
}

fn settings() -> StorageSettings {
    StorageSettings {
        claim_name: "che-claim".to_owned(),
        namespace: Some("che".to_owned()),
        poll_attempts: 5,
        poll_interval_ms: 0,
        ..StorageSettings::default()
    }
}

fn registry() -> StaticInstallerRegistry {
    StaticInstallerRegistry::new([Installer {
        id: "org.eclipse.che.ws-agent".to_owned(),
        version: Some("1.0".to_owned()),
        dependencies: Vec::new(),
        script: Some("start-agent.sh".to_owned()),
    }])
}

fn engine(client: &Arc<MockClusterClient>) -> Engine {
    Engine::new(
        Arc::new(InlineRecipeRetriever),
        Arc::new(registry()),
        Arc::clone(client) as Arc<dyn ClusterClient>,
        settings(),
    )
    .unwrap()
}

#[test]
fn start_builds_a_fully_provisioned_graph() {
    let client = Arc::new(MockClusterClient::new());
    let result = engine(&client)
        .start(&compose_environment(), &identity())
        .unwrap();

    // Resolved model: installers in order, both machines present.
    assert_eq!(result.env.machines().len(), 2);
    assert_eq!(
        result.env.machines()["dev-machine"].installers[0].id,
        "org.eclipse.che.ws-agent"
    );

    // Normalized containers with start order from the compose document.
    let dev = result.graph.container("dev-machine").unwrap();
    assert_eq!(dev.image.as_deref(), Some("eclipse/ubuntu_jdk8"));
    assert_eq!(dev.memory_limit.as_deref(), Some("2147483648"));
    assert!(dev.env.iter().any(|e| e.name == "JAVA_OPTS"));
    assert_eq!(result.graph.start_order["dev-machine"], vec!["db".to_owned()]);

    // The shared claim is declared and mounted on the agent container only,
    // isolated under the workspace's sub-path.
    assert!(result.graph.claims.contains_key("che-claim"));
    assert_eq!(dev.volume_mounts.len(), 1);
    assert_eq!(
        dev.volume_mounts[0].sub_path.as_deref(),
        Some("workspace123/projects")
    );
    assert!(result.graph.container("db").unwrap().volume_mounts.is_empty());

    // The prepare job pod ran against the cluster and was removed.
    assert_eq!(client.deleted_pods(), vec!["che/pod-pvc-prepare-workspace123"]);
}

#[test]
fn second_start_reuses_the_declared_claim() {
    let client = Arc::new(MockClusterClient::new());
    let engine = engine(&client);

    let first = engine.start(&compose_environment(), &identity()).unwrap();
    let second = engine.start(&compose_environment(), &identity()).unwrap();

    // Each start rebuilds the graph from scratch and redeclares the claim;
    // the mkdir job still runs every time.
    assert_eq!(first.graph, second.graph);
    assert_eq!(client.deleted_pods().len(), 2);
}

#[test]
fn delete_runs_cleanup_job_in_background() {
    let client = Arc::new(MockClusterClient::new());
    let engine = engine(&client);

    engine.delete("workspace123").unwrap();
    engine.shutdown(Duration::from_secs(5));

    assert_eq!(client.deleted_pods(), vec!["che/pod-pvc-cleanup-workspace123"]);
}

#[test]
fn unique_strategy_gives_each_workspace_its_own_claim() {
    let client = Arc::new(MockClusterClient::new());
    let settings = StorageSettings {
        strategy: "unique-workspace".to_owned(),
        ..settings()
    };
    let engine = Engine::new(
        Arc::new(InlineRecipeRetriever),
        Arc::new(registry()),
        Arc::clone(&client) as Arc<dyn ClusterClient>,
        settings,
    )
    .unwrap();

    let result = engine
        .start(&compose_environment(), &identity())
        .unwrap();

    assert!(result.graph.claims.contains_key("che-claim-workspace123"));
    // No helper job pods with per-workspace claims.
    assert!(client.created_pods().is_empty());

    engine.delete("workspace123").unwrap();
    assert_eq!(client.deleted_claims(), vec!["che/che-claim-workspace123"]);
}
