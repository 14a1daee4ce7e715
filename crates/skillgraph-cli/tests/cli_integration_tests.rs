//! CLI integration tests for skillgraph
//!
//! Tests the skillgraph CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FIXTURE_GRAPH: &str = r#"{
    "nodes": [
        {"key": "person:alice", "attrs": {"type": "person", "login": "alice"}},
        {"key": "project:alice/vec", "attrs": {"type": "project", "name": "alice/vec", "languages": {"Python": 1200}, "stars": 4}},
        {"key": "changeset:c1", "attrs": {"type": "change_set", "message": "Add HNSW index"}},
        {"key": "artifact:index.py", "attrs": {"type": "artifact", "path": "index.py"}},
        {"key": "skill:vector_databases", "attrs": {"type": "skill", "name": "Vector Databases"}}
    ],
    "edges": [
        {"source": "person:alice", "target": "project:alice/vec", "relation": "contributes", "weight": 1.0},
        {"source": "project:alice/vec", "target": "changeset:c1", "relation": "contains", "weight": 1.0},
        {"source": "changeset:c1", "target": "artifact:index.py", "relation": "modifies", "weight": 0.9, "patch": "+def search(q):"},
        {"source": "changeset:c1", "target": "skill:vector_databases", "relation": "implies", "weight": 0.8, "rationale": "builds an ANN index"}
    ]
}"#;

/// Isolated config directory and a fixture graph file
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("graph.json"), FIXTURE_GRAPH).unwrap();
        Self { dir }
    }

    fn graph(&self) -> String {
        self.dir.path().join("graph.json").display().to_string()
    }

    /// Command with no credentials and a private config directory
    #[allow(deprecated)]
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("skillgraph").unwrap();
        cmd.current_dir(self.dir.path());
        cmd.env("SKILLGRAPH_CONFIG_DIR", self.dir.path().join("config"));
        cmd.env_remove("SKILLGRAPH_API_KEY");
        cmd.env_remove("OPENROUTER_API_KEY");
        cmd.env("RUST_LOG", "off");
        cmd
    }
}

#[test]
fn test_config_list_without_credentials() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("exploration.iterations = 20"))
        .stdout(predicate::str::contains("confidence.max_hops = 5"));
}

#[test]
fn test_config_set_then_get() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["config", "set", "exploration.iterations", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set exploration.iterations = 7"));

    fx.cmd()
        .args(["config", "get", "exploration.iterations"])
        .assert()
        .success()
        .stdout(predicate::str::diff("7\n"));

    fx.cmd().args(["-q", "config", "reset"]).assert().success();
    fx.cmd()
        .args(["config", "get", "exploration.iterations"])
        .assert()
        .success()
        .stdout(predicate::str::diff("20\n"));
}

#[test]
fn test_config_set_rejects_out_of_range() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["config", "set", "confidence.min_belief", "1.5"])
        .assert()
        .failure();
}

#[test]
fn test_profile_without_api_key_fails_fast() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["profile", "--graph", &fx.graph(), "--person", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key"));

    assert!(!fx.dir.path().join("output").exists());
}

#[test]
fn test_confidence_on_fixture() {
    let fx = Fixture::new();
    fx.cmd()
        .args([
            "confidence",
            "--graph",
            &fx.graph(),
            "--person",
            "alice",
            "--skill",
            "Vector Databases",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("person:alice -> Vector Databases"))
        .stdout(predicate::str::contains("Paths:        1"));
}

#[test]
fn test_confidence_json() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args([
            "--format",
            "json",
            "confidence",
            "-g",
            &fx.graph(),
            "-p",
            "person:alice",
            "-s",
            "vector databases",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["path_count"], 1);
    assert_eq!(value["model_tag"], "Josang-Yager-Hybrid");
    assert!(value["belief"].as_f64().unwrap() > 0.0);
    assert!(value["uncertainty"].as_f64().unwrap() < 1.0);
}

#[test]
fn test_confidence_unknown_skill() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["confidence", "-g", &fx.graph(), "-p", "alice", "-s", "COBOL"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_paths_expertise() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["paths", "--graph", &fx.graph(), "--start", "person:alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "person:alice -> project:alice/vec -> changeset:c1 -> artifact:index.py",
        ))
        .stdout(predicate::str::contains("1 paths"));
}

#[test]
fn test_paths_compact_schema_json() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args([
            "--format",
            "json",
            "paths",
            "-g",
            &fx.graph(),
            "--start",
            "person:alice",
            "--schema",
            "person-contributes-project-contains-changeset-implies-skill",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["paths"].as_array().unwrap().len(), 1);
    assert_eq!(value["targets"][0]["key"], "skill:vector_databases");
    assert_eq!(value["truncated"], false);
}

#[test]
fn test_inspect_counts() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["inspect", "--graph", &fx.graph()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nodes: 5"))
        .stdout(predicate::str::contains("Edges: 4"))
        .stdout(predicate::str::contains("implies"));
}

#[test]
fn test_missing_graph_file() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["inspect", "--graph", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load graph"));
}
