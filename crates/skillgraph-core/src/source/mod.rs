//! Graph data sources
//!
//! A source produces the initial activity graph: people, projects,
//! change-sets and artifacts joined by `contributes`, `contains` and
//! `modifies` edges.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::error::{Error, Result};
use crate::graph::{ActivityGraph, GraphDocument};

/// Anything that can build an activity graph
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Load the full graph
    async fn load(&self) -> Result<ActivityGraph>;

    /// Name used in logs
    fn describe(&self) -> String {
        "graph source".to_string()
    }
}

/// Reads a graph document from a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl GraphSource for JsonFileSource {
    async fn load(&self) -> Result<ActivityGraph> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::InvalidInput(format!("cannot read graph file {}: {}", self.path.display(), e))
        })?;
        let graph = GraphDocument::from_json(&contents)?.into_graph()?;
        info!(
            path = %self.path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Loaded graph"
        );
        Ok(graph)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Serves a prebuilt graph
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    graph: ActivityGraph,
}

impl InMemorySource {
    pub fn new(graph: ActivityGraph) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl GraphSource for InMemorySource {
    async fn load(&self) -> Result<ActivityGraph> {
        Ok(self.graph.clone())
    }

    fn describe(&self) -> String {
        "in-memory graph".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node, NodeKey, PersonAttrs};

    fn sample() -> ActivityGraph {
        let mut g = ActivityGraph::new();
        g.add_node(Node::person(PersonAttrs {
            login: "alice".into(),
            ..Default::default()
        }));
        g.add_node(Node::skill("Rust"));
        g.add_edge(&NodeKey::person("alice"), &NodeKey::skill("rust"), Edge::implies(0.7, "crates"))
            .unwrap();
        g
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        GraphDocument::from_graph(&sample()).write_to(&path).unwrap();

        let source = JsonFileSource::new(&path);
        let graph = source.load().await.unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(source.describe().contains("graph.json"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let source = JsonFileSource::new("/nonexistent/graph.json");
        assert!(matches!(source.load().await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonFileSource::new(&path).load().await, Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn test_in_memory_source() {
        let graph = InMemorySource::new(sample()).load().await.unwrap();
        assert_eq!(graph.node_count(), 2);
    }
}
