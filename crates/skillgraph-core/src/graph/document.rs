//! Serializable form of the activity graph
//!
//! A [`GraphDocument`] is the interchange format for both the data source
//! (input) and the export of the evolved graph (output).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::edge::Edge;
use super::node::{Node, NodeKey};
use super::store::ActivityGraph;

/// One edge as stored in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: NodeKey,
    pub target: NodeKey,
    #[serde(flatten)]
    pub edge: Edge,
}

/// Flat node/edge listing of a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphDocument {
    pub fn from_graph(graph: &ActivityGraph) -> Self {
        Self {
            nodes: graph.nodes().cloned().collect(),
            edges: graph
                .edges()
                .map(|(s, t, e)| EdgeRecord {
                    source: s.clone(),
                    target: t.clone(),
                    edge: e.clone(),
                })
                .collect(),
        }
    }

    /// Build the graph, validating node kinds and edge endpoints
    pub fn into_graph(self) -> Result<ActivityGraph> {
        let mut graph = ActivityGraph::new();
        for node in self.nodes {
            let node = Node::new(node.key, node.attrs)?;
            graph.add_node(node);
        }
        for record in self.edges {
            let mut edge = record.edge;
            // deserialization bypasses the clamp
            edge.set_weight(edge.weight());
            graph.add_edge(&record.source, &record.target, edge)?;
        }
        Ok(graph)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{ChangeSetAttrs, NodeKind};
    use crate::graph::Relation;

    #[test]
    fn test_document_preserves_implies_edges() {
        let mut graph = ActivityGraph::new();
        graph.add_node(Node::change_set(
            "abc1234",
            ChangeSetAttrs {
                message: "Add HNSW index".into(),
                timestamp: None,
            },
        ));
        let skill = graph.ensure_skill("Vector Databases");
        graph
            .add_edge(
                &NodeKey::change_set("abc1234"),
                &skill,
                Edge::implies(0.72, "builds an ANN index"),
            )
            .unwrap();

        let json = GraphDocument::from_graph(&graph).to_json_pretty().unwrap();
        let restored = GraphDocument::from_json(&json).unwrap().into_graph().unwrap();

        assert_eq!(restored.node_count(), 2);
        assert_eq!(restored.nodes_of_kind(NodeKind::Skill).count(), 1);
        let edge = restored.edge(&NodeKey::change_set("abc1234"), &skill).unwrap();
        assert_eq!(edge.relation, Relation::Implies);
        assert_eq!(edge.weight(), Some(0.72));
        assert_eq!(edge.rationale.as_deref(), Some("builds an ANN index"));
    }

    #[test]
    fn test_document_parses_source_format() {
        let json = r#"{
            "nodes": [
                {"key": "dev:alice", "attrs": {"type": "person", "login": "alice"}},
                {"key": "repo:alice/tool", "attrs": {"type": "project", "name": "alice/tool", "stars": 3}}
            ],
            "edges": [
                {"source": "dev:alice", "target": "repo:alice/tool", "relation": "contributes", "weight": 1.0}
            ]
        }"#;
        let graph = GraphDocument::from_json(json).unwrap().into_graph().unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.contains(&NodeKey::person("alice")));
    }

    #[test]
    fn test_hand_written_skill_key_is_not_duplicated() {
        let json = r#"{
            "nodes": [{"key": "skill:Machine Learning", "attrs": {"type": "skill", "name": "Machine Learning"}}],
            "edges": []
        }"#;
        let mut graph = GraphDocument::from_json(json).unwrap().into_graph().unwrap();
        let key = graph.ensure_skill("Machine Learning");
        assert_eq!(key, NodeKey::skill("machine learning"));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_document_rejects_dangling_edge() {
        let json = r#"{
            "nodes": [{"key": "person:alice", "attrs": {"type": "person", "login": "alice"}}],
            "edges": [{"source": "person:alice", "target": "project:ghost", "relation": "contributes"}]
        }"#;
        let doc = GraphDocument::from_json(json).unwrap();
        assert!(doc.into_graph().is_err());
    }

    #[test]
    fn test_document_rejects_kind_mismatch() {
        let json = r#"{
            "nodes": [{"key": "person:alice", "attrs": {"type": "skill", "name": "alice"}}],
            "edges": []
        }"#;
        let doc = GraphDocument::from_json(json).unwrap();
        assert!(doc.into_graph().is_err());
    }
}
