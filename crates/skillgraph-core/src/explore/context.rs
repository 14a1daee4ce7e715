//! Evidence handed to the skill oracle for one graph node

use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::{ActivityGraph, NodeAttrs, NodeKey, NodeKind, Relation};

/// What the oracle sees about a simulated node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBundle {
    pub node: NodeKey,
    pub kind: NodeKind,
    /// Commit message, project description or person bio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub topics: Vec<String>,
    pub languages: BTreeMap<String, u64>,
    /// Patch excerpts of the files a change-set modifies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl ContextBundle {
    /// Bundle with no evidence beyond the node identity
    pub fn new(node: NodeKey) -> Self {
        Self {
            kind: node.kind(),
            node,
            text: None,
            topics: Vec::new(),
            languages: BTreeMap::new(),
            diff_summary: None,
        }
    }

    /// Collect the evidence for `key`, or `None` if the node does not exist
    pub fn from_graph(graph: &ActivityGraph, key: &NodeKey, excerpt_chars: usize) -> Option<Self> {
        let node = graph.node(key)?;
        let mut bundle = Self::new(key.clone());

        bundle.text = node
            .attrs
            .primary_text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        if let NodeAttrs::Project(project) = &node.attrs {
            bundle.topics = project.topics.clone();
            bundle.languages = project.languages.clone();
        }

        if key.kind() == NodeKind::ChangeSet {
            let summary = diff_summary(graph, key, excerpt_chars);
            bundle.diff_summary = (!summary.is_empty()).then_some(summary);
        }

        Some(bundle)
    }
}

/// Concatenate a bounded prefix of every patch on the node's `modifies`
/// edges, one `File:`/`Patch:` block per artifact
pub fn diff_summary(graph: &ActivityGraph, key: &NodeKey, excerpt_chars: usize) -> String {
    let mut summary = String::new();
    for (target, edge) in graph.out_edges(key) {
        if edge.relation != Relation::Modifies {
            continue;
        }
        let patch = edge.patch.as_deref().unwrap_or("");
        let prefix: String = patch.chars().take(excerpt_chars).collect();
        summary.push_str(&format!("\nFile: {}\nPatch: {}...", target.id(), prefix));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ChangeSetAttrs, Edge, Node, ProjectAttrs};

    #[test]
    fn test_change_set_bundle_has_diff_excerpt() {
        let mut g = ActivityGraph::new();
        g.add_node(Node::change_set(
            "abc",
            ChangeSetAttrs {
                message: "  Add HNSW index  ".into(),
                timestamp: None,
            },
        ));
        g.add_node(Node::artifact("src/index.rs"));
        g.add_node(Node::artifact("README.md"));
        let cs = NodeKey::change_set("abc");
        g.add_edge(&cs, &NodeKey::artifact("src/index.rs"), Edge::modifies(Some(0.7), "ééééé"))
            .unwrap();
        g.add_edge(&cs, &NodeKey::artifact("README.md"), Edge::modifies(None, "docs"))
            .unwrap();

        let bundle = ContextBundle::from_graph(&g, &cs, 3).unwrap();
        assert_eq!(bundle.kind, NodeKind::ChangeSet);
        assert_eq!(bundle.text.as_deref(), Some("Add HNSW index"));
        assert_eq!(
            bundle.diff_summary.as_deref(),
            Some("\nFile: src/index.rs\nPatch: ééé...\nFile: README.md\nPatch: doc...")
        );
    }

    #[test]
    fn test_project_bundle_carries_topics_and_languages() {
        let mut g = ActivityGraph::new();
        g.add_node(Node::project(ProjectAttrs {
            name: "alice/vec".into(),
            description: Some("vector search".into()),
            languages: [("Rust".to_string(), 9000)].into_iter().collect(),
            topics: vec!["ann".into(), "search".into()],
            ..Default::default()
        }));
        let bundle = ContextBundle::from_graph(&g, &NodeKey::project("alice/vec"), 200).unwrap();
        assert_eq!(bundle.topics, vec!["ann", "search"]);
        assert_eq!(bundle.languages.get("Rust"), Some(&9000));
        assert!(bundle.diff_summary.is_none());
    }

    #[test]
    fn test_missing_node() {
        let g = ActivityGraph::new();
        assert!(ContextBundle::from_graph(&g, &NodeKey::person("ghost"), 200).is_none());
    }
}
