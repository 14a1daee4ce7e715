//! Typed activity graph
//!
//! A directed graph of people, projects, change-sets, artifacts and inferred
//! skills. The data source supplies the initial topology (`contributes`,
//! `contains`, `modifies`); exploration adds `implies` edges and skill nodes.
//!
//! The graph is shared between the exploration engine (writer) and the
//! confidence engine (reader) through [`SharedGraph`]. Confidence work runs
//! against an immutable snapshot taken once a run has finished.

mod document;
mod edge;
mod node;
mod store;

use std::sync::Arc;

use tokio::sync::RwLock;

pub use document::{EdgeRecord, GraphDocument};
pub use edge::{Edge, Relation};
pub use node::{
    ArtifactAttrs, ChangeSetAttrs, Node, NodeAttrs, NodeKey, NodeKind, PersonAttrs, ProjectAttrs,
    SkillAttrs,
};
pub use store::{ActivityGraph, PathSearch};

/// Graph handle shared by the exploration and confidence engines
pub type SharedGraph = Arc<RwLock<ActivityGraph>>;

/// Wrap a graph for shared, lock-protected access
pub fn shared(graph: ActivityGraph) -> SharedGraph {
    Arc::new(RwLock::new(graph))
}

/// Take an immutable snapshot for read-only, parallel evaluation
pub async fn snapshot(graph: &SharedGraph) -> Arc<ActivityGraph> {
    Arc::new(graph.read().await.clone())
}
