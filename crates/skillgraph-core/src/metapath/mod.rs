//! Typed-path (meta-path) matching
//!
//! A [`MetaPath`] is an alternating schema of node kinds and relations, e.g.
//! `person -contributes-> project -contains-> changeset`. The
//! [`MetaPathWalker`] enumerates every concrete node sequence in the graph
//! that matches a schema from a given start node, and scores a sequence by
//! the product of its edge weights.
//!
//! Enumeration is exhaustive unless a bound is set with
//! [`MetaPathWalker::with_max_matches`].

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::graph::{ActivityGraph, NodeKey, NodeKind, Relation};

/// Alternating node-kind / relation schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaPath {
    name: String,
    node_kinds: Vec<NodeKind>,
    relations: Vec<Relation>,
}

impl MetaPath {
    /// Create a schema; requires `node_kinds.len() == relations.len() + 1`
    pub fn new(
        name: impl Into<String>,
        node_kinds: Vec<NodeKind>,
        relations: Vec<Relation>,
    ) -> Result<Self> {
        if node_kinds.is_empty() {
            return Err(Error::InvalidInput(
                "meta-path needs at least one node kind".to_string(),
            ));
        }
        if node_kinds.len() != relations.len() + 1 {
            return Err(Error::InvalidInput(format!(
                "meta-path has {} node kinds but {} relations",
                node_kinds.len(),
                relations.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            node_kinds,
            relations,
        })
    }

    /// person -contributes-> project -contains-> changeset -modifies-> artifact
    pub fn expertise() -> Self {
        Self {
            name: "ExpertiseCode".to_string(),
            node_kinds: vec![
                NodeKind::Person,
                NodeKind::Project,
                NodeKind::ChangeSet,
                NodeKind::Artifact,
            ],
            relations: vec![Relation::Contributes, Relation::Contains, Relation::Modifies],
        }
    }

    /// person -contributes-> project -contains-> changeset
    pub fn collaboration() -> Self {
        Self {
            name: "Collaboration".to_string(),
            node_kinds: vec![NodeKind::Person, NodeKind::Project, NodeKind::ChangeSet],
            relations: vec![Relation::Contributes, Relation::Contains],
        }
    }

    /// Parse a built-in name or a compact `kind-relation-kind-...` form
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "expertise" | "expertisecode" => return Ok(Self::expertise()),
            "collaboration" => return Ok(Self::collaboration()),
            _ => {}
        }

        let mut node_kinds = Vec::new();
        let mut relations = Vec::new();
        for (i, token) in s.split('-').enumerate() {
            if i % 2 == 0 {
                let kind = NodeKind::parse(token)
                    .ok_or_else(|| Error::InvalidInput(format!("unknown node kind '{token}'")))?;
                node_kinds.push(kind);
            } else {
                let relation = Relation::parse(token)
                    .ok_or_else(|| Error::InvalidInput(format!("unknown relation '{token}'")))?;
                relations.push(relation);
            }
        }
        Self::new(s, node_kinds, relations)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_kinds(&self) -> &[NodeKind] {
        &self.node_kinds
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Number of hops (edges) in a matching path
    pub fn hops(&self) -> usize {
        self.relations.len()
    }
}

impl fmt::Display for MetaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.node_kinds[0])?;
        for (relation, kind) in self.relations.iter().zip(&self.node_kinds[1..]) {
            write!(f, " -{relation}-> {kind}")?;
        }
        Ok(())
    }
}

/// Result of a meta-path enumeration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaPathMatches {
    pub paths: Vec<Vec<NodeKey>>,
    /// Stopped at the match bound
    pub truncated: bool,
}

/// A terminal node scored by the summed similarity of the paths reaching it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTarget {
    pub key: NodeKey,
    pub score: f64,
    pub path_count: usize,
}

/// Enumerates schema-matching paths in a graph
#[derive(Debug, Clone, Copy)]
pub struct MetaPathWalker<'g> {
    graph: &'g ActivityGraph,
    max_matches: Option<usize>,
}

impl<'g> MetaPathWalker<'g> {
    pub fn new(graph: &'g ActivityGraph) -> Self {
        Self {
            graph,
            max_matches: None,
        }
    }

    /// Stop enumeration after `max` matches
    pub fn with_max_matches(mut self, max: usize) -> Self {
        self.max_matches = Some(max);
        self
    }

    /// Every node sequence from `start` matching `schema`
    pub fn find_paths(&self, start: &NodeKey, schema: &MetaPath) -> Vec<Vec<NodeKey>> {
        self.find_matches(start, schema).paths
    }

    /// Like [`find_paths`](Self::find_paths), also reporting truncation
    pub fn find_matches(&self, start: &NodeKey, schema: &MetaPath) -> MetaPathMatches {
        let mut matches = MetaPathMatches::default();
        let start_ok = self
            .graph
            .node(start)
            .is_some_and(|n| n.kind() == schema.node_kinds[0]);
        if !start_ok {
            return matches;
        }

        let mut current = vec![start.clone()];
        self.dfs(schema, 0, &mut current, &mut matches);
        matches
    }

    fn dfs(
        &self,
        schema: &MetaPath,
        depth: usize,
        current: &mut Vec<NodeKey>,
        matches: &mut MetaPathMatches,
    ) {
        if depth == schema.relations.len() {
            if self.max_matches.is_some_and(|max| matches.paths.len() >= max) {
                matches.truncated = true;
            } else {
                matches.paths.push(current.clone());
            }
            return;
        }

        let want_relation = schema.relations[depth];
        let want_kind = schema.node_kinds[depth + 1];
        let Some(tail) = current.last().cloned() else {
            return;
        };

        for (next, edge) in self.graph.out_edges(&tail) {
            if matches.truncated {
                return;
            }
            if edge.relation == want_relation && next.kind() == want_kind {
                current.push(next.clone());
                self.dfs(schema, depth + 1, current, matches);
                current.pop();
            }
        }
    }

    /// Product of edge weights along a path (missing weights count as 1.0)
    pub fn compute_path_sim(&self, path: &[NodeKey]) -> f64 {
        path.windows(2)
            .map(|pair| {
                self.graph
                    .edge(&pair[0], &pair[1])
                    .map_or(1.0, |e| e.weight_or(1.0))
            })
            .product()
    }

    /// Terminal nodes of matching paths, ranked by summed path similarity
    pub fn rank_targets(&self, start: &NodeKey, schema: &MetaPath) -> Vec<RankedTarget> {
        let mut scores: HashMap<NodeKey, (f64, usize)> = HashMap::new();
        let mut order = Vec::new();
        for path in self.find_paths(start, schema) {
            let sim = self.compute_path_sim(&path);
            let Some(tail) = path.last() else { continue };
            let entry = scores.entry(tail.clone()).or_insert_with(|| {
                order.push(tail.clone());
                (0.0, 0)
            });
            entry.0 += sim;
            entry.1 += 1;
        }

        let mut ranked: Vec<RankedTarget> = order
            .into_iter()
            .map(|key| {
                let (score, path_count) = scores[&key];
                RankedTarget {
                    key,
                    score,
                    path_count,
                }
            })
            .collect();
        // stable sort keeps discovery order among ties
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}
