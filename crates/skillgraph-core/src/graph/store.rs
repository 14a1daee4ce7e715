//! In-memory directed activity graph
//!
//! Nodes and their outgoing edges are kept in insertion order so that
//! successor iteration, and therefore search behaviour, is deterministic.
//! There is at most one edge per ordered `(source, target)` pair; adding a
//! second one overwrites the first.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::{Error, Result};

use super::edge::{Edge, Relation};
use super::node::{Node, NodeKey, NodeKind};

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    out: Vec<(usize, Edge)>,
    incoming: Vec<usize>,
}

/// Outcome of a bounded path enumeration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathSearch {
    pub paths: Vec<Vec<NodeKey>>,
    /// Enumeration stopped at the path cap before exhausting the graph
    pub truncated: bool,
}

/// Typed activity graph
#[derive(Debug, Clone, Default)]
pub struct ActivityGraph {
    slots: Vec<Slot>,
    index: HashMap<NodeKey, usize>,
    edge_count: usize,
}

impl ActivityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or replace the attributes of an existing one
    ///
    /// Returns `true` if the node was newly inserted.
    pub fn add_node(&mut self, node: Node) -> bool {
        if let Some(&i) = self.index.get(&node.key) {
            self.slots[i].node.attrs = node.attrs;
            return false;
        }
        let i = self.slots.len();
        self.index.insert(node.key.clone(), i);
        self.slots.push(Slot {
            node,
            out: Vec::new(),
            incoming: Vec::new(),
        });
        true
    }

    /// Get or create the skill node for a display name
    ///
    /// Skills are deduplicated by their normalized key; the first display
    /// name seen is kept.
    pub fn ensure_skill(&mut self, name: &str) -> NodeKey {
        let key = NodeKey::skill(name);
        if !self.index.contains_key(&key) {
            debug!(skill = %key, "Creating skill node");
            self.add_node(Node::skill(name.trim()));
        }
        key
    }

    /// Add or overwrite the edge `source -> target`
    pub fn add_edge(&mut self, source: &NodeKey, target: &NodeKey, edge: Edge) -> Result<()> {
        let s = self.require(source)?;
        let t = self.require(target)?;

        if let Some(slot) = self.slots[s].out.iter_mut().find(|(dst, _)| *dst == t) {
            slot.1 = edge;
            return Ok(());
        }
        self.slots[s].out.push((t, edge));
        self.slots[t].incoming.push(s);
        self.edge_count += 1;
        Ok(())
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn node(&self, key: &NodeKey) -> Option<&Node> {
        self.index.get(key).map(|&i| &self.slots[i].node)
    }

    /// Edge payload for `source -> target`, if present
    pub fn edge(&self, source: &NodeKey, target: &NodeKey) -> Option<&Edge> {
        let s = *self.index.get(source)?;
        let t = *self.index.get(target)?;
        self.slots[s]
            .out
            .iter()
            .find(|(dst, _)| *dst == t)
            .map(|(_, e)| e)
    }

    /// Outgoing edges in insertion order (empty for unknown keys)
    pub fn out_edges<'a>(
        &'a self,
        key: &NodeKey,
    ) -> impl Iterator<Item = (&'a NodeKey, &'a Edge)> + 'a {
        self.index.get(key).into_iter().flat_map(move |&i| {
            self.slots[i]
                .out
                .iter()
                .map(move |(t, e)| (&self.slots[*t].node.key, e))
        })
    }

    /// Incoming edges in insertion order (empty for unknown keys)
    pub fn in_edges<'a>(
        &'a self,
        key: &NodeKey,
    ) -> impl Iterator<Item = (&'a NodeKey, &'a Edge)> + 'a {
        self.index.get(key).into_iter().flat_map(move |&t| {
            self.slots[t].incoming.iter().filter_map(move |&s| {
                self.slots[s]
                    .out
                    .iter()
                    .find(|(dst, _)| *dst == t)
                    .map(|(_, e)| (&self.slots[s].node.key, e))
            })
        })
    }

    pub fn successors<'a>(&'a self, key: &NodeKey) -> impl Iterator<Item = &'a NodeKey> + 'a {
        self.out_edges(key).map(|(k, _)| k)
    }

    /// Sum of outgoing edge weights, optionally restricted to one relation
    pub fn outgoing_weight(&self, key: &NodeKey, relation: Option<Relation>, missing: f64) -> f64 {
        self.out_edges(key)
            .filter(|(_, e)| relation.is_none_or(|r| e.relation == r))
            .map(|(_, e)| e.weight_or(missing))
            .sum()
    }

    /// Sum of incoming edge weights from anywhere in the graph
    pub fn incoming_weight(&self, key: &NodeKey, missing: f64) -> f64 {
        self.in_edges(key).map(|(_, e)| e.weight_or(missing)).sum()
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().map(|s| &s.node)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes().filter(move |n| n.kind() == kind)
    }

    /// All edges as `(source, target, edge)` in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&NodeKey, &NodeKey, &Edge)> {
        self.slots.iter().flat_map(move |slot| {
            slot.out
                .iter()
                .map(move |(t, e)| (&slot.node.key, &self.slots[*t].node.key, e))
        })
    }

    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn count_by_kind(&self) -> BTreeMap<NodeKind, usize> {
        let mut counts = BTreeMap::new();
        for node in self.nodes() {
            *counts.entry(node.kind()).or_default() += 1;
        }
        counts
    }

    pub fn count_by_relation(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for (_, _, edge) in self.edges() {
            *counts.entry(edge.relation.as_str()).or_default() += 1;
        }
        counts
    }

    /// Enumerate simple paths `source -> target` of at most `max_hops` edges
    ///
    /// Paths come out in depth-first order following successor insertion
    /// order. When `max_paths` is set, enumeration stops once that many paths
    /// have been collected and the result is marked truncated.
    pub fn simple_paths(
        &self,
        source: &NodeKey,
        target: &NodeKey,
        max_hops: usize,
        max_paths: Option<usize>,
    ) -> Result<PathSearch> {
        let s = self.require(source)?;
        let t = self.require(target)?;

        let mut search = PathSearch::default();
        if s == t || max_hops == 0 {
            return Ok(search);
        }

        let mut on_path = vec![false; self.slots.len()];
        let mut stack = vec![s];
        on_path[s] = true;
        self.walk_simple(t, max_hops, max_paths, &mut stack, &mut on_path, &mut search);

        Ok(search)
    }

    fn walk_simple(
        &self,
        target: usize,
        max_hops: usize,
        max_paths: Option<usize>,
        stack: &mut Vec<usize>,
        on_path: &mut [bool],
        search: &mut PathSearch,
    ) {
        let Some(&current) = stack.last() else {
            return;
        };
        for (next, _) in &self.slots[current].out {
            if search.truncated {
                return;
            }
            let next = *next;
            if on_path[next] {
                continue;
            }
            if next == target {
                if max_paths.is_some_and(|cap| search.paths.len() >= cap) {
                    search.truncated = true;
                    return;
                }
                let mut path: Vec<NodeKey> = stack
                    .iter()
                    .map(|&i| self.slots[i].node.key.clone())
                    .collect();
                path.push(self.slots[target].node.key.clone());
                search.paths.push(path);
                continue;
            }
            // stack.len() == edges so far + 1
            if stack.len() < max_hops {
                stack.push(next);
                on_path[next] = true;
                self.walk_simple(target, max_hops, max_paths, stack, on_path, search);
                on_path[next] = false;
                stack.pop();
            }
        }
    }

    fn require(&self, key: &NodeKey) -> Result<usize> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| Error::NodeNotFound(key.to_string()))
    }
}
