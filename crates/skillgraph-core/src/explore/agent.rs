//! Exploration agent
//!
//! Runs a fixed budget of `select -> simulate -> backpropagate` iterations
//! over the activity graph. Each iteration is atomic with respect to
//! cancellation: the token is only checked between iterations, so a run
//! never leaves half-written enrichment or an orphaned tree node behind.

use std::collections::HashSet;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::ExplorationConfig;
use crate::graph::{ActivityGraph, NodeKey, NodeKind, SharedGraph};
use crate::oracle::{ReliableOracle, SkillCandidate};

use super::context::ContextBundle;
use super::enrich::enrich;
use super::prior::heuristic_prior;
use super::reward::{NoveltyMemory, RewardBreakdown};
use super::tree::{SearchTree, TreeNodeId};

/// Outcome of one exploration run
#[derive(Debug, Clone, Serialize)]
pub struct ExplorationReport {
    pub run_id: Uuid,
    pub iterations_completed: usize,
    pub cancelled: bool,
    /// Reward of every completed iteration, in order
    pub rewards: Vec<RewardBreakdown>,
    /// Distinct skill names reported by the oracle, in discovery order
    pub skills_discovered: Vec<String>,
    pub implies_written: usize,
    pub tree: SearchTree,
}

impl ExplorationReport {
    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().map(|r| r.total).sum()
    }
}

/// State scoped to a single run
struct ExplorationRun {
    tree: SearchTree,
    novelty: NoveltyMemory,
    discovered: Vec<String>,
    discovered_keys: HashSet<NodeKey>,
    implies_written: usize,
}

impl ExplorationRun {
    /// Fresh tree whose root is seeded with every person and project
    ///
    /// Projects come after persons, so with LIFO expansion the last project
    /// is explored first.
    fn new(graph: &ActivityGraph) -> Self {
        let actions: Vec<NodeKey> = graph
            .nodes_of_kind(NodeKind::Person)
            .chain(graph.nodes_of_kind(NodeKind::Project))
            .map(|n| n.key.clone())
            .collect();

        Self {
            tree: SearchTree::new(actions),
            novelty: NoveltyMemory::new(),
            discovered: Vec::new(),
            discovered_keys: HashSet::new(),
            implies_written: 0,
        }
    }

    fn record_discoveries(&mut self, candidates: &[SkillCandidate]) {
        for candidate in candidates {
            if self.discovered_keys.insert(NodeKey::skill(&candidate.skill_name)) {
                self.discovered.push(candidate.skill_name.clone());
            }
        }
    }
}

/// Drives tree search over a shared graph using a skill oracle
pub struct ExplorationAgent {
    graph: SharedGraph,
    oracle: ReliableOracle,
    config: ExplorationConfig,
}

impl ExplorationAgent {
    pub fn new(graph: SharedGraph, oracle: ReliableOracle, config: ExplorationConfig) -> Self {
        Self {
            graph,
            oracle,
            config,
        }
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn config(&self) -> &ExplorationConfig {
        &self.config
    }

    /// Run `iterations` search iterations, or fewer if `cancel` fires
    pub async fn run(&self, iterations: usize, cancel: &CancellationToken) -> ExplorationReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("exploration", %run_id);
        self.run_inner(run_id, iterations, cancel)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        iterations: usize,
        cancel: &CancellationToken,
    ) -> ExplorationReport {
        let mut run = {
            let graph = self.graph.read().await;
            ExplorationRun::new(&graph)
        };
        info!(
            iterations,
            root_actions = run.tree.node(run.tree.root()).untried.len(),
            oracle = self.oracle.name(),
            "Starting exploration"
        );

        let mut rewards = Vec::with_capacity(iterations);
        let mut cancelled = false;

        for iteration in 0..iterations {
            if cancel.is_cancelled() {
                warn!(iteration, "Exploration cancelled");
                cancelled = true;
                break;
            }

            let leaf = {
                let graph = self.graph.read().await;
                self.select(&mut run.tree, &graph)
            };
            let reward = self.simulate(&mut run, leaf).await;
            run.tree.backpropagate(leaf, reward.total);

            let leaf_node = run.tree.node(leaf);
            let label = leaf_node
                .key
                .as_ref()
                .map_or_else(|| "root".to_string(), ToString::to_string);
            info!(
                iteration = iteration + 1,
                node = %label,
                depth = leaf_node.depth,
                accuracy = reward.accuracy,
                efficiency = reward.efficiency,
                diversity = reward.diversity,
                reward = reward.total,
                "Iteration complete"
            );
            rewards.push(reward);
        }

        info!(
            iterations_completed = rewards.len(),
            skills = run.discovered.len(),
            implies_written = run.implies_written,
            tree_size = run.tree.len(),
            "Exploration finished"
        );

        ExplorationReport {
            run_id,
            iterations_completed: rewards.len(),
            cancelled,
            rewards,
            skills_discovered: run.discovered,
            implies_written: run.implies_written,
            tree: run.tree,
        }
    }

    /// Descend from the root to the node to simulate
    ///
    /// Expands the first node with untried actions it meets and returns the
    /// new child. A node with no actions and no children is returned as a
    /// terminal leaf.
    fn select(&self, tree: &mut SearchTree, graph: &ActivityGraph) -> TreeNodeId {
        let mut current = tree.root();
        loop {
            if !tree.is_fully_expanded(current) {
                if let Some(child) = self.expand(tree, graph, current) {
                    return child;
                }
                continue;
            }
            match tree.best_child(current, self.config.exploration_constant) {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Pop the last untried action of `id` and attach it as a child
    ///
    /// Returns `None` if the action no longer names a graph node; it is
    /// discarded in that case.
    fn expand(&self, tree: &mut SearchTree, graph: &ActivityGraph, id: TreeNodeId) -> Option<TreeNodeId> {
        let key = tree.pop_untried(id)?;
        let Some(node) = graph.node(&key) else {
            warn!(node = %key, "Dropping action for missing graph node");
            return None;
        };

        let prior = heuristic_prior(node, &self.config.preferred_languages);

        // Skill nodes are enrichment targets, never evidence to simulate
        let mut ancestry = tree.ancestry(id);
        ancestry.push(key.clone());
        let untried: Vec<NodeKey> = graph
            .successors(&key)
            .filter(|s| s.kind() != NodeKind::Skill && !ancestry.contains(s))
            .cloned()
            .collect();

        debug!(node = %key, prior, actions = untried.len(), "Expanded node");
        Some(tree.add_child(id, key, prior, untried))
    }

    /// Ask the oracle about `leaf`, score the answer and enrich the graph
    async fn simulate(&self, run: &mut ExplorationRun, leaf: TreeNodeId) -> RewardBreakdown {
        let Some(key) = run.tree.node(leaf).key.clone() else {
            return RewardBreakdown::zero();
        };
        let depth = run.tree.node(leaf).depth;
        let path = run.tree.ancestry(leaf);

        // Read guard is released before the oracle call
        let context = {
            let graph = self.graph.read().await;
            ContextBundle::from_graph(&graph, &key, self.config.diff_excerpt_chars)
        };
        let Some(context) = context else {
            warn!(node = %key, "Simulated node vanished from the graph");
            return RewardBreakdown::zero();
        };

        let candidates = self.oracle.infer(&context, &path).await;
        if candidates.is_empty() {
            debug!(node = %key, "Oracle found no skills");
            return RewardBreakdown::zero();
        }

        let reward = RewardBreakdown::score(
            &candidates,
            depth,
            &mut run.novelty,
            &self.config.reward_weights,
        );
        run.record_discoveries(&candidates);

        let mut graph = self.graph.write().await;
        match enrich(&mut graph, &key, &candidates) {
            Ok(written) => run.implies_written += written,
            Err(e) => error!(node = %key, error = %e, "Failed to enrich graph"),
        }

        reward
    }
}
