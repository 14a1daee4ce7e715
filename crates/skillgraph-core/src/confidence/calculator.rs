//! Path-based evidential confidence for a (person, skill) pair

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ConfidenceConfig;
use crate::error::{Error, Result};
use crate::graph::{ActivityGraph, NodeKey, NodeKind};

use super::opinion::Opinion;

/// Label of the fusion model used for every result
pub const MODEL_TAG: &str = "Josang-Yager-Hybrid";

/// Upper bound on the seed belief derived from person visibility
const MAX_SEED_BELIEF: f64 = 0.95;

/// Visibility that maps to a seed belief of 1.0 before the cap
const VISIBILITY_SCALE: f64 = 100.0;

/// Default weight for a path edge the data source left unweighted
const MISSING_PATH_WEIGHT: f64 = 0.5;

/// Fused confidence that a person holds a skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillConfidence {
    pub skill_key: NodeKey,
    pub skill_name: String,
    /// Lower bound on "supports"
    pub belief: f64,
    /// Upper bound on "supports"
    pub plausibility: f64,
    pub uncertainty: f64,
    pub path_count: usize,
    pub model_tag: String,
    /// Path enumeration hit the configured cap
    #[serde(default)]
    pub truncated: bool,
}

impl SkillConfidence {
    /// Result for a pair with no connecting path
    pub fn no_evidence(skill_key: NodeKey, skill_name: impl Into<String>) -> Self {
        Self {
            skill_key,
            skill_name: skill_name.into(),
            belief: 0.0,
            plausibility: 0.0,
            uncertainty: 1.0,
            path_count: 0,
            model_tag: MODEL_TAG.to_string(),
            truncated: false,
        }
    }

    fn from_opinion(
        skill_key: NodeKey,
        skill_name: String,
        fused: &Opinion,
        path_count: usize,
        truncated: bool,
    ) -> Self {
        Self {
            skill_key,
            skill_name,
            belief: fused.belief(),
            plausibility: fused.plausibility(),
            uncertainty: fused.uncertain(),
            path_count,
            model_tag: MODEL_TAG.to_string(),
            truncated,
        }
    }
}

/// Computes skill confidence over a read-only graph
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceCalculator<'g> {
    graph: &'g ActivityGraph,
    max_hops: usize,
    max_paths: Option<usize>,
}

impl<'g> ConfidenceCalculator<'g> {
    /// Unbounded calculator with the default hop limit
    pub fn new(graph: &'g ActivityGraph) -> Self {
        Self {
            graph,
            max_hops: ConfidenceConfig::default().max_hops,
            max_paths: None,
        }
    }

    pub fn with_config(graph: &'g ActivityGraph, config: &ConfidenceConfig) -> Self {
        Self {
            graph,
            max_hops: config.max_hops,
            max_paths: config.path_cap(),
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    pub fn with_max_paths(mut self, max_paths: Option<usize>) -> Self {
        self.max_paths = max_paths;
        self
    }

    /// Fuse the evidence of every simple path `person -> skill`
    ///
    /// Each path seeds an opinion from the person's visibility, discounts it
    /// through every edge, then penalizes generic (widely implied) skills.
    /// Per-path opinions are fused left to right with Yager's rule.
    pub fn compute_skill_confidence(
        &self,
        person: &NodeKey,
        skill: &NodeKey,
    ) -> Result<SkillConfidence> {
        let skill_node = self
            .graph
            .node(skill)
            .ok_or_else(|| Error::NodeNotFound(skill.to_string()))?;
        let skill_name = skill_node.label().to_string();

        let search = self
            .graph
            .simple_paths(person, skill, self.max_hops, self.max_paths)?;
        if search.paths.is_empty() {
            return Ok(SkillConfidence::no_evidence(skill.clone(), skill_name));
        }
        if search.truncated {
            warn!(
                person = %person,
                skill = %skill,
                cap = ?self.max_paths,
                "Path enumeration capped; fusing the paths found so far"
            );
        }

        let seed = self.seed_opinion(person);
        let penalty = self.genericness_penalty(skill);

        let mut opinions = search.paths.iter().map(|path| {
            path.windows(2)
                .fold(seed, |acc, pair| {
                    let w = self
                        .graph
                        .edge(&pair[0], &pair[1])
                        .map_or(MISSING_PATH_WEIGHT, |e| e.weight_or(MISSING_PATH_WEIGHT));
                    Opinion::discount(&acc, &Opinion::from_weight(w))
                })
                .penalize_support(penalty)
        });

        let Some(first) = opinions.next() else {
            return Ok(SkillConfidence::no_evidence(skill.clone(), skill_name));
        };
        let fused = opinions.fold(first, |acc, m| Opinion::combine(&acc, &m));

        debug!(
            person = %person,
            skill = %skill,
            paths = search.paths.len(),
            belief = fused.belief(),
            "Fused skill evidence"
        );

        Ok(SkillConfidence::from_opinion(
            skill.clone(),
            skill_name,
            &fused,
            search.paths.len(),
            search.truncated,
        ))
    }

    /// Confidence for every skill node in the graph, in insertion order
    pub fn compute_all(&self, person: &NodeKey) -> Result<Vec<SkillConfidence>> {
        if !self.graph.contains(person) {
            return Err(Error::NodeNotFound(person.to_string()));
        }
        self.graph
            .nodes_of_kind(NodeKind::Skill)
            .map(|skill| self.compute_skill_confidence(person, &skill.key))
            .collect()
    }

    /// Seed belief from the person's total outgoing weight
    fn seed_opinion(&self, person: &NodeKey) -> Opinion {
        let visibility = self.graph.outgoing_weight(person, None, 1.0);
        let b = (visibility / VISIBILITY_SCALE).min(MAX_SEED_BELIEF);
        Opinion::new(b, 0.0, 1.0 - b)
    }

    /// `1 / (1 + ln(1 + popularity))` where popularity is the total weight
    /// pointing into the skill
    fn genericness_penalty(&self, skill: &NodeKey) -> f64 {
        let popularity = self.graph.incoming_weight(skill, 1.0);
        1.0 / (1.0 + popularity.ln_1p())
    }
}
