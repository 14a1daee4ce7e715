//! Composite reward shaping for simulated nodes
//!
//! A simulation is scored on three axes:
//!
//! - accuracy: the strongest confidence the oracle reported
//! - efficiency: `1 / depth²`, so shallow evidence is preferred
//! - diversity: the share of reported skills not yet seen in this run
//!
//! and the total is their weighted sum.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::graph::NodeKey;
use crate::oracle::SkillCandidate;

/// Weights of the three reward components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub accuracy: f64,
    pub efficiency: f64,
    pub diversity: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.6,
            efficiency: 0.2,
            diversity: 0.2,
        }
    }
}

/// Per-component reward of one simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RewardBreakdown {
    pub accuracy: f64,
    pub efficiency: f64,
    pub diversity: f64,
    pub total: f64,
}

impl RewardBreakdown {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Score an oracle answer for a node at `depth`
    ///
    /// Every reported skill is recorded in `novelty` after counting, so a
    /// skill repeated later in the run no longer counts as novel. An empty
    /// answer scores zero and leaves the memory untouched.
    pub fn score(
        candidates: &[SkillCandidate],
        depth: usize,
        novelty: &mut NoveltyMemory,
        weights: &RewardWeights,
    ) -> Self {
        if candidates.is_empty() {
            return Self::zero();
        }

        let accuracy = candidates
            .iter()
            .map(|c| c.confidence)
            .fold(0.0_f64, f64::max);

        let efficiency = if depth > 0 {
            1.0 / (depth * depth) as f64
        } else {
            1.0
        };

        let novel = candidates
            .iter()
            .filter(|c| !novelty.contains(&c.skill_name))
            .count();
        let diversity = novel as f64 / candidates.len() as f64;
        for c in candidates {
            novelty.insert(&c.skill_name);
        }

        let total = weights.accuracy * accuracy
            + weights.efficiency * efficiency
            + weights.diversity * diversity;

        Self {
            accuracy,
            efficiency,
            diversity,
            total,
        }
    }
}

/// Skill names already rewarded for novelty in the current run
///
/// Names are compared by their normalized skill key.
#[derive(Debug, Clone, Default)]
pub struct NoveltyMemory {
    seen: HashSet<String>,
}

impl NoveltyMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, skill_name: &str) -> bool {
        self.seen
            .contains(&NodeKey::normalize_skill_name(skill_name))
    }

    /// Returns `true` if the name was not yet known
    pub fn insert(&mut self, skill_name: &str) -> bool {
        self.seen.insert(NodeKey::normalize_skill_name(skill_name))
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
