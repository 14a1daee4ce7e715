//! Graph enrichment from oracle answers

use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::{ActivityGraph, Edge, NodeKey, NodeKind, Relation};
use crate::oracle::SkillCandidate;

const MIN_RICHNESS: f64 = 0.5;
const MAX_RICHNESS: f64 = 2.0;
const SPARSE_RICHNESS: f64 = 0.1;
const MAX_IMPLIES_WEIGHT: f64 = 0.99;

/// Evidential strength of a node from the relevance of what it modified
///
/// Nodes with almost no modification weight, such as merge commits, are
/// treated as moderately reliable rather than worthless.
pub fn richness(graph: &ActivityGraph, key: &NodeKey) -> f64 {
    let total = graph.outgoing_weight(key, Some(Relation::Modifies), 0.0);
    let total = if total < SPARSE_RICHNESS {
        MIN_RICHNESS
    } else {
        total
    };
    total.clamp(MIN_RICHNESS, MAX_RICHNESS)
}

/// Weight written on an `implies` edge for a raw oracle confidence
pub fn implies_weight(confidence: f64, richness: f64) -> f64 {
    (confidence * richness).min(MAX_IMPLIES_WEIGHT)
}

/// Write one `implies` edge per candidate from `source` to its skill node
///
/// Must run under a single write guard so that the richness read and the
/// edge writes see the same edge set. Returns the number of edges written.
/// Skill nodes cannot be a source of evidence.
pub fn enrich(graph: &mut ActivityGraph, source: &NodeKey, candidates: &[SkillCandidate]) -> Result<usize> {
    if source.kind() == NodeKind::Skill {
        return Err(Error::InvalidInput(format!(
            "cannot write implies edges out of skill node '{}'",
            source
        )));
    }
    if candidates.is_empty() {
        return Ok(0);
    }

    let factor = richness(graph, source);
    let mut written = 0;
    for candidate in candidates {
        let skill = graph.ensure_skill(&candidate.skill_name);
        let weight = implies_weight(candidate.confidence, factor);
        graph.add_edge(source, &skill, Edge::implies(weight, candidate.rationale.clone()))?;
        written += 1;
        debug!(
            source = %source,
            skill = %skill,
            weight,
            "Wrote implies edge"
        );
    }
    Ok(written)
}
