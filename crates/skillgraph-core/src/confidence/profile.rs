//! Per-person skill profiles

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::ConfidenceConfig;
use crate::error::{Error, Result};
use crate::graph::{ActivityGraph, NodeKey, NodeKind};

use super::calculator::{ConfidenceCalculator, SkillConfidence};

/// Skills attributed to one person, strongest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub person: NodeKey,
    pub skills: Vec<SkillConfidence>,
    pub generated_at: DateTime<Utc>,
}

impl SkillProfile {
    /// Keep results with `belief > min_belief`, sorted by descending belief
    pub fn from_results(
        person: NodeKey,
        results: impl IntoIterator<Item = SkillConfidence>,
        min_belief: f64,
    ) -> Self {
        let mut skills: Vec<SkillConfidence> = results
            .into_iter()
            .filter(|s| s.belief > min_belief)
            .collect();
        skills.sort_by(|a, b| b.belief.total_cmp(&a.belief));
        Self {
            person,
            skills,
            generated_at: Utc::now(),
        }
    }

    pub fn top(&self, n: usize) -> &[SkillConfidence] {
        &self.skills[..n.min(self.skills.len())]
    }

    /// Look up a skill by display name (normalized comparison)
    pub fn get(&self, skill_name: &str) -> Option<&SkillConfidence> {
        let key = NodeKey::skill(skill_name);
        self.skills.iter().find(|s| s.skill_key == key)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}

/// Compute a person's profile over every skill node of a snapshot
///
/// Each (person, skill) pair is evaluated on the blocking pool. Results are
/// merged in skill insertion order before filtering, so the outcome does not
/// depend on task completion order.
pub async fn compute_profile(
    snapshot: Arc<ActivityGraph>,
    person: &NodeKey,
    config: &ConfidenceConfig,
) -> Result<SkillProfile> {
    if !snapshot.contains(person) {
        return Err(Error::NodeNotFound(person.to_string()));
    }

    let skills: Vec<NodeKey> = snapshot
        .nodes_of_kind(NodeKind::Skill)
        .map(|n| n.key.clone())
        .collect();
    debug!(person = %person, skills = skills.len(), "Computing skill profile");

    let mut tasks = JoinSet::new();
    for (index, skill) in skills.into_iter().enumerate() {
        let graph = Arc::clone(&snapshot);
        let person = person.clone();
        let config = config.clone();
        tasks.spawn_blocking(move || {
            let result = ConfidenceCalculator::with_config(&graph, &config)
                .compute_skill_confidence(&person, &skill);
            (index, result)
        });
    }

    let mut ordered = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        let (index, result) =
            joined.map_err(|e| Error::Other(format!("confidence task failed: {}", e)))?;
        ordered.push((index, result?));
    }
    ordered.sort_by_key(|(index, _)| *index);

    let profile = SkillProfile::from_results(
        person.clone(),
        ordered.into_iter().map(|(_, r)| r),
        config.min_belief,
    );
    info!(
        person = %person,
        retained = profile.len(),
        min_belief = config.min_belief,
        "Skill profile ready"
    );
    Ok(profile)
}
