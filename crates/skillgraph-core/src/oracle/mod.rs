//! Skill-inference oracle seam
//!
//! The exploration engine asks an oracle which skills a piece of evidence
//! demonstrates. Oracles report typed errors; [`ReliableOracle`] turns those
//! into an infallible call with rate-limit backoff shared across callers
//! through an [`OracleGate`].

mod gate;
mod llm_oracle;
mod reliable;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::explore::ContextBundle;
use crate::graph::NodeKey;

pub use gate::OracleGate;
pub use llm_oracle::{LlmOracle, parse_candidates};
pub use reliable::{ReliableOracle, RetryPolicy};

/// One skill the oracle attributes to a piece of evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCandidate {
    #[serde(rename = "skill", alias = "name", alias = "skill_name")]
    pub skill_name: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(
        rename = "causal_link",
        alias = "reasoning",
        alias = "rationale",
        default
    )]
    pub rationale: String,
}

impl SkillCandidate {
    pub fn new(skill_name: impl Into<String>, confidence: f64, rationale: impl Into<String>) -> Self {
        Self {
            skill_name: skill_name.into(),
            confidence,
            rationale: rationale.into(),
        }
    }
}

/// Capability that infers skills from a context bundle
///
/// `path` is the chain of graph keys the search followed to reach the
/// evidence, root side first.
#[async_trait]
pub trait SkillOracle: Send + Sync {
    async fn infer(&self, context: &ContextBundle, path: &[NodeKey])
    -> Result<Vec<SkillCandidate>>;

    /// Name used in logs
    fn name(&self) -> &str {
        "oracle"
    }
}
