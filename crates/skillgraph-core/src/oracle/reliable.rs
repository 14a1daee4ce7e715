//! Retrying, fail-soft wrapper around any [`SkillOracle`]

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::OracleConfig;
use crate::error::Error;
use crate::explore::ContextBundle;
use crate::graph::NodeKey;

use super::gate::OracleGate;
use super::{SkillCandidate, SkillOracle};

/// Capped exponential backoff for rate-limited calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Delay before retry `retry` (1-based), ignoring jitter
    ///
    /// `min(max, base * 2^(retry-1))`, raised to the server's suggested wait
    /// when that is longer, and still capped.
    pub fn backoff(&self, retry: u32, suggested_secs: u64) -> Duration {
        let exp = retry.saturating_sub(1).min(32);
        let computed = self.base_backoff_ms.saturating_mul(1u64 << exp);
        let suggested = suggested_secs.saturating_mul(1000);
        Duration::from_millis(computed.max(suggested).min(self.max_backoff_ms))
    }

    /// [`backoff`](Self::backoff) plus up to 10% random jitter
    pub fn backoff_with_jitter(&self, retry: u32, suggested_secs: u64) -> Duration {
        let delay = self.backoff(retry, suggested_secs);
        let spread = delay.as_millis() as u64 / 10;
        let jitter = if spread == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=spread)
        };
        delay + Duration::from_millis(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        OracleConfig::default().into()
    }
}

impl From<OracleConfig> for RetryPolicy {
    fn from(config: OracleConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff_ms: config.base_backoff_ms,
            max_backoff_ms: config.max_backoff_ms,
        }
    }
}

/// Oracle wrapper that never fails
///
/// Rate limits are retried after a backoff imposed on the shared gate, so
/// every caller slows down together. Anything else, including exhausting
/// the retry budget, degrades to an empty answer.
#[derive(Clone)]
pub struct ReliableOracle {
    inner: Arc<dyn SkillOracle>,
    gate: OracleGate,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ReliableOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReliableOracle")
            .field("inner", &self.inner.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl ReliableOracle {
    pub fn new(inner: Arc<dyn SkillOracle>, gate: OracleGate, policy: RetryPolicy) -> Self {
        Self {
            inner,
            gate,
            policy,
        }
    }

    pub fn from_config(inner: Arc<dyn SkillOracle>, gate: OracleGate, config: &OracleConfig) -> Self {
        Self::new(inner, gate, config.clone().into())
    }

    pub fn gate(&self) -> &OracleGate {
        &self.gate
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Ask the wrapped oracle, retrying rate limits; empty on any failure
    pub async fn infer(&self, context: &ContextBundle, path: &[NodeKey]) -> Vec<SkillCandidate> {
        let oracle = self.inner.name();
        let mut retries = 0u32;

        loop {
            let permit = match self.gate.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(oracle, error = %e, "Oracle gate unavailable");
                    return Vec::new();
                }
            };
            let result = self.inner.infer(context, path).await;
            drop(permit);

            match result {
                Ok(candidates) => {
                    if retries > 0 {
                        info!(oracle, retries, "Oracle recovered after retries");
                    }
                    debug!(oracle, node = %context.node, candidates = candidates.len(), "Oracle answered");
                    return candidates;
                }
                Err(Error::RateLimited(secs)) if retries < self.policy.max_retries => {
                    retries += 1;
                    let wait = self.policy.backoff_with_jitter(retries, secs);
                    warn!(
                        oracle,
                        attempt = retries,
                        max_retries = self.policy.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    self.gate.impose_cooldown(wait);
                }
                Err(Error::RateLimited(_)) => {
                    warn!(oracle, node = %context.node, "Rate limit retries exhausted, treating as no skills");
                    return Vec::new();
                }
                Err(Error::MalformedOracleResponse(msg)) => {
                    warn!(oracle, node = %context.node, error = %msg, "Malformed oracle response, treating as no skills");
                    return Vec::new();
                }
                Err(e) => {
                    error!(oracle, node = %context.node, code = e.code(), error = %e, "Oracle call failed");
                    return Vec::new();
                }
            }
        }
    }
}
