//! Process-wide limiter for oracle calls
//!
//! Bounds concurrent in-flight calls and turns any rate-limit response into
//! a cooldown that every caller sharing the gate waits out.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::debug;

use crate::error::{Error, Result};

/// Shared concurrency limit plus account-wide cooldown
#[derive(Debug, Clone)]
pub struct OracleGate {
    permits: Arc<Semaphore>,
    cooldown_until: Arc<Mutex<Option<Instant>>>,
}

impl OracleGate {
    pub fn new(max_concurrent_calls: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent_calls.max(1))),
            cooldown_until: Arc::new(Mutex::new(None)),
        }
    }

    /// Wait out any active cooldown, then take a call permit
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        while let Some(wait) = self.remaining() {
            debug!(wait_ms = wait.as_millis() as u64, "Oracle gate cooling down");
            tokio::time::sleep(wait).await;
        }
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| Error::OracleUnavailable("oracle gate closed".to_string()))
    }

    /// Push the shared deadline out to at least `now + wait`
    pub fn impose_cooldown(&self, wait: Duration) {
        let until = Instant::now() + wait;
        let mut guard = self
            .cooldown_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if guard.is_none_or(|current| current < until) {
            *guard = Some(until);
        }
    }

    /// Time left on the shared cooldown, if any
    pub fn remaining(&self) -> Option<Duration> {
        let guard = self
            .cooldown_until
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let until = (*guard)?;
        let now = Instant::now();
        (now < until).then(|| until - now)
    }

    pub fn is_cooling_down(&self) -> bool {
        self.remaining().is_some()
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for OracleGate {
    fn default() -> Self {
        Self::new(crate::config::OracleConfig::default().max_concurrent_calls)
    }
}
