//! Scripted oracle for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::Result;
use crate::explore::ContextBundle;
use crate::graph::{NodeKey, NodeKind};

use super::{SkillCandidate, SkillOracle};

/// Replays a fixed list of answers, then answers with the fallback
pub(crate) struct ScriptedOracle {
    script: Mutex<VecDeque<Result<Vec<SkillCandidate>>>>,
    fallback: Vec<SkillCandidate>,
    calls: AtomicUsize,
    paths: Mutex<Vec<Vec<NodeKey>>>,
    kinds: Mutex<Vec<NodeKind>>,
}

impl ScriptedOracle {
    pub(crate) fn new(script: Vec<Result<Vec<SkillCandidate>>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Vec::new(),
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
            kinds: Mutex::new(Vec::new()),
        }
    }

    /// Gives the same answer to every call
    pub(crate) fn repeating(answer: Vec<SkillCandidate>) -> Self {
        Self {
            fallback: answer,
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Reasoning paths received, in call order
    pub(crate) fn paths(&self) -> Vec<Vec<NodeKey>> {
        self.paths.lock().unwrap().clone()
    }

    /// Kinds of the simulated nodes, in call order
    pub(crate) fn kinds(&self) -> Vec<NodeKind> {
        self.kinds.lock().unwrap().clone()
    }
}

#[async_trait]
impl SkillOracle for ScriptedOracle {
    async fn infer(
        &self,
        context: &ContextBundle,
        path: &[NodeKey],
    ) -> Result<Vec<SkillCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(path.to_vec());
        self.kinds.lock().unwrap().push(context.kind);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
