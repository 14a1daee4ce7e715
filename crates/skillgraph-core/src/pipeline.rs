//! End-to-end profiling: load, explore, evaluate, export

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::confidence::{SkillProfile, compute_profile};
use crate::error::{Error, Result};
use crate::explore::{ExplorationAgent, ExplorationReport};
use crate::graph::{self, ActivityGraph, GraphDocument, NodeKey, NodeKind};
use crate::oracle::ReliableOracle;
use crate::source::GraphSource;

/// Parse `person:<login>` or a bare login into a person key
pub fn parse_person(input: &str) -> Result<NodeKey> {
    let key = if input.contains(':') {
        input.parse::<NodeKey>()?
    } else {
        let login = input.trim();
        if login.is_empty() {
            return Err(Error::InvalidNodeKey(input.to_string()));
        }
        NodeKey::person(login)
    };
    if key.kind() != NodeKind::Person {
        return Err(Error::InvalidInput(format!("'{}' is not a person key", key)));
    }
    Ok(key)
}

/// Result of profiling one person
#[derive(Debug, Clone, Serialize)]
pub struct ProfileOutcome {
    pub profile: SkillProfile,
    pub exploration: ExplorationReport,
    /// The graph as evolved by exploration
    #[serde(skip)]
    pub graph: Arc<ActivityGraph>,
}

impl ProfileOutcome {
    /// Write `<person>_profile.json` and `<person>_graph.json` into `dir`
    pub fn write_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)?;
        let stem = file_stem(&self.profile.person);

        let profile_path = dir.join(format!("{}_profile.json", stem));
        std::fs::write(&profile_path, serde_json::to_string_pretty(&self.profile)?)?;

        let graph_path = dir.join(format!("{}_graph.json", stem));
        GraphDocument::from_graph(&self.graph).write_to(&graph_path)?;

        info!(
            profile = %profile_path.display(),
            graph = %graph_path.display(),
            "Wrote profile outputs"
        );
        Ok((profile_path, graph_path))
    }
}

fn file_stem(person: &NodeKey) -> String {
    person
        .id()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Runs the full profiling pipeline for people in one graph source
pub struct SkillProfiler {
    source: Arc<dyn GraphSource>,
    oracle: ReliableOracle,
    config: Config,
}

impl SkillProfiler {
    pub fn new(source: Arc<dyn GraphSource>, oracle: ReliableOracle, config: Config) -> Self {
        Self {
            source,
            oracle,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Profile `person` with the configured iteration budget
    pub async fn profile(&self, person: &NodeKey, cancel: &CancellationToken) -> Result<ProfileOutcome> {
        self.profile_with(person, self.config.exploration.iterations, cancel)
            .await
    }

    /// Profile `person` with an explicit iteration budget
    ///
    /// A cancelled exploration still yields a profile over whatever the
    /// completed iterations wrote into the graph.
    pub async fn profile_with(
        &self,
        person: &NodeKey,
        iterations: usize,
        cancel: &CancellationToken,
    ) -> Result<ProfileOutcome> {
        let graph = self.source.load().await?;
        if !graph.contains(person) {
            return Err(Error::NodeNotFound(person.to_string()));
        }
        info!(
            person = %person,
            source = %self.source.describe(),
            iterations,
            "Profiling"
        );

        let shared = graph::shared(graph);
        let agent = ExplorationAgent::new(
            shared.clone(),
            self.oracle.clone(),
            self.config.exploration.clone(),
        );
        let exploration = agent.run(iterations, cancel).await;

        let snapshot = graph::snapshot(&shared).await;
        let profile = compute_profile(Arc::clone(&snapshot), person, &self.config.confidence).await?;

        Ok(ProfileOutcome {
            profile,
            exploration,
            graph: snapshot,
        })
    }
}
