//! SkillGraph Core Library
//!
//! This crate provides the core functionality for SkillGraph, including:
//! - Typed activity graph (people, projects, change-sets, artifacts, skills)
//! - Typed-path (meta-path) matching
//! - Tree-search exploration with an LLM skill oracle
//! - Evidential (Josang/Yager) confidence fusion over graph paths
//! - LLM integration (OpenRouter API)
//! - TOML configuration

pub mod confidence;
pub mod config;
pub mod error;
pub mod explore;
pub mod graph;
pub mod llm;
pub mod metapath;
pub mod oracle;
pub mod pipeline;
pub mod source;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::confidence::{ConfidenceCalculator, SkillConfidence, SkillProfile};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::explore::{ExplorationAgent, ExplorationReport};
    pub use crate::graph::{ActivityGraph, Edge, Node, NodeKey, NodeKind, Relation, SharedGraph};
    pub use crate::metapath::{MetaPath, MetaPathWalker};
    pub use crate::oracle::{LlmOracle, OracleGate, ReliableOracle, SkillCandidate, SkillOracle};
    pub use crate::pipeline::{ProfileOutcome, SkillProfiler};
    pub use crate::source::{GraphSource, JsonFileSource};
}
