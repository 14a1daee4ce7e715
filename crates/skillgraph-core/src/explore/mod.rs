//! Tree-search exploration of the activity graph
//!
//! The agent walks the graph with a PUCT-guided search, asks a skill oracle
//! what each visited node demonstrates, rewards the answer and writes the
//! inferred skills back into the graph as `implies` edges.

mod agent;
mod context;
mod enrich;
mod prior;
mod reward;
mod tree;

pub use agent::{ExplorationAgent, ExplorationReport};
pub use context::{ContextBundle, diff_summary};
pub use enrich::{enrich, implies_weight, richness};
pub use prior::heuristic_prior;
pub use reward::{NoveltyMemory, RewardBreakdown, RewardWeights};
pub use tree::{SearchTree, TreeNode, TreeNodeId};
