//! Arena-backed search tree
//!
//! Nodes are addressed by [`TreeNodeId`]; the root is always id 0 and wraps
//! no graph node. Parent and child links are indices into the arena, so the
//! ancestry chain of any node is a walk up `parent` links.

use serde::Serialize;

use crate::graph::NodeKey;

/// Index of a node in a [`SearchTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TreeNodeId(pub usize);

impl TreeNodeId {
    pub const ROOT: TreeNodeId = TreeNodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TreeNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Search statistics for one explored graph node
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    /// Graph node this search node stands for; `None` only for the root
    pub key: Option<NodeKey>,
    pub parent: Option<TreeNodeId>,
    pub children: Vec<TreeNodeId>,
    /// Actions not yet expanded; popped from the end
    #[serde(skip)]
    pub untried: Vec<NodeKey>,
    pub visits: u64,
    pub value: f64,
    pub prior: f64,
    pub depth: usize,
}

impl TreeNode {
    /// No untried actions remain
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    /// Fully expanded with no children
    pub fn is_terminal(&self) -> bool {
        self.untried.is_empty() && self.children.is_empty()
    }

    /// Mean reward so far
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value / self.visits as f64
        }
    }
}

/// Guards the exploitation term of unvisited children
const VISIT_EPSILON: f64 = 1e-6;

/// Monte-Carlo search tree over graph keys
#[derive(Debug, Clone, Serialize)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    /// Tree holding only a root seeded with `actions`
    pub fn new(actions: Vec<NodeKey>) -> Self {
        Self {
            nodes: vec![TreeNode {
                key: None,
                parent: None,
                children: Vec::new(),
                untried: actions,
                visits: 0,
                value: 0.0,
                prior: 1.0,
                depth: 0,
            }],
        }
    }

    pub fn root(&self) -> TreeNodeId {
        TreeNodeId::ROOT
    }

    /// Panics on an id from a different tree
    pub fn node(&self, id: TreeNodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_fully_expanded(&self, id: TreeNodeId) -> bool {
        self.nodes[id.0].is_fully_expanded()
    }

    /// Pop the most recently added untried action of `id`
    pub fn pop_untried(&mut self, id: TreeNodeId) -> Option<NodeKey> {
        self.nodes[id.0].untried.pop()
    }

    /// Attach a child for `key` under `parent`
    pub fn add_child(
        &mut self,
        parent: TreeNodeId,
        key: NodeKey,
        prior: f64,
        untried: Vec<NodeKey>,
    ) -> TreeNodeId {
        let id = TreeNodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes.push(TreeNode {
            key: Some(key),
            parent: Some(parent),
            children: Vec::new(),
            untried,
            visits: 0,
            value: 0.0,
            prior,
            depth,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// PUCT score of `child` relative to its parent
    pub fn puct(&self, child: TreeNodeId, exploration_constant: f64) -> f64 {
        let node = &self.nodes[child.0];
        let parent_visits = node
            .parent
            .map(|p| self.nodes[p.0].visits)
            .unwrap_or(0) as f64;

        let exploit = node.value / (node.visits as f64 + VISIT_EPSILON);
        let explore =
            exploration_constant * node.prior * parent_visits.sqrt() / (1.0 + node.visits as f64);
        exploit + explore
    }

    /// Child with the highest PUCT score; ties go to the earliest child
    pub fn best_child(&self, id: TreeNodeId, exploration_constant: f64) -> Option<TreeNodeId> {
        let mut best: Option<(TreeNodeId, f64)> = None;
        for &child in &self.nodes[id.0].children {
            let score = self.puct(child, exploration_constant);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((child, score)),
            }
        }
        best.map(|(child, _)| child)
    }

    /// Graph keys from the root's first child down to `id`, inclusive
    pub fn ancestry(&self, id: TreeNodeId) -> Vec<NodeKey> {
        let mut chain = Vec::with_capacity(self.nodes[id.0].depth);
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &self.nodes[current.0];
            if let Some(key) = &node.key {
                chain.push(key.clone());
            }
            cursor = node.parent;
        }
        chain.reverse();
        chain
    }

    /// Add one visit and `reward` to `id` and every ancestor up to the root
    pub fn backpropagate(&mut self, id: TreeNodeId, reward: f64) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &mut self.nodes[current.0];
            node.visits += 1;
            node.value += reward;
            cursor = node.parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> NodeKey {
        NodeKey::project(id)
    }

    #[test]
    fn test_new_tree_has_unvisited_root() {
        let tree = SearchTree::new(vec![key("a"), key("b")]);
        let root = tree.node(tree.root());
        assert_eq!(root.visits, 0);
        assert!(root.children.is_empty());
        assert!(!root.is_fully_expanded());
        assert!(tree.ancestry(tree.root()).is_empty());
    }

    #[test]
    fn test_pop_is_lifo() {
        let mut tree = SearchTree::new(vec![key("a"), key("b")]);
        assert_eq!(tree.pop_untried(TreeNodeId::ROOT), Some(key("b")));
        assert_eq!(tree.pop_untried(TreeNodeId::ROOT), Some(key("a")));
        assert_eq!(tree.pop_untried(TreeNodeId::ROOT), None);
        assert!(tree.node(TreeNodeId::ROOT).is_terminal());
    }

    #[test]
    fn test_ancestry_and_depth() {
        let mut tree = SearchTree::new(vec![]);
        let a = tree.add_child(TreeNodeId::ROOT, key("a"), 1.0, vec![]);
        let b = tree.add_child(a, NodeKey::change_set("c1"), 0.5, vec![]);
        assert_eq!(tree.node(b).depth, 2);
        assert_eq!(tree.ancestry(b), vec![key("a"), NodeKey::change_set("c1")]);
    }

    #[test]
    fn test_backpropagate_reaches_root() {
        let mut tree = SearchTree::new(vec![]);
        let a = tree.add_child(TreeNodeId::ROOT, key("a"), 1.0, vec![]);
        let b = tree.add_child(a, key("b"), 1.0, vec![]);
        tree.backpropagate(b, 0.5);
        tree.backpropagate(a, 0.25);

        assert_eq!(tree.node(b).visits, 1);
        assert_eq!(tree.node(a).visits, 2);
        assert_eq!(tree.node(TreeNodeId::ROOT).visits, 2);
        assert!((tree.node(TreeNodeId::ROOT).value - 0.75).abs() < 1e-12);
        assert!((tree.node(a).mean_value() - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_best_child_prefers_prior_when_unvisited() {
        let mut tree = SearchTree::new(vec![]);
        let low = tree.add_child(TreeNodeId::ROOT, key("low"), 0.5, vec![]);
        let high = tree.add_child(TreeNodeId::ROOT, key("high"), 4.0, vec![]);
        tree.backpropagate(low, 0.0);
        assert_eq!(tree.best_child(TreeNodeId::ROOT, 2f64.sqrt()), Some(high));
    }

    #[test]
    fn test_best_child_exploits_reward() {
        let mut tree = SearchTree::new(vec![]);
        let good = tree.add_child(TreeNodeId::ROOT, key("good"), 1.0, vec![]);
        let bad = tree.add_child(TreeNodeId::ROOT, key("bad"), 1.0, vec![]);
        tree.backpropagate(good, 1.0);
        tree.backpropagate(bad, 0.0);
        assert_eq!(tree.best_child(TreeNodeId::ROOT, 2f64.sqrt()), Some(good));
    }

    #[test]
    fn test_best_child_tie_takes_first() {
        let mut tree = SearchTree::new(vec![]);
        let first = tree.add_child(TreeNodeId::ROOT, key("a"), 1.0, vec![]);
        tree.add_child(TreeNodeId::ROOT, key("b"), 1.0, vec![]);
        assert_eq!(tree.best_child(TreeNodeId::ROOT, 2f64.sqrt()), Some(first));
        assert_eq!(tree.best_child(first, 2f64.sqrt()), None);
    }

    #[test]
    fn test_puct_formula() {
        let mut tree = SearchTree::new(vec![]);
        let child = tree.add_child(TreeNodeId::ROOT, key("a"), 2.0, vec![]);
        tree.backpropagate(child, 0.6);
        tree.backpropagate(TreeNodeId::ROOT, 0.0);
        tree.backpropagate(TreeNodeId::ROOT, 0.0);
        tree.backpropagate(TreeNodeId::ROOT, 0.0);
        // parent visits 4, child visits 1
        let c = 1.5;
        let expected = 0.6 / (1.0 + 1e-6) + c * 2.0 * 2.0 / 2.0;
        assert!((tree.puct(child, c) - expected).abs() < 1e-9);
    }
}
