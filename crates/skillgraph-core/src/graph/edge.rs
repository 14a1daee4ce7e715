//! Typed, weighted edges of the activity graph

use serde::{Deserialize, Serialize};

/// Relation carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Person contributes to project
    Contributes,
    /// Project contains change-set
    Contains,
    /// Change-set modifies artifact
    Modifies,
    /// Evidence node implies skill (written by exploration)
    Implies,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contributes => "contributes",
            Self::Contains => "contains",
            Self::Modifies => "modifies",
            Self::Implies => "implies",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "contributes" => Some(Self::Contributes),
            "contains" => Some(Self::Contains),
            "modifies" => Some(Self::Modifies),
            "implies" => Some(Self::Implies),
            _ => None,
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge payload
///
/// The weight is optional at rest: a data source may add `modifies` edges
/// before term weighting has produced a relevance score. Each consumer picks
/// its own default via [`Edge::weight_or`]. Present weights are always
/// within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
    /// Raw change content (`modifies` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    /// Oracle rationale (`implies` only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl Edge {
    /// Create an edge without a weight
    pub fn new(relation: Relation) -> Self {
        Self {
            relation,
            weight: None,
            patch: None,
            rationale: None,
        }
    }

    pub fn contributes(weight: f64) -> Self {
        Self::new(Relation::Contributes).with_weight(weight)
    }

    pub fn contains(weight: f64) -> Self {
        Self::new(Relation::Contains).with_weight(weight)
    }

    pub fn modifies(weight: Option<f64>, patch: impl Into<String>) -> Self {
        let mut edge = Self::new(Relation::Modifies);
        edge.set_weight(weight);
        edge.patch = Some(patch.into());
        edge
    }

    pub fn implies(weight: f64, rationale: impl Into<String>) -> Self {
        let mut edge = Self::new(Relation::Implies).with_weight(weight);
        edge.rationale = Some(rationale.into());
        edge
    }

    /// Set the weight (clamped to 0.0-1.0)
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.set_weight(Some(weight));
        self
    }

    pub fn set_weight(&mut self, weight: Option<f64>) {
        self.weight = weight.map(clamp_unit);
    }

    pub fn weight(&self) -> Option<f64> {
        self.weight
    }

    /// Weight, or `default` when the data source left it unset
    pub fn weight_or(&self, default: f64) -> f64 {
        self.weight.unwrap_or(default)
    }
}

fn clamp_unit(w: f64) -> f64 {
    if w.is_nan() { 0.0 } else { w.clamp(0.0, 1.0) }
}
