//! Typed node identity and attributes for the activity graph
//!
//! Nodes are addressed by a [`NodeKey`]: a kind tag plus a natural
//! identifier. The key is the only identity a node has, which keeps lookups
//! and serialization independent of where the node lives in memory.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Role of a node in the activity graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A profiled developer
    Person,
    /// A repository the person contributes to
    Project,
    /// A single commit
    ChangeSet,
    /// A file touched by a change-set
    Artifact,
    /// An inferred skill
    Skill,
}

impl NodeKind {
    /// Canonical key prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Project => "project",
            Self::ChangeSet => "changeset",
            Self::Artifact => "artifact",
            Self::Skill => "skill",
        }
    }

    /// Parse from string, accepting the data source's legacy prefixes
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "person" | "developer" | "dev" => Some(Self::Person),
            "project" | "repository" | "repo" => Some(Self::Project),
            "changeset" | "change_set" | "commit" => Some(Self::ChangeSet),
            "artifact" | "file" => Some(Self::Artifact),
            "skill" => Some(Self::Skill),
            _ => None,
        }
    }

    /// Get all node kinds
    pub fn all() -> &'static [NodeKind] {
        &[
            Self::Person,
            Self::Project,
            Self::ChangeSet,
            Self::Artifact,
            Self::Skill,
        ]
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable, typed identity of a graph node
///
/// Rendered as `<kind>:<id>`, e.g. `person:octocat` or `artifact:src/lib.rs`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeKey {
    kind: NodeKind,
    id: String,
}

impl NodeKey {
    /// Create a key from a kind and a natural identifier
    pub fn new(kind: NodeKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn person(login: impl Into<String>) -> Self {
        Self::new(NodeKind::Person, login)
    }

    pub fn project(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Project, name)
    }

    pub fn change_set(sha: impl Into<String>) -> Self {
        Self::new(NodeKind::ChangeSet, sha)
    }

    pub fn artifact(path: impl Into<String>) -> Self {
        Self::new(NodeKind::Artifact, path)
    }

    /// Key for a skill, derived from its normalized display name
    pub fn skill(name: &str) -> Self {
        Self::new(NodeKind::Skill, Self::normalize_skill_name(name))
    }

    /// Normalize a skill name for deduplication
    ///
    /// Lowercases and joins whitespace runs with `_`. Punctuation is kept so
    /// that `C++` and `C#` remain distinct skills.
    pub fn normalize_skill_name(name: &str) -> String {
        name.split_whitespace()
            .map(|part| part.to_lowercase())
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for NodeKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (prefix, id) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidNodeKey(s.to_string()))?;
        let kind = NodeKind::parse(prefix).ok_or_else(|| Error::InvalidNodeKey(s.to_string()))?;
        let key = match kind {
            NodeKind::Skill => Self::skill(id),
            _ => Self::new(kind, id),
        };
        if key.id.is_empty() {
            return Err(Error::InvalidNodeKey(s.to_string()));
        }
        Ok(key)
    }
}

impl TryFrom<String> for NodeKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<NodeKey> for String {
    fn from(key: NodeKey) -> Self {
        key.to_string()
    }
}

/// Profile attributes of a person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonAttrs {
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<DateTime<Utc>>,
}

/// Repository metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectAttrs {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_language: Option<String>,
    /// Language name to byte count
    #[serde(default)]
    pub languages: BTreeMap<String, u64>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stars: u64,
}

/// Commit metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSetAttrs {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactAttrs {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillAttrs {
    /// Display name as first reported by the oracle
    pub name: String,
}

/// Kind-specific node payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeAttrs {
    Person(PersonAttrs),
    Project(ProjectAttrs),
    ChangeSet(ChangeSetAttrs),
    Artifact(ArtifactAttrs),
    Skill(SkillAttrs),
}

impl NodeAttrs {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Person(_) => NodeKind::Person,
            Self::Project(_) => NodeKind::Project,
            Self::ChangeSet(_) => NodeKind::ChangeSet,
            Self::Artifact(_) => NodeKind::Artifact,
            Self::Skill(_) => NodeKind::Skill,
        }
    }

    /// Primary free text: commit message or project description
    pub fn primary_text(&self) -> Option<&str> {
        match self {
            Self::ChangeSet(c) => Some(c.message.as_str()),
            Self::Project(p) => p.description.as_deref(),
            Self::Person(p) => p.bio.as_deref(),
            Self::Artifact(_) | Self::Skill(_) => None,
        }
    }
}

/// A node in the activity graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub key: NodeKey,
    pub attrs: NodeAttrs,
}

impl Node {
    /// Create a node, checking that the key and payload agree on the kind
    pub fn new(key: NodeKey, attrs: NodeAttrs) -> Result<Self> {
        if key.kind() != attrs.kind() {
            return Err(Error::InvalidInput(format!(
                "node key '{}' does not match {} attributes",
                key,
                attrs.kind()
            )));
        }
        Ok(Self { key, attrs })
    }

    pub fn person(attrs: PersonAttrs) -> Self {
        Self {
            key: NodeKey::person(attrs.login.clone()),
            attrs: NodeAttrs::Person(attrs),
        }
    }

    pub fn project(attrs: ProjectAttrs) -> Self {
        Self {
            key: NodeKey::project(attrs.name.clone()),
            attrs: NodeAttrs::Project(attrs),
        }
    }

    pub fn change_set(sha: impl Into<String>, attrs: ChangeSetAttrs) -> Self {
        Self {
            key: NodeKey::change_set(sha),
            attrs: NodeAttrs::ChangeSet(attrs),
        }
    }

    pub fn artifact(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            key: NodeKey::artifact(path.clone()),
            attrs: NodeAttrs::Artifact(ArtifactAttrs { path }),
        }
    }

    pub fn skill(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: NodeKey::skill(&name),
            attrs: NodeAttrs::Skill(SkillAttrs { name }),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.key.kind()
    }

    /// Human-readable label (skill display name, login, project name, ...)
    pub fn label(&self) -> &str {
        match &self.attrs {
            NodeAttrs::Person(p) => &p.login,
            NodeAttrs::Project(p) => &p.name,
            NodeAttrs::Artifact(a) => &a.path,
            NodeAttrs::Skill(s) => &s.name,
            NodeAttrs::ChangeSet(_) => self.key.id(),
        }
    }
}
