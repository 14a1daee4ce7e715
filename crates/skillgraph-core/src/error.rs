//! Error types for SkillGraph

use thiserror::Error;

/// Result type alias using SkillGraph's Error
pub type Result<T> = std::result::Result<T, Error>;

/// SkillGraph error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Graph errors (E001-E099)
    #[error("Node '{0}' not found in the activity graph. Run `skillgraph inspect` to list node kinds.")]
    NodeNotFound(String),

    #[error("Invalid node key '{0}'. Expected '<kind>:<id>', e.g. 'person:octocat'.")]
    InvalidNodeKey(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Oracle / network errors (E100-E199)
    #[error("Network error: {0}. Check your internet connection.")]
    NetworkError(#[from] reqwest::Error),

    #[error("Skill oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Rate limited. Waiting {0} seconds before retry.")]
    RateLimited(u64),

    #[error("Malformed oracle response: {0}")]
    MalformedOracleResponse(String),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Generic errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound(_) => "E001",
            Self::InvalidNodeKey(_) => "E002",
            Self::InvalidInput(_) => "E003",
            Self::NetworkError(_) => "E100",
            Self::OracleUnavailable(_) => "E101",
            Self::RateLimited(_) => "E102",
            Self::MalformedOracleResponse(_) => "E103",
            Self::ConfigError(_) => "E600",
            Self::Json(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::NodeNotFound(_) => Some("skillgraph inspect --graph <file>".to_string()),
            Self::NetworkError(_) => Some("Check internet connection".to_string()),
            Self::OracleUnavailable(_) => {
                Some("Set SKILLGRAPH_API_KEY or OPENROUTER_API_KEY".to_string())
            }
            Self::ConfigError(_) => Some("skillgraph config list".to_string()),
            _ => None,
        }
    }

    /// Whether the failed operation may succeed if repeated
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}
