//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::explore::RewardWeights;

/// SkillGraph configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub oracle: OracleConfig,
    pub exploration: ExplorationConfig,
    pub confidence: ConfidenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    #[serde(skip)]
    pub api_key: Option<String>,
    pub default_model: String,
    /// OpenAI-compatible endpoint root
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: usize,
    pub timeout_secs: u64,
}

/// Limits applied to every skill-oracle call of a process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Concurrent in-flight oracle calls
    pub max_concurrent_calls: usize,
    /// Retries after a rate-limit response before giving up
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Fixed search budget per run
    pub iterations: usize,
    /// PUCT exploration constant
    pub exploration_constant: f64,
    pub reward_weights: RewardWeights,
    /// Languages that earn a project the preferred-language prior bonus
    pub preferred_languages: Vec<String>,
    /// Characters of each patch quoted in a change-set's diff excerpt
    pub diff_excerpt_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub max_hops: usize,
    /// Cap on enumerated paths per (person, skill) pair; 0 disables the cap
    pub max_paths: usize,
    /// Profile entries need a belief strictly above this
    pub min_belief: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: "google/gemini-2.5-flash".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 4,
            max_retries: 3,
            base_backoff_ms: 1000,
            max_backoff_ms: 60_000,
        }
    }
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            exploration_constant: std::f64::consts::SQRT_2,
            reward_weights: RewardWeights::default(),
            preferred_languages: vec![
                "Python".to_string(),
                "Jupyter Notebook".to_string(),
                "Java".to_string(),
            ],
            diff_excerpt_chars: 200,
        }
    }
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            max_hops: 5,
            max_paths: 10_000,
            min_belief: 0.05,
        }
    }
}

impl ConfidenceConfig {
    pub fn path_cap(&self) -> Option<usize> {
        (self.max_paths > 0).then_some(self.max_paths)
    }
}

impl LlmConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;

        Ok(env::var("SKILLGRAPH_API_KEY")
            .or_else(|_| env::var("OPENROUTER_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty()))
    }

    pub fn redacted_api_key(&self) -> anyhow::Result<Option<String>> {
        self.resolved_api_key().map(|opt| {
            opt.map(|key| {
                let chars: Vec<char> = key.chars().collect();
                if chars.len() <= 4 {
                    "***".to_string()
                } else {
                    let suffix: String = chars[chars.len() - 4..].iter().collect();
                    format!("***{}", suffix)
                }
            })
        })
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "LLM API keys must be provided via environment variables, not stored in configuration"
            ));
        }
        Ok(())
    }
}

const KEYS: &[&str] = &[
    "llm.default_model",
    "llm.base_url",
    "llm.temperature",
    "llm.max_tokens",
    "llm.timeout_secs",
    "llm.api_key",
    "oracle.max_concurrent_calls",
    "oracle.max_retries",
    "oracle.base_backoff_ms",
    "oracle.max_backoff_ms",
    "exploration.iterations",
    "exploration.exploration_constant",
    "exploration.reward_weights.accuracy",
    "exploration.reward_weights.efficiency",
    "exploration.reward_weights.diversity",
    "exploration.preferred_languages",
    "exploration.diff_excerpt_chars",
    "confidence.max_hops",
    "confidence.max_paths",
    "confidence.min_belief",
];

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("SKILLGRAPH_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("skillgraph")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).with_context(|| {
                format!("Failed to create config directory: {}", dir.display())
            })?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.llm.enforce_env_only()?;

        if self.oracle.max_concurrent_calls == 0 {
            return Err(anyhow!("oracle.max_concurrent_calls must be at least 1"));
        }
        if self.oracle.base_backoff_ms > self.oracle.max_backoff_ms {
            return Err(anyhow!(
                "oracle.base_backoff_ms must not exceed oracle.max_backoff_ms"
            ));
        }
        let w = &self.exploration.reward_weights;
        if [w.accuracy, w.efficiency, w.diversity]
            .iter()
            .any(|v| !(0.0..=1.0).contains(v))
        {
            return Err(anyhow!("Reward weights must be between 0.0 and 1.0"));
        }
        if !(0.0..=1.0).contains(&self.confidence.min_belief) {
            return Err(anyhow!("confidence.min_belief must be between 0.0 and 1.0"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // LLM settings
            "llm.default_model" => Ok(self.llm.default_model.clone()),
            "llm.base_url" => Ok(self.llm.base_url.clone()),
            "llm.temperature" => Ok(self.llm.temperature.to_string()),
            "llm.max_tokens" => Ok(self.llm.max_tokens.to_string()),
            "llm.timeout_secs" => Ok(self.llm.timeout_secs.to_string()),

            // Oracle limits
            "oracle.max_concurrent_calls" => Ok(self.oracle.max_concurrent_calls.to_string()),
            "oracle.max_retries" => Ok(self.oracle.max_retries.to_string()),
            "oracle.base_backoff_ms" => Ok(self.oracle.base_backoff_ms.to_string()),
            "oracle.max_backoff_ms" => Ok(self.oracle.max_backoff_ms.to_string()),

            // Exploration settings
            "exploration.iterations" => Ok(self.exploration.iterations.to_string()),
            "exploration.exploration_constant" => {
                Ok(self.exploration.exploration_constant.to_string())
            }
            "exploration.reward_weights.accuracy" => {
                Ok(self.exploration.reward_weights.accuracy.to_string())
            }
            "exploration.reward_weights.efficiency" => {
                Ok(self.exploration.reward_weights.efficiency.to_string())
            }
            "exploration.reward_weights.diversity" => {
                Ok(self.exploration.reward_weights.diversity.to_string())
            }
            "exploration.preferred_languages" => {
                Ok(self.exploration.preferred_languages.join(", "))
            }
            "exploration.diff_excerpt_chars" => {
                Ok(self.exploration.diff_excerpt_chars.to_string())
            }

            // Confidence settings
            "confidence.max_hops" => Ok(self.confidence.max_hops.to_string()),
            "confidence.max_paths" => Ok(self
                .confidence
                .path_cap()
                .map_or_else(|| "none".to_string(), |n| n.to_string())),
            "confidence.min_belief" => Ok(self.confidence.min_belief.to_string()),

            // API key (special handling - show redacted)
            "llm.api_key" | "api_key" => match self.llm.redacted_api_key()? {
                Some(redacted) => Ok(redacted),
                None => Ok(
                    "(not set - use SKILLGRAPH_API_KEY or OPENROUTER_API_KEY env var)".to_string(),
                ),
            },

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `skillgraph config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            // LLM settings
            "llm.default_model" => {
                self.llm.default_model = value.to_string();
            }
            "llm.base_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(anyhow!("Base URL must start with http:// or https://"));
                }
                self.llm.base_url = value.trim_end_matches('/').to_string();
            }
            "llm.temperature" => {
                let temp: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature value: {}", value))?;
                if !(0.0..=2.0).contains(&temp) {
                    return Err(anyhow!("Temperature must be between 0.0 and 2.0"));
                }
                self.llm.temperature = temp;
            }
            "llm.max_tokens" => {
                self.llm.max_tokens = value
                    .parse()
                    .with_context(|| format!("Invalid max_tokens value: {}", value))?;
            }
            "llm.timeout_secs" => {
                self.llm.timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid timeout_secs value: {}", value))?;
            }

            // Oracle limits
            "oracle.max_concurrent_calls" => {
                let n: usize = value
                    .parse()
                    .with_context(|| format!("Invalid max_concurrent_calls value: {}", value))?;
                if n == 0 {
                    return Err(anyhow!("max_concurrent_calls must be at least 1"));
                }
                self.oracle.max_concurrent_calls = n;
            }
            "oracle.max_retries" => {
                self.oracle.max_retries = value
                    .parse()
                    .with_context(|| format!("Invalid max_retries value: {}", value))?;
            }
            "oracle.base_backoff_ms" => {
                self.oracle.base_backoff_ms = value
                    .parse()
                    .with_context(|| format!("Invalid base_backoff_ms value: {}", value))?;
            }
            "oracle.max_backoff_ms" => {
                self.oracle.max_backoff_ms = value
                    .parse()
                    .with_context(|| format!("Invalid max_backoff_ms value: {}", value))?;
            }

            // Exploration settings
            "exploration.iterations" => {
                self.exploration.iterations = value
                    .parse()
                    .with_context(|| format!("Invalid iterations value: {}", value))?;
            }
            "exploration.exploration_constant" => {
                let c: f64 = value
                    .parse()
                    .with_context(|| format!("Invalid exploration_constant value: {}", value))?;
                if !c.is_finite() || c < 0.0 {
                    return Err(anyhow!("Exploration constant must be non-negative"));
                }
                self.exploration.exploration_constant = c;
            }
            "exploration.reward_weights.accuracy" => {
                self.exploration.reward_weights.accuracy = parse_unit(key, value)?;
            }
            "exploration.reward_weights.efficiency" => {
                self.exploration.reward_weights.efficiency = parse_unit(key, value)?;
            }
            "exploration.reward_weights.diversity" => {
                self.exploration.reward_weights.diversity = parse_unit(key, value)?;
            }
            "exploration.preferred_languages" => {
                self.exploration.preferred_languages = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "exploration.diff_excerpt_chars" => {
                self.exploration.diff_excerpt_chars = value
                    .parse()
                    .with_context(|| format!("Invalid diff_excerpt_chars value: {}", value))?;
            }

            // Confidence settings
            "confidence.max_hops" => {
                let hops: usize = value
                    .parse()
                    .with_context(|| format!("Invalid max_hops value: {}", value))?;
                if hops == 0 {
                    return Err(anyhow!("max_hops must be at least 1"));
                }
                self.confidence.max_hops = hops;
            }
            "confidence.max_paths" => {
                self.confidence.max_paths = if value.eq_ignore_ascii_case("none") {
                    0
                } else {
                    value
                        .parse()
                        .with_context(|| format!("Invalid max_paths value: {}", value))?
                };
            }
            "confidence.min_belief" => {
                self.confidence.min_belief = parse_unit(key, value)?;
            }

            // API key cannot be set via config
            "llm.api_key" | "api_key" => {
                return Err(anyhow!(
                    "API keys cannot be stored in configuration for security. \
                     Set the SKILLGRAPH_API_KEY or OPENROUTER_API_KEY environment variable instead."
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `skillgraph config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn parse_unit(key: &str, value: &str) -> anyhow::Result<f64> {
    let v: f64 = value
        .parse()
        .with_context(|| format!("Invalid {} value: {}", key, value))?;
    if !(0.0..=1.0).contains(&v) {
        return Err(anyhow!("{} must be between 0.0 and 1.0", key));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert!(config.llm.api_key.is_none());
        assert_eq!(config.oracle.max_retries, 3);
        assert_eq!(config.exploration.iterations, 20);
        assert_eq!(config.exploration.diff_excerpt_chars, 200);
        assert_eq!(
            config.exploration.preferred_languages,
            vec!["Python", "Jupyter Notebook", "Java"]
        );
        assert_eq!(config.confidence.max_hops, 5);
        assert_eq!(config.confidence.path_cap(), Some(10_000));
        assert_eq!(config.confidence.min_belief, 0.05);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_get_set_round_trip() {
        let mut config = Config::default();
        config.set("exploration.iterations", "75").unwrap();
        config.set("confidence.max_paths", "none").unwrap();
        config
            .set("exploration.preferred_languages", "Rust, Go,,")
            .unwrap();

        assert_eq!(config.get("exploration.iterations").unwrap(), "75");
        assert_eq!(config.get("confidence.max_paths").unwrap(), "none");
        assert_eq!(config.exploration.preferred_languages, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_set_validates_ranges() {
        let mut config = Config::default();
        assert!(config.set("llm.temperature", "3.5").is_err());
        assert!(config.set("confidence.min_belief", "1.5").is_err());
        assert!(config.set("oracle.max_concurrent_calls", "0").is_err());
        assert!(config.set("confidence.max_hops", "abc").is_err());
        assert!(config.set("no.such.key", "1").is_err());
    }

    #[test]
    fn test_api_key_cannot_be_stored() {
        let mut config = Config::default();
        assert!(config.set("llm.api_key", "sk-secret").is_err());

        config.llm.api_key = Some("sk-secret".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_list_covers_every_key() {
        let listed = Config::default().list().unwrap();
        assert_eq!(listed.len(), KEYS.len());
        assert!(listed.iter().any(|(k, _)| k == "exploration.reward_weights.accuracy"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("oracle.max_retries", "5").unwrap();
        config.set("confidence.max_paths", "none").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.oracle.max_retries, 5);
        assert_eq!(loaded.confidence.path_cap(), None);
        assert_eq!(loaded.llm.default_model, config.llm.default_model);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[exploration]\niterations = 3\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.exploration.iterations, 3);
        assert_eq!(loaded.oracle.max_retries, 3);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.exploration.iterations, 20);
    }
}
