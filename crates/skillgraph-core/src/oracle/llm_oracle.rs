//! Skill oracle backed by a chat-completion model

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::explore::ContextBundle;
use crate::graph::NodeKey;
use crate::llm::{FinishReason, LlmClient, Message};

use super::{SkillCandidate, SkillOracle};

/// Persona, rules and answer format shared by every inference call
pub const SYSTEM_PROMPT: &str = r#"You are a senior engineering lead reasoning over a developer's activity graph to build a skill profile. Skill names look like "Python", "Vector Databases", "Transformers" or "FastAPI".

RULES:
1. Ignore non-code skills such as documentation, writing or README updates.
2. Ignore generic process concepts such as GitHub, version control or Agile.
3. Return only hard technical skills: languages, frameworks, libraries, algorithms.
4. In "causal_link", explain how this specific commit, file or project demonstrates the skill.

Respond with only a JSON array:
[{"skill": "Name", "confidence": 0.0, "causal_link": "..."}]"#;

/// Asks an LLM which hard technical skills a piece of evidence proves
#[derive(Debug, Clone)]
pub struct LlmOracle {
    client: LlmClient,
    model: Option<String>,
}

impl LlmOracle {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            model: None,
        }
    }

    /// Use a model other than the client's default
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Render the user message for one node
    pub fn render_prompt(context: &ContextBundle, path: &[NodeKey]) -> String {
        let path_str = if path.is_empty() {
            "Direct exploration".to_string()
        } else {
            path.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ")
        };

        let data = match &context.diff_summary {
            Some(diff) => diff.clone(),
            None => {
                let mut parts = Vec::new();
                if !context.topics.is_empty() {
                    parts.push(format!("Topics: {}", context.topics.join(", ")));
                }
                if !context.languages.is_empty() {
                    let langs: Vec<&str> = context.languages.keys().map(String::as_str).collect();
                    parts.push(format!("Languages: {}", langs.join(", ")));
                }
                if parts.is_empty() {
                    "(none)".to_string()
                } else {
                    parts.join("\n")
                }
            }
        };

        format!(
            r#"REASONING PATH:
{path}

TARGET EVIDENCE:
Type: {kind}
Metadata: {text}
Data: {data}

TASK:
Using the whole reasoning path as context, name 1-3 hard technical skills that this evidence demonstrates."#,
            path = path_str,
            kind = context.kind,
            text = context.text.as_deref().unwrap_or(""),
            data = data,
        )
    }
}

#[async_trait]
impl SkillOracle for LlmOracle {
    async fn infer(
        &self,
        context: &ContextBundle,
        path: &[NodeKey],
    ) -> Result<Vec<SkillCandidate>> {
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(Self::render_prompt(context, path)),
        ];
        let response = self
            .client
            .complete(messages, self.model.as_deref())
            .await?;

        if response.finish_reason == FinishReason::Length {
            debug!(node = %context.node, "Completion hit the token limit");
        }
        parse_candidates(&response.content)
    }

    fn name(&self) -> &str {
        "llm"
    }
}

/// Parse the model's answer into skill candidates
///
/// Accepts a bare JSON array, an array inside a code fence or prose, or an
/// object wrapping the array under `skills`. Entries that do not parse or
/// have an empty name are dropped and confidence is clamped to [0, 1].
pub fn parse_candidates(response: &str) -> Result<Vec<SkillCandidate>> {
    let json = extract_json_from_response(response);
    let value: Value = serde_json::from_str(json).map_err(|e| {
        Error::MalformedOracleResponse(format!("{}: {}", e, truncate(response, 120)))
    })?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("skills") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(map)],
        },
        other => {
            return Err(Error::MalformedOracleResponse(format!(
                "expected a JSON array, got {}",
                truncate(&other.to_string(), 120)
            )));
        }
    };

    let candidates = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<SkillCandidate>(item).ok())
        .filter_map(|mut c| {
            c.skill_name = c.skill_name.trim().to_string();
            if c.skill_name.is_empty() {
                return None;
            }
            c.confidence = if c.confidence.is_finite() {
                c.confidence.clamp(0.0, 1.0)
            } else {
                0.0
            };
            Some(c)
        })
        .collect();
    Ok(candidates)
}

/// Locate the JSON payload inside a chatty response
fn extract_json_from_response(response: &str) -> &str {
    // Code block tagged as JSON
    if let Some(start) = response.find("```json") {
        let json_start = start + 7;
        if let Some(end) = response[json_start..].find("```") {
            return response[json_start..json_start + end].trim();
        }
    }

    // Any code block, skipping a language tag
    if let Some(start) = response.find("```") {
        let fence_end = start + 3;
        let json_start = response[fence_end..]
            .find('\n')
            .map_or(fence_end, |nl| fence_end + nl + 1);
        if let Some(end) = response[json_start..].find("```") {
            return response[json_start..json_start + end].trim();
        }
    }

    // Outermost array, then outermost object
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let (Some(start), Some(end)) = (response.find(open), response.rfind(close))
            && start < end
        {
            return &response[start..=end];
        }
    }

    response.trim()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_array() {
        let out = parse_candidates(
            r#"[{"skill": "Rust", "confidence": 0.9, "causal_link": "borrow checker fixes"}]"#,
        )
        .unwrap();
        assert_eq!(out, vec![SkillCandidate::new("Rust", 0.9, "borrow checker fixes")]);
    }

    #[test]
    fn test_parse_fenced_with_aliases() {
        let response = "Here you go:\n```json\n[\n  {\"name\": \"FastAPI\", \"confidence\": 1.7, \"reasoning\": \"routes\"},\n  {\"skill\": \"  \", \"confidence\": 0.5}\n]\n```\nHope that helps.";
        let out = parse_candidates(response).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].skill_name, "FastAPI");
        assert_eq!(out[0].confidence, 1.0);
        assert_eq!(out[0].rationale, "routes");
    }

    #[test]
    fn test_parse_generic_fence_and_wrapper_object() {
        let response = "```\n{\"skills\": [{\"skill\": \"SQL\", \"confidence\": -0.2, \"rationale\": \"joins\"}]}\n```";
        let out = parse_candidates(response).unwrap();
        assert_eq!(out, vec![SkillCandidate::new("SQL", 0.0, "joins")]);
    }

    #[test]
    fn test_parse_prose_around_array() {
        let out = parse_candidates(
            r#"The skills are [{"skill": "Go", "confidence": 0.4}] based on the diff."#,
        )
        .unwrap();
        assert_eq!(out[0].skill_name, "Go");
        assert_eq!(out[0].rationale, "");
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_candidates("[]").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_response() {
        assert!(matches!(
            parse_candidates("I could not find any skills."),
            Err(Error::MalformedOracleResponse(_))
        ));
        assert!(matches!(
            parse_candidates("[{\"skill\": \"Rust\""),
            Err(Error::MalformedOracleResponse(_))
        ));
    }

    #[test]
    fn test_prompt_mentions_path_and_evidence() {
        let mut ctx = ContextBundle::new(NodeKey::change_set("abc"));
        ctx.text = Some("Add HNSW index".into());
        ctx.diff_summary = Some("\nFile: src/index.rs\nPatch: fn search...".into());
        let path = [NodeKey::person("alice"), NodeKey::change_set("abc")];

        let prompt = LlmOracle::render_prompt(&ctx, &path);
        assert!(prompt.contains("person:alice -> changeset:abc"));
        assert!(prompt.contains("Type: changeset"));
        assert!(prompt.contains("Metadata: Add HNSW index"));
        assert!(prompt.contains("File: src/index.rs"));
        assert!(!prompt.contains("RULES"));
        assert!(SYSTEM_PROMPT.contains("causal_link"));
    }

    #[test]
    fn test_prompt_without_path_or_diff() {
        let mut ctx = ContextBundle::new(NodeKey::project("alice/vec"));
        ctx.topics = vec!["ann".into()];
        let prompt = LlmOracle::render_prompt(&ctx, &[]);
        assert!(prompt.contains("Direct exploration"));
        assert!(prompt.contains("Topics: ann"));
    }
}
