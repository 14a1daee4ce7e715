//! OpenAI-compatible LLM client
//!
//! Each call is a single attempt. Rate limits and outages are reported as
//! typed errors so that the caller owns the retry policy.

use std::time::Duration;

use reqwest::Client as HttpClient;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::types::{ChatRequest, ChatResponse, LlmResponse, Message};

/// Wait assumed when a 429 carries no retry hint
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Chat-completions client
#[derive(Clone)]
pub struct LlmClient {
    http_client: HttpClient,
    config: LlmConfig,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("default_model", &self.config.default_model)
            .finish()
    }
}

/// Builder for creating an LlmClient
#[derive(Default)]
pub struct LlmClientBuilder {
    config: Option<LlmConfig>,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

impl LlmClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: LlmConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the endpoint root from the configuration
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<LlmClient> {
        let config = self.config.unwrap_or_default();
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("LLM API key is required".to_string()))?;

        let timeout_secs = self.timeout_secs.unwrap_or(config.timeout_secs);

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::NetworkError)?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| config.base_url.clone())
            .trim_end_matches('/')
            .to_string();

        Ok(LlmClient {
            http_client,
            config,
            api_key,
            base_url,
        })
    }
}

impl LlmClient {
    pub fn new(config: LlmConfig, api_key: impl Into<String>) -> Result<Self> {
        LlmClientBuilder::new()
            .config(config)
            .api_key(api_key)
            .build()
    }

    pub fn builder() -> LlmClientBuilder {
        LlmClientBuilder::new()
    }

    pub fn default_model(&self) -> &str {
        &self.config.default_model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make one chat completion request
    pub async fn complete(&self, messages: Vec<Message>, model: Option<&str>) -> Result<LlmResponse> {
        let model = model.unwrap_or(&self.config.default_model);
        let request = ChatRequest::new(model, messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        self.send_request(&request).await
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Title", "SkillGraph")
            .json(request)
            .send()
            .await
            .map_err(Error::NetworkError)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status.as_u16(), &body));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            Error::MalformedOracleResponse(format!("Failed to parse completion: {}", e))
        })?;

        let llm_response = LlmResponse::from_chat_response(chat_response).ok_or_else(|| {
            Error::MalformedOracleResponse("Completion has no choices".to_string())
        })?;
        debug!(
            model = %llm_response.model,
            tokens = llm_response.tokens_used,
            finish_reason = %llm_response.finish_reason,
            "Chat completion received"
        );
        Ok(llm_response)
    }
}

/// Map a non-success HTTP status onto an error kind
///
/// Only 429 is retryable; everything else makes the oracle unavailable for
/// this call.
fn error_for_status(status: u16, body: &str) -> Error {
    match status {
        429 => Error::RateLimited(extract_retry_after(body).unwrap_or(DEFAULT_RETRY_AFTER_SECS)),
        401 => Error::OracleUnavailable(
            "Unauthorized: invalid API key. Set SKILLGRAPH_API_KEY or OPENROUTER_API_KEY."
                .to_string(),
        ),
        402 => Error::OracleUnavailable("Payment required: insufficient credits".to_string()),
        400 => Error::OracleUnavailable(format!("Bad request: {}", body)),
        403 => Error::OracleUnavailable(format!("Forbidden: {}", body)),
        404 => Error::OracleUnavailable(format!("Model or endpoint not found: {}", body)),
        500..=599 => Error::OracleUnavailable(format!("Server error ({}): {}", status, body)),
        _ => Error::OracleUnavailable(format!("HTTP error {}: {}", status, body)),
    }
}

/// Retry hint in seconds from a rate-limit body
fn extract_retry_after(body: &str) -> Option<u64> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    json.get("retry_after")
        .or_else(|| json.get("error").and_then(|e| e.get("retry_after")))
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.ceil() as u64)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> LlmConfig {
        LlmConfig {
            default_model: "test/model".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_client_builder() {
        let client = LlmClient::builder()
            .config(test_config())
            .api_key("test-key")
            .base_url("https://example.com/v1/")
            .timeout_secs(5)
            .build()
            .unwrap();

        assert_eq!(client.default_model(), "test/model");
        assert_eq!(client.base_url(), "https://example.com/v1");
    }

    #[test]
    fn test_client_builder_requires_api_key() {
        assert!(matches!(
            LlmClient::builder().config(test_config()).build(),
            Err(Error::ConfigError(_))
        ));
        assert!(LlmClient::new(test_config(), "  ").is_err());
    }

    #[test]
    fn test_client_debug_hides_key() {
        let client = LlmClient::new(test_config(), "sk-secret").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("test/model"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn test_client_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LlmClient>();
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(error_for_status(429, "{}"), Error::RateLimited(60)));
        assert!(matches!(
            error_for_status(429, r#"{"error": {"retry_after": 12}}"#),
            Error::RateLimited(12)
        ));
        for status in [400, 401, 402, 403, 404, 500, 503] {
            let err = error_for_status(status, "nope");
            assert!(matches!(err, Error::OracleUnavailable(_)), "{status}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_extract_retry_after() {
        assert_eq!(extract_retry_after(r#"{"retry_after": 30}"#), Some(30));
        assert_eq!(extract_retry_after(r#"{"retry_after": 2.5}"#), Some(3));
        assert_eq!(extract_retry_after(r#"{"error": {"retry_after": 60}}"#), Some(60));
        assert_eq!(extract_retry_after(r#"{"message": "rate limited"}"#), None);
        assert_eq!(extract_retry_after("plain text"), None);
    }
}
