//! OpenAI-compatible REST client
//!
//! A minimal client for chat completions and embeddings against any
//! provider that speaks the OpenAI wire format. Transient failures
//! (network errors, HTTP 429, 5xx) are retried with exponential backoff.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm_client::{LlmClient, ChatRequest, Message};
//!
//! let client = LlmClient::from_env()?;
//!
//! let json = client
//!     .json_completion("gpt-4o-mini", "Extract specs as JSON", datasheet_text)
//!     .await?;
//!
//! let embedding = client.create_embedding("mineral wool slab", "text-embedding-3-small").await?;
//! ```

pub mod error;
pub mod retry;
pub mod types;

pub use error::{LlmError, Result};
pub use retry::RetryPolicy;
pub use types::*;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::retry::status_error;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible API client.
#[derive(Clone)]
pub struct LlmClient {
    http_client: Client,
    api_key: SecretString,
    base_url: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Create from `OPENAI_API_KEY` (and `LLM_BASE_URL` if set).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| LlmError::Config("OPENAI_API_KEY not set".into()))?;
        let mut client = Self::new(api_key);
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            client = client.with_base_url(base_url);
        }
        Ok(client)
    }

    /// Set a custom base URL (self-hosted gateways, proxies).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion, retried on transient failures.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();
        let response = self
            .retry
            .run("chat_completion", || self.send_chat(&request))
            .await?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis() as u64,
            total_tokens = response.usage.map(|u| u.total_tokens).unwrap_or_default(),
            "Chat completion finished"
        );

        Ok(response)
    }

    /// Ask for a JSON object and return the raw JSON text, code fences removed.
    pub async fn json_completion(
        &self,
        model: &str,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Result<String> {
        let request = ChatRequest::new(model)
            .message(Message::system(system_prompt))
            .message(Message::user(user_prompt))
            .temperature(0.0)
            .json_mode();

        let response = self.chat_completion(request).await?;
        Ok(strip_code_blocks(&response.content).to_string())
    }

    /// Create an embedding for text.
    pub async fn create_embedding(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        self.retry
            .run("create_embedding", || self.send_embedding(text, model))
            .await
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "LLM request failed");
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "LLM API error");
            return Err(status_error(status, error_text));
        }

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("response contained no message content".into()))?;

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }

    async fn send_embedding(&self, text: &str, model: &str) -> Result<Vec<f32>> {
        let request = types::EmbeddingRequest { model, input: text };

        let response = self
            .http_client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Embedding request failed");
                LlmError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Embedding API error");
            return Err(status_error(status, error_text));
        }

        let embed_response: types::EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        embed_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| LlmError::Parse("response contained no embedding".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = LlmClient::new("sk-test").with_base_url("https://gateway.local/v1/");

        assert_eq!(client.base_url(), "https://gateway.local/v1");
        assert_eq!(client.api_key.expose_secret(), "sk-test");
    }

    #[test]
    fn test_debug_hides_key() {
        let client = LlmClient::new("sk-very-secret");
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("sk-very-secret"));
    }
}
