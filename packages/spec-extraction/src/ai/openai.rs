//! OpenAI-compatible implementation of [`LanguageModel`].
//!
//! # Example
//!
//! ```rust,ignore
//! use spec_extraction::ai::OpenAiModel;
//!
//! let model = OpenAiModel::new(LlmClient::from_env()?).with_model("gpt-4o-mini");
//! let strategy = AiNativeStrategy::new(Arc::new(model));
//! ```

use async_trait::async_trait;
use llm_client::{LlmClient, LlmError};

use crate::error::{StrategyError, StrategyResult};
use crate::traits::ai::LanguageModel;

/// USD per million input tokens for the default model.
const DEFAULT_INPUT_PRICE: f64 = 0.15;

#[derive(Debug, Clone)]
pub struct OpenAiModel {
    client: LlmClient,
    model: String,
    input_price_per_million: f64,
}

impl OpenAiModel {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            model: "gpt-4o-mini".to_string(),
            input_price_per_million: DEFAULT_INPUT_PRICE,
        }
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the input price used for budget estimates.
    pub fn with_input_price(mut self, usd_per_million_tokens: f64) -> Self {
        self.input_price_per_million = usd_per_million_tokens;
        self
    }
}

impl From<LlmError> for StrategyError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::Parse(message) => StrategyError::Response(message),
            other => StrategyError::Model(other.to_string()),
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete_json(&self, system: &str, user: &str) -> StrategyResult<String> {
        Ok(self.client.json_completion(&self.model, system, user).await?)
    }

    fn estimate_cost(&self, input_chars: usize) -> f64 {
        // ~4 characters per token plus a flat allowance for the reply
        (input_chars as f64 / 4.0) * self.input_price_per_million * 1e-6 + 0.001
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_scales_with_price() {
        let cheap = OpenAiModel::new(LlmClient::new("sk-test"));
        let pricey = OpenAiModel::new(LlmClient::new("sk-test")).with_input_price(2.5);
        assert!(pricey.estimate_cost(40_000) > cheap.estimate_cost(40_000));
        assert_eq!(cheap.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_parse_errors_become_response_errors() {
        let err: StrategyError = LlmError::Parse("missing content".into()).into();
        assert!(matches!(err, StrategyError::Response(_)));
        let err: StrategyError = LlmError::RateLimited.into();
        assert!(matches!(err, StrategyError::Model(_)));
    }
}
