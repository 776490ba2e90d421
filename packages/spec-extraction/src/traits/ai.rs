//! Language model trait used by the AI-native strategy.

use async_trait::async_trait;

use crate::error::StrategyResult;

/// Language model capabilities needed by the extraction pipeline.
///
/// Implementations wrap a specific provider and handle transport,
/// retries and authentication. Prompt content lives in this crate.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete a prompt expecting a JSON object reply (returns raw JSON text).
    async fn complete_json(&self, system: &str, user: &str) -> StrategyResult<String>;

    /// Estimated cost in USD for a prompt of `input_chars` characters.
    ///
    /// Used for budget checks before the call is made.
    fn estimate_cost(&self, input_chars: usize) -> f64 {
        // ~4 characters per token, $0.15 per million input tokens, reply overhead
        (input_chars as f64 / 4.0) * 0.15e-6 + 0.001
    }

    /// Short identifier for logs and strategy reports.
    fn model_name(&self) -> &str {
        "unknown"
    }
}
