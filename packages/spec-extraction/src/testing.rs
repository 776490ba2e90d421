//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction library
//! without running PDF tools or making real LLM calls.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{StrategyError, StrategyResult};
use crate::traits::{
    ai::LanguageModel,
    strategy::{ExtractionContext, ExtractionStrategy},
};
use crate::types::{CostTier, FieldCandidate, StrategyKind, StrategyOutput};

/// A mock language model for testing.
///
/// Replies with a fixed JSON string (or an error) and records every prompt.
#[derive(Clone, Default)]
pub struct MockLanguageModel {
    reply: Arc<RwLock<Option<String>>>,
    fail_with: Arc<RwLock<Option<String>>>,
    cost_per_call: f64,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockModelCall>>>,
}

/// Record of a call made to the mock model.
#[derive(Debug, Clone)]
pub struct MockModelCall {
    pub system_len: usize,
    pub user: String,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with this JSON to every prompt.
    pub fn with_reply(self, json: impl Into<String>) -> Self {
        *self.reply.write().unwrap() = Some(json.into());
        self
    }

    /// Fail every call with a model error.
    pub fn failing(self, message: impl Into<String>) -> Self {
        *self.fail_with.write().unwrap() = Some(message.into());
        self
    }

    /// Fixed cost estimate per call.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost_per_call = cost;
        self
    }

    pub fn calls(&self) -> Vec<MockModelCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete_json(&self, system: &str, user: &str) -> StrategyResult<String> {
        self.calls.write().unwrap().push(MockModelCall {
            system_len: system.len(),
            user: user.to_string(),
        });

        if let Some(message) = self.fail_with.read().unwrap().clone() {
            return Err(StrategyError::Model(message));
        }
        Ok(self
            .reply
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| r#"{"fields": {}}"#.to_string()))
    }

    fn estimate_cost(&self, _input_chars: usize) -> f64 {
        self.cost_per_call
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// A strategy that returns fixed candidates.
#[derive(Clone)]
pub struct StaticStrategy {
    kind: StrategyKind,
    tier: CostTier,
    candidates: Vec<FieldCandidate>,
    text: Option<String>,
    cost: f64,
    delay: Option<Duration>,
    calls: Arc<RwLock<Vec<Option<String>>>>,
}

impl StaticStrategy {
    /// Tier defaults to the one the real strategy of this kind uses.
    pub fn new(kind: StrategyKind, candidates: Vec<FieldCandidate>) -> Self {
        let tier = match kind {
            StrategyKind::TextLayer => CostTier::Free,
            StrategyKind::Ocr => CostTier::Low,
            StrategyKind::AiNative => CostTier::High,
        };
        Self {
            kind,
            tier,
            candidates,
            text: None,
            cost: 0.0,
            delay: None,
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Estimated and actual cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Sleep before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Prior text seen on each call.
    pub fn seen_prior_text(&self) -> Vec<Option<String>> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionStrategy for StaticStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn tier(&self) -> CostTier {
        self.tier
    }

    fn estimated_cost(&self, _document: &crate::types::PdfDocument) -> f64 {
        self.cost
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> StrategyResult<StrategyOutput> {
        self.calls
            .write()
            .unwrap()
            .push(ctx.prior_text.map(str::to_string));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut output = StrategyOutput::new(self.kind)
            .with_candidates(self.candidates.clone())
            .with_cost(self.cost);
        if let Some(text) = &self.text {
            output = output.with_text(text.clone());
        }
        Ok(output)
    }
}

/// A strategy that always fails.
#[derive(Clone)]
pub struct FailingStrategy {
    kind: StrategyKind,
    tier: CostTier,
    calls: Arc<RwLock<usize>>,
}

impl FailingStrategy {
    pub fn new(kind: StrategyKind, tier: CostTier) -> Self {
        Self {
            kind,
            tier,
            calls: Arc::new(RwLock::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl ExtractionStrategy for FailingStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn tier(&self) -> CostTier {
        self.tier
    }

    async fn extract(&self, _ctx: &ExtractionContext<'_>) -> StrategyResult<StrategyOutput> {
        *self.calls.write().unwrap() += 1;
        Err(StrategyError::NoTextLayer { chars: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_tracks_calls() {
        let model = MockLanguageModel::new().with_reply(r#"{"fields": {"density": 140}}"#);
        let reply = model.complete_json("system", "Rohdichte 140").await.unwrap();

        assert!(reply.contains("density"));
        assert_eq!(model.call_count(), 1);
        assert_eq!(model.calls()[0].user, "Rohdichte 140");
    }

    #[tokio::test]
    async fn test_failing_model() {
        let model = MockLanguageModel::new().failing("quota exceeded");
        let err = model.complete_json("s", "u").await.unwrap_err();
        assert!(matches!(err, StrategyError::Model(m) if m == "quota exceeded"));
    }
}
