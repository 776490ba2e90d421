//! Raw strategy output: candidate values before consensus.

use serde::{Deserialize, Serialize};

use super::field::SpecField;
use super::strategy::StrategyKind;
use super::value::FieldValue;

/// One value proposed by one strategy for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCandidate {
    pub field: SpecField,
    pub value: FieldValue,

    /// Strategy's own confidence, 0.0 to 1.0
    pub confidence: f32,

    /// Source snippet the value was read from
    #[serde(default)]
    pub raw: String,

    pub strategy: StrategyKind,
}

impl FieldCandidate {
    pub fn new(
        field: SpecField,
        value: FieldValue,
        confidence: f32,
        strategy: StrategyKind,
    ) -> Self {
        Self {
            field,
            value,
            confidence: confidence.clamp(0.0, 1.0),
            raw: String::new(),
            strategy,
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }
}

/// Everything a strategy produced for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyOutput {
    pub strategy: StrategyKind,
    pub candidates: Vec<FieldCandidate>,

    /// Plain text the strategy recovered, reused by later strategies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Actual cost incurred, in the orchestrator's budget units
    #[serde(default)]
    pub cost: f64,

    #[serde(default)]
    pub pages_processed: usize,
}

impl StrategyOutput {
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            candidates: Vec::new(),
            text: None,
            cost: 0.0,
            pages_processed: 0,
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<FieldCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_pages(mut self, pages: usize) -> Self {
        self.pages_processed = pages;
        self
    }

    /// Candidates for one field.
    pub fn candidates_for(&self, field: SpecField) -> impl Iterator<Item = &FieldCandidate> {
        self.candidates.iter().filter(move |c| c.field == field)
    }
}
