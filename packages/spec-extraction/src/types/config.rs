//! Configuration for consensus merging and orchestration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::field::SpecField;
use super::strategy::StrategyKind;

/// Configuration for the consensus merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Relative tolerance when comparing numbers.
    ///
    /// Default: 0.02 (values within 2 % agree).
    pub numeric_tolerance: f64,

    /// A losing value becomes a conflict when its support reaches this
    /// share of the winner's support.
    ///
    /// Default: 0.5.
    pub conflict_ratio: f32,

    /// Weight applied to text-layer candidates. Default: 1.0.
    pub text_layer_weight: f32,

    /// Weight applied to AI candidates. Default: 0.9.
    pub ai_native_weight: f32,

    /// Weight applied to OCR candidates. Default: 0.7.
    pub ocr_weight: f32,

    /// Confidence bonus per additional agreeing strategy. Default: 0.1.
    pub agreement_bonus: f32,

    /// Fields that count towards completeness.
    pub required_fields: Vec<SpecField>,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            numeric_tolerance: 0.02,
            conflict_ratio: 0.5,
            text_layer_weight: 1.0,
            ai_native_weight: 0.9,
            ocr_weight: 0.7,
            agreement_bonus: 0.1,
            required_fields: vec![
                SpecField::ThermalConductivity,
                SpecField::Density,
                SpecField::FireClass,
            ],
        }
    }
}

impl ConsensusConfig {
    pub fn weight(&self, kind: StrategyKind) -> f32 {
        match kind {
            StrategyKind::TextLayer => self.text_layer_weight,
            StrategyKind::AiNative => self.ai_native_weight,
            StrategyKind::Ocr => self.ocr_weight,
        }
    }

    pub fn with_required_fields(mut self, fields: Vec<SpecField>) -> Self {
        self.required_fields = fields;
        self
    }

    pub fn with_conflict_ratio(mut self, ratio: f32) -> Self {
        self.conflict_ratio = ratio;
        self
    }
}

/// Two thirds of the required fields.
pub const DEFAULT_TARGET_COMPLETENESS: f32 = 2.0 / 3.0;

/// Configuration for tiered escalation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Stop escalating once overall confidence reaches this. Default: 0.75.
    pub target_confidence: f32,

    /// Stop escalating once completeness reaches this. Default: two of the
    /// three default required fields.
    pub target_completeness: f32,

    /// Run every tier regardless of targets, for maximum cross-checking.
    pub consensus_mode: bool,

    /// Maximum spend per document in budget units (USD). Default: 0.10.
    pub budget: f64,

    /// Per-strategy wall-clock limit. Default: 120 s.
    #[serde(with = "duration_secs")]
    pub strategy_timeout: Duration,

    /// Records below this confidence are flagged for review. Default: 0.6.
    pub review_threshold: f32,

    pub consensus: ConsensusConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            target_confidence: 0.75,
            target_completeness: DEFAULT_TARGET_COMPLETENESS,
            consensus_mode: false,
            budget: 0.10,
            strategy_timeout: Duration::from_secs(120),
            review_threshold: 0.6,
            consensus: ConsensusConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_consensus_mode(mut self, enabled: bool) -> Self {
        self.consensus_mode = enabled;
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_targets(mut self, confidence: f32, completeness: f32) -> Self {
        self.target_confidence = confidence;
        self.target_completeness = completeness;
        self
    }

    pub fn with_strategy_timeout(mut self, timeout: Duration) -> Self {
        self.strategy_timeout = timeout;
        self
    }

    pub fn with_consensus(mut self, consensus: ConsensusConfig) -> Self {
        self.consensus = consensus;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
