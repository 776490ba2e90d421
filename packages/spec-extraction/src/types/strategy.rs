//! Strategy identity and cost classes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which extraction method produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Regex patterns over the embedded PDF text layer
    TextLayer,
    /// Page rendering + Tesseract, then the same patterns
    Ocr,
    /// LLM reading the document text
    AiNative,
}

impl StrategyKind {
    /// Tie-break rank when two values have equal support. Lower wins.
    ///
    /// The text layer is exact when present; OCR adds recognition noise.
    pub fn priority_rank(self) -> u8 {
        match self {
            StrategyKind::TextLayer => 0,
            StrategyKind::AiNative => 1,
            StrategyKind::Ocr => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::TextLayer => "text_layer",
            StrategyKind::Ocr => "ocr",
            StrategyKind::AiNative => "ai_native",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost class of a strategy. Escalation walks tiers in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    /// Local CPU only, milliseconds
    Free,
    /// Local CPU heavy (rendering + OCR), seconds
    Low,
    /// Paid remote API
    High,
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostTier::Free => write!(f, "free"),
            CostTier::Low => write!(f, "low"),
            CostTier::High => write!(f, "high"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered_by_cost() {
        assert!(CostTier::Free < CostTier::Low);
        assert!(CostTier::Low < CostTier::High);
    }

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&StrategyKind::AiNative).unwrap(),
            "\"ai_native\""
        );
        assert_eq!(StrategyKind::TextLayer.to_string(), "text_layer");
    }
}
