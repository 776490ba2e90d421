//! The strategy trait every extraction method implements.

use async_trait::async_trait;

use crate::error::StrategyResult;
use crate::types::{CostTier, PdfDocument, StrategyKind, StrategyOutput};

/// Input to a strategy run.
///
/// Carries the document plus the best text recovered by strategies of
/// earlier tiers, so the AI tier can read OCR output of a scanned PDF
/// instead of an empty text layer.
#[derive(Debug, Clone)]
pub struct ExtractionContext<'a> {
    pub document: &'a PdfDocument,
    pub prior_text: Option<&'a str>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(document: &'a PdfDocument) -> Self {
        Self {
            document,
            prior_text: None,
        }
    }

    pub fn with_prior_text(mut self, text: Option<&'a str>) -> Self {
        self.prior_text = text.filter(|t| !t.trim().is_empty());
        self
    }
}

/// One method for pulling structured fields out of a PDF.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn tier(&self) -> CostTier;

    /// Expected cost of running against `document`, in USD.
    fn estimated_cost(&self, document: &PdfDocument) -> f64 {
        let _ = document;
        0.0
    }

    /// Run the strategy.
    async fn extract(&self, ctx: &ExtractionContext<'_>) -> StrategyResult<StrategyOutput>;
}
