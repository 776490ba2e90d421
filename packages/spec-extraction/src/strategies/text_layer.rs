//! Text-layer strategy: read the PDF's embedded text and run the pattern library.

use async_trait::async_trait;
use tracing::debug;

use super::patterns::{has_usable_text, PatternExtractor};
use crate::error::{StrategyError, StrategyResult};
use crate::traits::strategy::{ExtractionContext, ExtractionStrategy};
use crate::types::{CostTier, StrategyKind, StrategyOutput};

/// Free, fast and precise when the datasheet was exported digitally.
#[derive(Debug, Clone)]
pub struct TextLayerStrategy {
    min_chars: usize,
    base_confidence: f32,
}

impl Default for TextLayerStrategy {
    fn default() -> Self {
        Self {
            min_chars: 80,
            base_confidence: 0.85,
        }
    }
}

impl TextLayerStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum alphanumeric characters before the layer counts as present.
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }
}

/// Extract the embedded text of a PDF.
///
/// `pdf_extract` panics on some malformed files, so the call is isolated.
pub fn extract_text(bytes: &[u8]) -> StrategyResult<String> {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(StrategyError::PdfParse(e.to_string())),
        Err(_) => Err(StrategyError::PdfParse(
            "text extraction panicked (malformed PDF)".into(),
        )),
    }
}

#[async_trait]
impl ExtractionStrategy for TextLayerStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TextLayer
    }

    fn tier(&self) -> CostTier {
        CostTier::Free
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> StrategyResult<StrategyOutput> {
        let document = ctx.document.clone();
        let text = tokio::task::spawn_blocking(move || extract_text(document.bytes()))
            .await
            .map_err(|e| StrategyError::PdfParse(format!("text extraction task failed: {}", e)))??;

        if !has_usable_text(&text, self.min_chars) {
            let chars = text.chars().filter(|c| c.is_alphanumeric()).count();
            return Err(StrategyError::NoTextLayer { chars });
        }

        let candidates =
            PatternExtractor::new(StrategyKind::TextLayer, self.base_confidence).extract(&text);

        debug!(
            source = %ctx.document.source,
            chars = text.len(),
            candidates = candidates.len(),
            "text layer extracted"
        );

        Ok(StrategyOutput::new(StrategyKind::TextLayer)
            .with_candidates(candidates)
            .with_pages(ctx.document.page_count)
            .with_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_a_parse_error() {
        let err = extract_text(b"%PDF-1.4\nnot really a pdf").unwrap_err();
        assert!(matches!(err, StrategyError::PdfParse(_)));
    }

    #[test]
    fn test_strategy_identity() {
        let strategy = TextLayerStrategy::new();
        assert_eq!(strategy.kind(), StrategyKind::TextLayer);
        assert_eq!(strategy.tier(), CostTier::Free);
    }
}
