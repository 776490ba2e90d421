//! OCR strategy for scanned datasheets.
//!
//! Pages are rasterised with `pdftoppm` (poppler-utils) and recognised with
//! the `tesseract` CLI. The recovered text goes through the same pattern
//! library as the text layer, at a lower base confidence.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

use super::patterns::{has_usable_text, PatternExtractor};
use crate::error::{StrategyError, StrategyResult};
use crate::traits::strategy::{ExtractionContext, ExtractionStrategy};
use crate::types::{CostTier, PdfDocument, StrategyKind, StrategyOutput};

#[derive(Debug, Clone)]
pub struct OcrStrategy {
    languages: String,
    dpi: u32,
    max_pages: usize,
    base_confidence: f32,
    cost_per_page: f64,
    pdftoppm_bin: String,
    tesseract_bin: String,
}

impl Default for OcrStrategy {
    fn default() -> Self {
        Self {
            languages: "deu+hun+eng".to_string(),
            dpi: 300,
            max_pages: 6,
            base_confidence: 0.65,
            cost_per_page: 0.002,
            pdftoppm_bin: "pdftoppm".to_string(),
            tesseract_bin: "tesseract".to_string(),
        }
    }
}

impl OcrStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tesseract language list, e.g. `deu+hun+eng`.
    pub fn with_languages(mut self, languages: impl Into<String>) -> Self {
        self.languages = languages.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Override the tool binaries (absolute paths or names on `PATH`).
    pub fn with_binaries(mut self, pdftoppm: impl Into<String>, tesseract: impl Into<String>) -> Self {
        self.pdftoppm_bin = pdftoppm.into();
        self.tesseract_bin = tesseract.into();
        self
    }

    fn pages_for(&self, document: &PdfDocument) -> usize {
        match document.page_count {
            0 => self.max_pages,
            n => n.min(self.max_pages),
        }
    }

    async fn rasterise(&self, pdf_path: &Path, out_dir: &Path, pages: usize) -> StrategyResult<Vec<PathBuf>> {
        let output = Command::new(&self.pdftoppm_bin)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg(pages.to_string())
            .arg(pdf_path)
            .arg(out_dir.join("page"))
            .output()
            .await
            .map_err(|e| tool_error("pdftoppm", e))?;

        if !output.status.success() {
            return Err(StrategyError::Tool {
                tool: "pdftoppm",
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut images = Vec::new();
        let mut entries = tokio::fs::read_dir(out_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_page = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("page") && n.ends_with(".png"));
            if is_page {
                images.push(path);
            }
        }
        // pdftoppm zero-pads page numbers to a common width
        images.sort();
        Ok(images)
    }

    async fn recognise(&self, image: &Path) -> StrategyResult<String> {
        let output = Command::new(&self.tesseract_bin)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output()
            .await
            .map_err(|e| tool_error("tesseract", e))?;

        if !output.status.success() {
            return Err(StrategyError::Tool {
                tool: "tesseract",
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn tool_error(tool: &'static str, e: std::io::Error) -> StrategyError {
    let message = if e.kind() == std::io::ErrorKind::NotFound {
        format!("{} is not installed", tool)
    } else {
        e.to_string()
    };
    StrategyError::Tool { tool, message }
}

#[async_trait]
impl ExtractionStrategy for OcrStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Ocr
    }

    fn tier(&self) -> CostTier {
        CostTier::Low
    }

    fn estimated_cost(&self, document: &PdfDocument) -> f64 {
        self.pages_for(document) as f64 * self.cost_per_page
    }

    async fn extract(&self, ctx: &ExtractionContext<'_>) -> StrategyResult<StrategyOutput> {
        let scratch = tempfile::tempdir()?;
        let pdf_path = scratch.path().join("input.pdf");
        tokio::fs::write(&pdf_path, ctx.document.bytes()).await?;

        let pages = self.pages_for(ctx.document);
        let images = self.rasterise(&pdf_path, scratch.path(), pages).await?;

        let mut text = String::new();
        for image in &images {
            match self.recognise(image).await {
                Ok(page_text) => {
                    text.push_str(page_text.trim());
                    text.push_str("\n\n");
                }
                Err(e) if images.len() > 1 => {
                    warn!(image = %image.display(), error = %e, "OCR failed for page, continuing");
                }
                Err(e) => return Err(e),
            }
        }

        if !has_usable_text(&text, 40) {
            let chars = text.chars().filter(|c| c.is_alphanumeric()).count();
            return Err(StrategyError::NoTextLayer { chars });
        }

        let candidates = PatternExtractor::new(StrategyKind::Ocr, self.base_confidence).extract(&text);

        debug!(
            source = %ctx.document.source,
            pages = images.len(),
            candidates = candidates.len(),
            "OCR extracted"
        );

        Ok(StrategyOutput::new(StrategyKind::Ocr)
            .with_candidates(candidates)
            .with_cost(images.len() as f64 * self.cost_per_page)
            .with_pages(images.len())
            .with_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_cap() {
        let strategy = OcrStrategy::new().with_max_pages(3);
        let bytes = b"%PDF-1.4\n".to_vec();
        let document = PdfDocument::from_bytes(bytes, "scan.pdf").unwrap();
        // Unknown page count falls back to the cap
        assert_eq!(strategy.pages_for(&document), 3);
        assert!((strategy.estimated_cost(&document) - 0.006).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_binary_is_a_tool_error() {
        let strategy = OcrStrategy::new().with_binaries("definitely-not-pdftoppm", "tesseract");
        let document = PdfDocument::from_bytes(b"%PDF-1.4\n".to_vec(), "scan.pdf").unwrap();
        let ctx = ExtractionContext::new(&document);

        let err = strategy.extract(&ctx).await.unwrap_err();
        assert!(matches!(err, StrategyError::Tool { tool: "pdftoppm", .. }));
    }
}
