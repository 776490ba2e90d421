// Trait definitions for dependency injection
//
// Infrastructure seams only. What to scrape, extract or embed is decided in
// the domain activities that call these.
//
// Naming convention: Base* for trait names (e.g., BaseEmbeddingService)

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use manufacturer_scrapers::{DownloadedPdf, ProductSource};

// =============================================================================
// Embeddings
// =============================================================================

#[async_trait]
pub trait BaseEmbeddingService: Send + Sync {
    /// Generate embedding for text (returns 1536-dimensional vector)
    async fn generate(&self, text: &str) -> Result<Vec<f32>>;
}

// =============================================================================
// PDF download
// =============================================================================

#[async_trait]
pub trait BasePdfFetcher: Send + Sync {
    /// First URL in `urls` that yields a real PDF.
    async fn fetch_first(&self, urls: &[String]) -> Result<DownloadedPdf>;
}

// =============================================================================
// Manufacturer catalogue adapters
// =============================================================================

pub trait BaseSourceRegistry: Send + Sync {
    /// Adapter for a manufacturer slug (`rockwool`, `leier`, `baumit`).
    fn source_for(&self, slug: &str) -> Result<Arc<dyn ProductSource>>;

    fn slugs(&self) -> Vec<String>;
}
