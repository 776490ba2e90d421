// Infrastructure implementations backed by the shared LLM and scraper crates.
//
// Business logic (what text to embed, which PDF to fetch) lives in domains.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use llm_client::LlmClient;
use manufacturer_scrapers::{
    source_for, DownloadedPdf, HttpFetcher, PdfDownloader, ProductSource, SourceConfig, SLUGS,
};

use super::{BaseEmbeddingService, BasePdfFetcher, BaseSourceRegistry};

/// OpenAI-compatible embeddings.
#[derive(Clone)]
pub struct OpenAiEmbeddings {
    client: LlmClient,
    model: String,
}

impl OpenAiEmbeddings {
    pub fn new(client: LlmClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseEmbeddingService for OpenAiEmbeddings {
    async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self
            .client
            .create_embedding(text, &self.model)
            .await
            .with_context(|| format!("Failed to create embedding with {}", self.model))?;
        Ok(embedding)
    }
}

/// Datasheet downloads over the rate-limited, SSRF-guarded fetcher.
pub struct HttpPdfFetcher {
    downloader: PdfDownloader,
}

impl HttpPdfFetcher {
    pub fn new(requests_per_second: u32) -> Result<Self> {
        let fetcher =
            HttpFetcher::new(requests_per_second).context("Failed to build PDF HTTP client")?;
        Ok(Self {
            downloader: PdfDownloader::new(fetcher),
        })
    }
}

#[async_trait]
impl BasePdfFetcher for HttpPdfFetcher {
    async fn fetch_first(&self, urls: &[String]) -> Result<DownloadedPdf> {
        let pdf = self.downloader.download_first(urls).await?;
        Ok(pdf)
    }
}

/// The built-in ROCKWOOL, LEIER and BAUMIT adapters.
pub struct ScraperRegistry {
    config: SourceConfig,
}

impl ScraperRegistry {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

impl BaseSourceRegistry for ScraperRegistry {
    fn source_for(&self, slug: &str) -> Result<Arc<dyn ProductSource>> {
        Ok(source_for(slug, &self.config)?)
    }

    fn slugs(&self) -> Vec<String> {
        SLUGS.iter().map(|s| s.to_string()).collect()
    }
}
