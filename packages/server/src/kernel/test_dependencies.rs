// TestDependencies - mock implementations for testing

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use manufacturer_scrapers::{
    content_hash, DiscoverOptions, DownloadedPdf, ManufacturerInfo, ProductListing, ProductSource,
    ScrapeError,
};
use spec_extraction::{Orchestrator, OrchestratorConfig};
use sqlx::PgPool;

use super::{BaseEmbeddingService, BasePdfFetcher, BaseSourceRegistry, ServerDeps};

/// Smallest byte string that passes the `%PDF-` sniff.
pub const MINIMAL_PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";

// =============================================================================
// Mock Embedding Service
// =============================================================================

pub struct MockEmbeddingService {
    // Returned for every input unless a pattern matches
    fixed_embedding: Vec<f32>,
    // Text pattern -> embedding, first match wins
    pattern_embeddings: Arc<Mutex<Vec<(String, Vec<f32>)>>>,
    fail_with: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockEmbeddingService {
    pub fn new() -> Self {
        Self {
            fixed_embedding: vec![0.1; 1536],
            pattern_embeddings: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.fixed_embedding = embedding;
        self
    }

    /// When the text contains `pattern` (case-insensitive), return `embedding`.
    pub fn with_pattern_embedding(self, pattern: &str, embedding: Vec<f32>) -> Self {
        self.pattern_embeddings
            .lock()
            .unwrap()
            .push((pattern.to_lowercase(), embedding));
        self
    }

    /// Every call errors, as when the provider is down.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockEmbeddingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmbeddingService for MockEmbeddingService {
    async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());

        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{}", message));
        }

        let lowered = text.to_lowercase();
        let patterns = self.pattern_embeddings.lock().unwrap();
        for (pattern, embedding) in patterns.iter() {
            if lowered.contains(pattern) {
                return Ok(embedding.clone());
            }
        }
        drop(patterns);

        Ok(self.fixed_embedding.clone())
    }
}

// =============================================================================
// Mock PDF Fetcher
// =============================================================================

pub struct MockPdfFetcher {
    // URL -> body; unknown URLs fail like a 404
    documents: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl MockPdfFetcher {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pdf(self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.documents.lock().unwrap().insert(url.into(), bytes.into());
        self
    }

    /// Swap the body behind a URL (a manufacturer re-published the datasheet).
    pub fn replace_pdf(&self, url: &str, bytes: impl Into<Vec<u8>>) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), bytes.into());
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockPdfFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePdfFetcher for MockPdfFetcher {
    async fn fetch_first(&self, urls: &[String]) -> Result<DownloadedPdf> {
        self.calls.lock().unwrap().push(urls.to_vec());

        let documents = self.documents.lock().unwrap();
        for url in urls {
            if let Some(bytes) = documents.get(url) {
                return Ok(DownloadedPdf {
                    url: url.clone(),
                    bytes: bytes.clone(),
                    sha256: content_hash(bytes),
                    content_type: Some("application/pdf".to_string()),
                });
            }
        }
        Err(ScrapeError::Status {
            url: urls.first().cloned().unwrap_or_default(),
            status: 404,
        }
        .into())
    }
}

// =============================================================================
// Mock Product Sources
// =============================================================================

/// A catalogue that returns fixed listings.
pub struct MockProductSource {
    info: ManufacturerInfo,
    listings: Vec<ProductListing>,
}

impl MockProductSource {
    pub fn new(slug: &str, name: &str, listings: Vec<ProductListing>) -> Self {
        Self {
            info: ManufacturerInfo {
                slug: slug.to_string(),
                name: name.to_string(),
                website: format!("https://www.{}.example/", slug),
                country: "HU".to_string(),
            },
            listings,
        }
    }
}

#[async_trait]
impl ProductSource for MockProductSource {
    fn manufacturer(&self) -> ManufacturerInfo {
        self.info.clone()
    }

    async fn discover(
        &self,
        options: &DiscoverOptions,
    ) -> manufacturer_scrapers::Result<Vec<ProductListing>> {
        Ok(self
            .listings
            .iter()
            .take(options.max_products)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockSourceRegistry {
    sources: HashMap<String, Arc<dyn ProductSource>>,
}

impl MockSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: MockProductSource) -> Self {
        self.sources.insert(source.info.slug.clone(), Arc::new(source));
        self
    }
}

impl BaseSourceRegistry for MockSourceRegistry {
    fn source_for(&self, slug: &str) -> Result<Arc<dyn ProductSource>> {
        let slug = slug.trim().to_lowercase();
        self.sources
            .get(&slug)
            .cloned()
            .ok_or_else(|| ScrapeError::UnknownManufacturer(slug).into())
    }

    fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.sources.keys().cloned().collect();
        slugs.sort();
        slugs
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Builder for a [`ServerDeps`] wired entirely to mocks.
pub struct TestDependencies {
    pub embedding_service: Option<Arc<MockEmbeddingService>>,
    pub pdf_fetcher: Arc<MockPdfFetcher>,
    pub sources: Arc<MockSourceRegistry>,
    pub orchestrator: Orchestrator,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            embedding_service: Some(Arc::new(MockEmbeddingService::new())),
            pdf_fetcher: Arc::new(MockPdfFetcher::new()),
            sources: Arc::new(MockSourceRegistry::new()),
            orchestrator: Orchestrator::new(OrchestratorConfig::default()),
        }
    }

    pub fn with_embeddings(mut self, service: MockEmbeddingService) -> Self {
        self.embedding_service = Some(Arc::new(service));
        self
    }

    pub fn without_embeddings(mut self) -> Self {
        self.embedding_service = None;
        self
    }

    pub fn with_pdf_fetcher(mut self, fetcher: MockPdfFetcher) -> Self {
        self.pdf_fetcher = Arc::new(fetcher);
        self
    }

    pub fn with_sources(mut self, sources: MockSourceRegistry) -> Self {
        self.sources = Arc::new(sources);
        self
    }

    pub fn with_orchestrator(mut self, orchestrator: Orchestrator) -> Self {
        self.orchestrator = orchestrator;
        self
    }

    pub fn into_server_deps(self, pool: PgPool) -> ServerDeps {
        ServerDeps::new(
            pool,
            self.embedding_service
                .map(|s| s as Arc<dyn BaseEmbeddingService>),
            self.pdf_fetcher,
            self.sources,
            Arc::new(self.orchestrator),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
