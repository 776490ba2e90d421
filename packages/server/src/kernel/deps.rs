//! Server dependencies for activities (using traits for testability)
//!
//! The central container handed to every activity and route. External
//! services sit behind the `Base*` traits so tests can swap in mocks.

use std::sync::Arc;

use anyhow::Result;
use llm_client::LlmClient;
use manufacturer_scrapers::SourceConfig;
use secrecy::ExposeSecret;
use spec_extraction::Orchestrator;
use sqlx::PgPool;

use crate::config::Config;
use crate::kernel::ai::{HttpPdfFetcher, OpenAiEmbeddings, ScraperRegistry};
use crate::kernel::extraction::build_orchestrator;
use crate::kernel::jobs::PostgresJobQueue;
use crate::kernel::{BaseEmbeddingService, BasePdfFetcher, BaseSourceRegistry};

/// Requests per second against one manufacturer site.
const SCRAPE_RATE: u32 = 2;

#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub jobs: PostgresJobQueue,
    /// None without an API key: embedding jobs are skipped and chat
    /// search answers from keyword matches.
    pub embedding_service: Option<Arc<dyn BaseEmbeddingService>>,
    pub pdf_fetcher: Arc<dyn BasePdfFetcher>,
    pub sources: Arc<dyn BaseSourceRegistry>,
    pub orchestrator: Arc<Orchestrator>,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        embedding_service: Option<Arc<dyn BaseEmbeddingService>>,
        pdf_fetcher: Arc<dyn BasePdfFetcher>,
        sources: Arc<dyn BaseSourceRegistry>,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            jobs: PostgresJobQueue::new(db_pool.clone()),
            db_pool,
            embedding_service,
            pdf_fetcher,
            sources,
            orchestrator,
        }
    }

    /// Production wiring from the environment.
    pub fn from_config(db_pool: PgPool, config: &Config) -> Result<Self> {
        let llm = config.openai_api_key.as_ref().map(|key| {
            let client = LlmClient::new(key.expose_secret().to_string());
            match &config.llm_base_url {
                Some(url) => client.with_base_url(url.clone()),
                None => client,
            }
        });

        let embedding_service = llm.clone().map(|client| {
            Arc::new(OpenAiEmbeddings::new(client, config.embedding_model.clone()))
                as Arc<dyn BaseEmbeddingService>
        });

        let orchestrator = Arc::new(build_orchestrator(config, llm));
        let sources = SourceConfig::default().with_requests_per_second(SCRAPE_RATE);

        Ok(Self::new(
            db_pool,
            embedding_service,
            Arc::new(HttpPdfFetcher::new(SCRAPE_RATE)?),
            Arc::new(ScraperRegistry::new(sources)),
            orchestrator,
        ))
    }
}
