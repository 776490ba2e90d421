//! Executes queued catalog commands.

use async_trait::async_trait;
use manufacturer_scrapers::ScrapeError;
use spec_extraction::ExtractionError;
use tracing::info;

use crate::domains::catalog::activities::{embed_product, extract_product, scrape_manufacturer};
use crate::kernel::jobs::{ClaimedJob, JobCommand, JobFailure, JobHandler};
use crate::kernel::ServerDeps;

pub struct CatalogJobHandler {
    deps: ServerDeps,
}

impl CatalogJobHandler {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl JobHandler for CatalogJobHandler {
    async fn handle(&self, job: &ClaimedJob) -> Result<(), JobFailure> {
        let command: JobCommand = job.deserialize().map_err(JobFailure::Permanent)?;

        match command {
            JobCommand::ScrapeManufacturer { slug, max_products } => {
                let summary = scrape_manufacturer(&slug, max_products, &self.deps)
                    .await
                    .map_err(classify)?;
                info!(job_id = %job.id, slug = %slug, queued = summary.extractions_queued, "Scrape job done");
            }
            JobCommand::ExtractProduct { product_id, force } => {
                let outcome = extract_product(product_id, force, &self.deps)
                    .await
                    .map_err(classify)?;
                info!(job_id = %job.id, product_id = %product_id, outcome = ?outcome, "Extract job done");
            }
            JobCommand::EmbedProduct { product_id } => {
                let outcome = embed_product(product_id, &self.deps)
                    .await
                    .map_err(classify)?;
                info!(job_id = %job.id, product_id = %product_id, outcome = ?outcome, "Embed job done");
            }
        }

        Ok(())
    }
}

fn classify(error: anyhow::Error) -> JobFailure {
    if is_permanent(&error) {
        JobFailure::Permanent(error)
    } else {
        JobFailure::Retryable(error)
    }
}

/// Errors another attempt would reproduce exactly.
pub fn is_permanent(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<ScrapeError>() {
            return matches!(
                e,
                ScrapeError::UnknownManufacturer(_)
                    | ScrapeError::Security(_)
                    | ScrapeError::NotPdf { .. }
                    | ScrapeError::TooLarge { .. }
                    | ScrapeError::Status { status: 404 | 410, .. }
            );
        }
        if let Some(e) = cause.downcast_ref::<ExtractionError>() {
            return matches!(
                e,
                ExtractionError::InvalidDocument { .. } | ExtractionError::NoStrategies
            );
        }
        false
    })
}
