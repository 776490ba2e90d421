//! Catalogue scraping for one manufacturer.
//!
//! Walks the manufacturer's adapter, upserts what it finds and queues an
//! extraction for every product whose datasheet is new or has changed.

use anyhow::{Context, Result};
use manufacturer_scrapers::{DiscoverOptions, ProductListing};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::common::{ManufacturerId, ProductId};
use crate::domains::catalog::models::{Category, Manufacturer, Product, ScrapedProduct};
use crate::kernel::jobs::JobCommand;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeSummary {
    pub manufacturer_id: Option<ManufacturerId>,
    pub discovered: usize,
    pub upserted: usize,
    pub extractions_queued: usize,
    pub unchanged: usize,
    pub without_datasheet: usize,
    pub failed: usize,
}

/// What happened to a single listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListingOutcome {
    Queued,
    Unchanged,
    NoDatasheet,
    DownloadFailed,
}

impl ScrapeSummary {
    fn record(&mut self, outcome: ListingOutcome) {
        self.upserted += 1;
        match outcome {
            ListingOutcome::Queued => self.extractions_queued += 1,
            ListingOutcome::Unchanged => self.unchanged += 1,
            ListingOutcome::NoDatasheet => self.without_datasheet += 1,
            ListingOutcome::DownloadFailed => self.failed += 1,
        }
    }
}

/// Scrape a manufacturer's catalogue by adapter slug (`rockwool`, `leier`, `baumit`).
///
/// A listing that fails to persist is logged and counted; it never aborts
/// the rest of the catalogue.
#[instrument(skip(deps), fields(slug = %slug))]
pub async fn scrape_manufacturer(
    slug: &str,
    max_products: Option<usize>,
    deps: &ServerDeps,
) -> Result<ScrapeSummary> {
    let source = deps.sources.source_for(slug)?;
    let info = source.manufacturer();

    // 1. Manufacturer row, keyed by name
    let manufacturer =
        Manufacturer::upsert_by_name(&info.name, Some(&info.website), &deps.db_pool).await?;

    // 2. Discover listings
    let mut options = DiscoverOptions::default();
    if let Some(n) = max_products {
        options = options.with_max_products(n);
    }
    let listings = source
        .discover(&options)
        .await
        .with_context(|| format!("Failed to discover {} products", info.name))?;

    info!(
        manufacturer = %info.name,
        listings = listings.len(),
        "Discovered manufacturer catalogue"
    );

    let mut summary = ScrapeSummary {
        manufacturer_id: Some(manufacturer.id),
        discovered: listings.len(),
        ..Default::default()
    };

    // 3. Persist each listing and queue extraction where needed
    for listing in listings {
        let url = listing.product_url.clone();
        match process_listing(&manufacturer, listing, deps).await {
            Ok(outcome) => summary.record(outcome),
            Err(e) => {
                warn!(product_url = %url, error = %e, "Failed to store scraped product");
                summary.failed += 1;
            }
        }
    }

    info!(
        manufacturer = %info.name,
        upserted = summary.upserted,
        queued = summary.extractions_queued,
        unchanged = summary.unchanged,
        failed = summary.failed,
        "Scrape finished"
    );

    Ok(summary)
}

async fn process_listing(
    manufacturer: &Manufacturer,
    listing: ProductListing,
    deps: &ServerDeps,
) -> Result<ListingOutcome> {
    let category = Category::ensure_path(&listing.category_path, &deps.db_pool).await?;

    let product = Product::upsert_scraped(
        ScrapedProduct {
            manufacturer_id: manufacturer.id,
            category_id: category.map(|c| c.id),
            name: listing.name.clone(),
            price: listing.price,
            source_url: listing.product_url.clone(),
            pdf_url: listing.primary_pdf().map(str::to_string),
        },
        &deps.db_pool,
    )
    .await?;

    if listing.pdf_urls.is_empty() {
        debug!(product_id = %product.id, "No datasheet linked");
        return Ok(ListingOutcome::NoDatasheet);
    }

    let pdf = match deps.pdf_fetcher.fetch_first(&listing.pdf_urls).await {
        Ok(pdf) => pdf,
        Err(e) => {
            warn!(product_id = %product.id, error = %e, "Datasheet download failed");
            return Ok(ListingOutcome::DownloadFailed);
        }
    };

    if product.pdf_sha256.as_deref() == Some(pdf.sha256.as_str()) {
        debug!(product_id = %product.id, sha256 = %pdf.sha256, "Datasheet unchanged");
        return Ok(ListingOutcome::Unchanged);
    }

    queue_extraction(product.id, false, deps).await?;
    Ok(ListingOutcome::Queued)
}

/// Queue an extraction; a duplicate of a live job counts as queued.
pub async fn queue_extraction(product_id: ProductId, force: bool, deps: &ServerDeps) -> Result<()> {
    let result = deps
        .jobs
        .enqueue(&JobCommand::ExtractProduct { product_id, force })
        .await?;
    debug!(
        product_id = %product_id,
        job_id = %result.job_id(),
        created = result.is_created(),
        "Extraction queued"
    );
    Ok(())
}
