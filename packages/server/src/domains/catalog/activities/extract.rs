//! Datasheet extraction for one product.

use anyhow::{Context, Result};
use serde::Serialize;
use spec_extraction::PdfDocument;
use tracing::{info, instrument, warn};

use crate::common::{ExtractionRunId, ProductId};
use crate::domains::catalog::models::{ExtractedSpecs, ExtractionRun, Product};
use crate::kernel::jobs::JobCommand;
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExtractOutcome {
    Extracted {
        run_id: ExtractionRunId,
        fields: usize,
        conflicts: usize,
        overall_confidence: f32,
        needs_review: bool,
    },
    /// Same datasheet bytes as the last extraction
    Unchanged,
    NoDatasheet,
    ProductMissing,
}

/// Download the product's datasheet, run the strategy orchestrator and
/// store the golden record.
///
/// Unless `force` is set, a datasheet whose sha256 matches the last
/// extraction is left alone.
#[instrument(skip(deps), fields(product_id = %product_id))]
pub async fn extract_product(
    product_id: ProductId,
    force: bool,
    deps: &ServerDeps,
) -> Result<ExtractOutcome> {
    let Some(product) = Product::find_by_id(product_id, &deps.db_pool).await? else {
        warn!("Product disappeared before extraction");
        return Ok(ExtractOutcome::ProductMissing);
    };

    let Some(pdf_url) = product.pdf_url.clone() else {
        info!("Product has no datasheet");
        return Ok(ExtractOutcome::NoDatasheet);
    };

    // 1. Download
    let pdf = deps
        .pdf_fetcher
        .fetch_first(&[pdf_url])
        .await
        .context("Failed to download datasheet")?;

    if !force && product.pdf_sha256.as_deref() == Some(pdf.sha256.as_str()) {
        info!(sha256 = %pdf.sha256, "Datasheet unchanged since last extraction");
        return Ok(ExtractOutcome::Unchanged);
    }

    // 2. Run the strategies
    let document = PdfDocument::from_bytes(pdf.bytes, pdf.url.clone())?;
    let result = deps.orchestrator.run(&document).await?;

    // 3. Persist the run and the golden values
    let run = ExtractionRun::create(product.id, &result, &deps.db_pool).await?;
    Product::record_extraction(
        product.id,
        ExtractedSpecs {
            technical_specs: result.golden.to_spec_map(),
            full_text_content: result.best_text.clone(),
            extraction_confidence: result.golden.overall_confidence,
            pdf_url: pdf.url,
            pdf_sha256: pdf.sha256,
        },
        &deps.db_pool,
    )
    .await?;

    info!(
        run_id = %run.id,
        fields = result.golden.fields.len(),
        conflicts = result.golden.conflicts.len(),
        confidence = result.golden.overall_confidence,
        cost = result.total_cost,
        tier = ?result.tier_reached,
        "Extraction stored"
    );

    // 4. Refresh the search embedding
    if deps.embedding_service.is_some() {
        deps.jobs
            .enqueue(&JobCommand::EmbedProduct { product_id })
            .await?;
    }

    Ok(ExtractOutcome::Extracted {
        run_id: run.id,
        fields: result.golden.fields.len(),
        conflicts: result.golden.conflicts.len(),
        overall_confidence: result.golden.overall_confidence,
        needs_review: result.needs_review,
    })
}
