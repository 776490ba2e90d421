//! Scrape, extract, embed and search end to end against mocked sources.
//!
//! Requires Docker: `cargo test -- --ignored`

mod common;

use std::sync::Arc;

use materials_core::domains::catalog::activities::{
    embed_product, extract_product, scrape_manufacturer, EmbedOutcome, ExtractOutcome,
};
use materials_core::domains::catalog::models::{Category, ExtractionRun, Product};
use materials_core::domains::chat::{chat_search, ChatSearchRequest, SearchMode};
use materials_core::kernel::test_dependencies::{
    MockEmbeddingService, MockPdfFetcher, MockProductSource, MockSourceRegistry, MINIMAL_PDF,
};
use materials_core::kernel::{ServerDeps, TestDependencies};

use crate::common::{
    create_manufacturer, create_product, insulation_listing, mineral_wool_orchestrator,
    TestHarness,
};

const FRONTROCK_PDF: &str = "https://www.rockwool.example/pdf/frontrock-max-e.pdf";

async fn count_jobs(job_type: &str, deps: &ServerDeps) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs WHERE job_type = $1")
        .bind(job_type)
        .fetch_one(&deps.db_pool)
        .await
        .unwrap()
}

fn rockwool_deps(
    harness: &TestHarness,
    test_deps: TestDependencies,
) -> (ServerDeps, Arc<MockPdfFetcher>) {
    let source = MockProductSource::new(
        "rockwool",
        "ROCKWOOL",
        vec![
            insulation_listing("Frontrock MAX E", FRONTROCK_PDF),
            insulation_listing("Airrock HD", "https://www.rockwool.example/pdf/missing.pdf"),
        ],
    );
    let test_deps = test_deps
        .with_sources(MockSourceRegistry::new().with_source(source))
        .with_pdf_fetcher(MockPdfFetcher::new().with_pdf(FRONTROCK_PDF, MINIMAL_PDF))
        .with_orchestrator(mineral_wool_orchestrator());
    let fetcher = test_deps.pdf_fetcher.clone();
    (harness.deps(test_deps), fetcher)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn scrape_creates_catalogue_and_queues_extraction() {
    let harness = TestHarness::new().await.unwrap();
    let (deps, _) = rockwool_deps(&harness, TestDependencies::new());

    let summary = scrape_manufacturer("rockwool", None, &deps).await.unwrap();

    assert!(summary.manufacturer_id.is_some());
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.upserted, 2);
    assert_eq!(summary.extractions_queued, 1);
    assert_eq!(summary.failed, 1, "missing datasheet counts as a failed download");

    let names: Vec<String> = Category::find_all(&deps.db_pool)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Hőszigetelés".to_string()));
    assert!(names.contains(&"Homlokzat".to_string()));

    assert_eq!(count_jobs("extract_product", &deps).await, 1);

    // Capped discovery only sees the first listing
    let capped = scrape_manufacturer("rockwool", Some(1), &deps).await.unwrap();
    assert_eq!(capped.discovered, 1);
    assert_eq!(Product::count(&deps.db_pool).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn extraction_stores_golden_record_and_skips_unchanged_pdf() {
    let harness = TestHarness::new().await.unwrap();
    let (deps, fetcher) = rockwool_deps(&harness, TestDependencies::new());
    scrape_manufacturer("rockwool", None, &deps).await.unwrap();

    let product = Product::keyword_search("Frontrock", 1, &deps.db_pool)
        .await
        .unwrap()
        .remove(0);

    let outcome = extract_product(product.id, false, &deps).await.unwrap();
    let ExtractOutcome::Extracted { fields, conflicts, .. } = outcome else {
        panic!("expected an extraction, got {:?}", outcome);
    };
    assert_eq!(fields, 3);
    assert_eq!(conflicts, 0);

    let stored = Product::find_by_id(product.id, &deps.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.technical_specs["fire_class"]["display"], "A1");
    assert!(stored.technical_specs.get("thermal_conductivity").is_some());
    assert!(stored.pdf_sha256.is_some());
    assert!(stored.extraction_confidence.unwrap_or_default() > 0.0);
    assert!(stored
        .full_text_content
        .as_deref()
        .unwrap_or_default()
        .contains("kőzetgyapot"));

    let runs = ExtractionRun::find_for_product(product.id, &deps.db_pool)
        .await
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(count_jobs("embed_product", &deps).await, 1);

    // Same bytes: nothing to do unless forced
    assert_eq!(
        extract_product(product.id, false, &deps).await.unwrap(),
        ExtractOutcome::Unchanged
    );
    assert!(matches!(
        extract_product(product.id, true, &deps).await.unwrap(),
        ExtractOutcome::Extracted { .. }
    ));

    // A re-scrape with the same datasheet leaves it alone
    let rescrape = scrape_manufacturer("rockwool", None, &deps).await.unwrap();
    assert_eq!(rescrape.unchanged, 1);
    assert_eq!(rescrape.extractions_queued, 0);

    // A republished datasheet is picked up again
    let mut revised = MINIMAL_PDF.to_vec();
    revised.extend_from_slice(b"% revision 2\n");
    fetcher.replace_pdf(FRONTROCK_PDF, revised);
    let rescrape = scrape_manufacturer("rockwool", None, &deps).await.unwrap();
    assert_eq!(rescrape.extractions_queued, 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn extraction_outcomes_for_incomplete_products() {
    let harness = TestHarness::new().await.unwrap();
    let (deps, _) = rockwool_deps(&harness, TestDependencies::new());
    let manufacturer = create_manufacturer(&deps.db_pool, "Leier").await.unwrap();
    let no_pdf = create_product(&deps.db_pool, manufacturer.id, "Leier Zsalukő", None)
        .await
        .unwrap();

    assert_eq!(
        extract_product(no_pdf.id, false, &deps).await.unwrap(),
        ExtractOutcome::NoDatasheet
    );

    Product::delete(no_pdf.id, &deps.db_pool).await.unwrap();
    assert_eq!(
        extract_product(no_pdf.id, false, &deps).await.unwrap(),
        ExtractOutcome::ProductMissing
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn embedding_is_refreshed_only_when_text_changes() {
    let harness = TestHarness::new().await.unwrap();
    let (deps, _) = rockwool_deps(&harness, TestDependencies::new());
    let manufacturer = create_manufacturer(&deps.db_pool, "Baumit").await.unwrap();
    let product = create_product(&deps.db_pool, manufacturer.id, "Baumit StarContact", None)
        .await
        .unwrap();

    assert_eq!(
        embed_product(product.id, &deps).await.unwrap(),
        EmbedOutcome::Embedded
    );
    assert_eq!(
        embed_product(product.id, &deps).await.unwrap(),
        EmbedOutcome::Unchanged
    );
    assert!(Product::find_needing_embedding(10, &deps.db_pool)
        .await
        .unwrap()
        .is_empty());

    let (disabled, _) = rockwool_deps(&harness, TestDependencies::new().without_embeddings());
    assert_eq!(
        embed_product(product.id, &disabled).await.unwrap(),
        EmbedOutcome::Disabled
    );
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn chat_search_prefers_vectors_and_falls_back_to_keywords() {
    let harness = TestHarness::new().await.unwrap();
    let (deps, _) = rockwool_deps(&harness, TestDependencies::new());
    scrape_manufacturer("rockwool", None, &deps).await.unwrap();
    let product = Product::keyword_search("Frontrock", 1, &deps.db_pool)
        .await
        .unwrap()
        .remove(0);
    extract_product(product.id, false, &deps).await.unwrap();
    embed_product(product.id, &deps).await.unwrap();

    let request = ChatSearchRequest {
        query: "homlokzati kőzetgyapot".to_string(),
        limit: None,
    };
    let vector = chat_search(request, &deps).await.unwrap();
    assert_eq!(vector.mode, SearchMode::Vector);
    assert_eq!(vector.results[0].product_id, product.id);
    assert_eq!(vector.results[0].manufacturer.as_deref(), Some("ROCKWOOL"));
    assert!(vector.results[0].similarity.is_some());
    assert!(vector.answer.contains("Frontrock MAX E (ROCKWOOL)"));

    // Provider outage: the full-text index answers instead
    let (outage, _) = rockwool_deps(
        &harness,
        TestDependencies::new()
            .with_embeddings(MockEmbeddingService::new().failing("rate limited")),
    );
    let keyword = chat_search(
        ChatSearchRequest {
            query: "Frontrock".to_string(),
            limit: Some(3),
        },
        &outage,
    )
    .await
    .unwrap();
    assert_eq!(keyword.mode, SearchMode::Keyword);
    assert_eq!(keyword.results.len(), 1);
    assert!(keyword.results[0].similarity.is_none());
    assert!(keyword.results[0]
        .key_specs
        .iter()
        .any(|line| line.contains("A1")));

    let nothing = chat_search(
        ChatSearchRequest {
            query: "parketta".to_string(),
            limit: None,
        },
        &outage,
    )
    .await
    .unwrap();
    assert!(nothing.results.is_empty());
    assert_eq!(nothing.answer, "No products matched \"parketta\".");
}
