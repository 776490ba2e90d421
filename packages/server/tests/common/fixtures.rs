//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use anyhow::Result;
use manufacturer_scrapers::ProductListing;
use materials_core::common::{CategoryId, ManufacturerId};
use materials_core::domains::catalog::models::{
    Category, CategoryInput, Manufacturer, ManufacturerInput, Product, ProductInput,
};
use spec_extraction::testing::StaticStrategy;
use spec_extraction::{FieldCandidate, FieldValue, Orchestrator, OrchestratorConfig, SpecField, StrategyKind, Unit};
use sqlx::PgPool;

pub async fn create_manufacturer(pool: &PgPool, name: &str) -> Result<Manufacturer> {
    Manufacturer::create(
        ManufacturerInput {
            name: name.to_string(),
            website: Some(format!("https://www.{}.example/", name.to_lowercase())),
        },
        pool,
    )
    .await
}

pub async fn create_category(
    pool: &PgPool,
    name: &str,
    parent_id: Option<CategoryId>,
) -> Result<Category> {
    Category::create(
        CategoryInput {
            name: name.to_string(),
            parent_id,
        },
        pool,
    )
    .await
}

pub async fn create_product(
    pool: &PgPool,
    manufacturer_id: ManufacturerId,
    name: &str,
    pdf_url: Option<&str>,
) -> Result<Product> {
    Product::create(
        ProductInput {
            manufacturer_id,
            category_id: None,
            name: name.to_string(),
            price: None,
            technical_specs: None,
            source_url: format!("https://catalog.example/{}", name.to_lowercase().replace(' ', "-")),
            pdf_url: pdf_url.map(str::to_string),
        },
        pool,
    )
    .await
}

/// A listing with one datasheet under `Hőszigetelés > Homlokzat`.
pub fn insulation_listing(name: &str, pdf_url: &str) -> ProductListing {
    ProductListing::new(
        name,
        format!("https://www.rockwool.example/products/{}/", name.to_lowercase().replace(' ', "-")),
    )
    .with_category_path(vec!["Hőszigetelés".to_string(), "Homlokzat".to_string()])
    .with_pdf_urls(vec![pdf_url.to_string()])
}

/// Orchestrator whose only strategy "reads" a mineral-wool datasheet.
pub fn mineral_wool_orchestrator() -> Orchestrator {
    let candidates = vec![
        FieldCandidate::new(
            SpecField::ThermalConductivity,
            FieldValue::number(0.036, Some(Unit::WattPerMetreKelvin)),
            0.9,
            StrategyKind::TextLayer,
        ),
        FieldCandidate::new(
            SpecField::Density,
            FieldValue::number(90.0, Some(Unit::KilogramPerCubicMetre)),
            0.9,
            StrategyKind::TextLayer,
        ),
        FieldCandidate::new(
            SpecField::FireClass,
            FieldValue::text("A1"),
            0.9,
            StrategyKind::TextLayer,
        ),
    ];

    Orchestrator::new(OrchestratorConfig::default()).with_strategy(
        StaticStrategy::new(StrategyKind::TextLayer, candidates)
            .with_text("Frontrock MAX E kőzetgyapot homlokzati hőszigetelő lemez"),
    )
}
