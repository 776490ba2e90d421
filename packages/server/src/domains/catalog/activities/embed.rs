use anyhow::Result;
use serde::Serialize;
use spec_extraction::SpecField;
use tracing::{debug, info, instrument};

use crate::common::utils::generate_content_hash;
use crate::common::ProductId;
use crate::domains::catalog::models::{Category, Manufacturer, Product, ProductEmbedding};
use crate::kernel::ServerDeps;

/// Characters of datasheet text that go into the embedding input.
const MAX_FULL_TEXT_CHARS: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedOutcome {
    Embedded,
    Unchanged,
    /// No embedding provider configured
    Disabled,
    ProductMissing,
}

#[instrument(skip(deps), fields(product_id = %product_id))]
pub async fn embed_product(product_id: ProductId, deps: &ServerDeps) -> Result<EmbedOutcome> {
    let Some(service) = deps.embedding_service.as_ref() else {
        debug!("Embeddings disabled, skipping");
        return Ok(EmbedOutcome::Disabled);
    };

    let Some(product) = Product::find_by_id(product_id, &deps.db_pool).await? else {
        return Ok(EmbedOutcome::ProductMissing);
    };

    let manufacturer = Manufacturer::find_by_id(product.manufacturer_id, &deps.db_pool)
        .await?
        .map(|m| m.name);
    let category = match product.category_id {
        Some(id) => Category::find_by_id(id, &deps.db_pool).await?.map(|c| c.name),
        None => None,
    };

    let text = embedding_text(&product, manufacturer.as_deref(), category.as_deref());
    let hash = generate_content_hash(&text);

    if let Some(existing) = ProductEmbedding::find_by_product(product.id, &deps.db_pool).await? {
        if existing.content_hash == hash {
            ProductEmbedding::touch(product.id, &deps.db_pool).await?;
            debug!("Embedding input unchanged");
            return Ok(EmbedOutcome::Unchanged);
        }
    }

    let embedding = service.generate(&text).await?;
    ProductEmbedding::upsert(product.id, &embedding, &hash, &deps.db_pool).await?;

    info!(chars = text.len(), "Product embedding stored");
    Ok(EmbedOutcome::Embedded)
}

/// Text a product is embedded from: identity lines, resolved specs, then the
/// start of the datasheet text.
pub fn embedding_text(
    product: &Product,
    manufacturer: Option<&str>,
    category: Option<&str>,
) -> String {
    let mut lines = vec![product.name.clone()];
    if let Some(name) = manufacturer {
        lines.push(format!("Manufacturer: {}", name));
    }
    if let Some(name) = category {
        lines.push(format!("Category: {}", name));
    }
    lines.extend(spec_lines(&product.technical_specs));

    let mut text = lines.join("\n");
    if let Some(full_text) = product.full_text_content.as_deref() {
        let excerpt: String = full_text.chars().take(MAX_FULL_TEXT_CHARS).collect();
        let excerpt = excerpt.trim();
        if !excerpt.is_empty() {
            text.push_str("\n\n");
            text.push_str(excerpt);
        }
    }
    text
}

/// `label: display` for each stored spec, in field-catalogue order.
pub fn spec_lines(specs: &serde_json::Value) -> Vec<String> {
    let Some(map) = specs.as_object() else {
        return Vec::new();
    };

    let mut known: Vec<(usize, String)> = Vec::new();
    let mut other: Vec<String> = Vec::new();
    for (key, entry) in map {
        let Some(display) = spec_display(entry) else {
            continue;
        };
        match SpecField::from_key(key) {
            Some(field) => {
                let rank = SpecField::ALL.iter().position(|f| *f == field).unwrap_or(usize::MAX);
                known.push((rank, format!("{}: {}", field.label(), display)));
            }
            None => other.push(format!("{}: {}", key, display)),
        }
    }
    known.sort_by_key(|(rank, _)| *rank);
    other.sort();

    known.into_iter().map(|(_, line)| line).chain(other).collect()
}

/// Stored entries carry a `display` string; hand-entered specs may be bare values.
fn spec_display(entry: &serde_json::Value) -> Option<String> {
    match entry {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(obj) => match obj.get("display") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            _ => obj.get("value").and_then(spec_display),
        },
        other => Some(other.to_string()),
    }
}
