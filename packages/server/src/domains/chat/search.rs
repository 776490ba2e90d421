//! Retrieval-backed product search for the chat endpoint.
//!
//! The query is embedded and matched against product embeddings. When the
//! embedding call fails, or nothing clears the similarity threshold, the
//! full-text index answers instead.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::common::{ManufacturerId, ProductId};
use crate::domains::catalog::activities::spec_lines;
use crate::domains::catalog::models::{Manufacturer, Product, ProductEmbedding};
use crate::domains::catalog::CatalogError;
use crate::kernel::ServerDeps;

pub const DEFAULT_RESULT_LIMIT: usize = 5;
pub const MAX_RESULT_LIMIT: usize = 20;

/// Minimum cosine similarity for a semantic match.
pub const SIMILARITY_THRESHOLD: f32 = 0.3;

/// Specs quoted per product in the answer.
const KEY_SPECS_PER_PRODUCT: usize = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatSearchRequest {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ChatSearchRequest {
    /// Trimmed query and a limit clamped to `1..=MAX_RESULT_LIMIT`.
    pub fn validate(&self) -> Result<(String, usize), CatalogError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(CatalogError::Validation("query is required".to_string()));
        }
        let limit = self
            .limit
            .unwrap_or(DEFAULT_RESULT_LIMIT)
            .clamp(1, MAX_RESULT_LIMIT);
        Ok((query.to_string(), limit))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Vector,
    Keyword,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMatch {
    pub product_id: ProductId,
    pub name: String,
    pub manufacturer: Option<String>,
    /// Cosine similarity; absent for keyword matches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    pub key_specs: Vec<String>,
    pub source_url: String,
    pub pdf_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSearchResponse {
    pub query: String,
    pub mode: SearchMode,
    pub answer: String,
    pub results: Vec<ChatMatch>,
}

#[instrument(skip(deps, request), fields(query = %request.query))]
pub async fn chat_search(request: ChatSearchRequest, deps: &ServerDeps) -> Result<ChatSearchResponse> {
    let (query, limit) = request.validate()?;

    let (mode, ranked) = match vector_matches(&query, limit, deps).await {
        Some(ranked) if !ranked.is_empty() => (SearchMode::Vector, ranked),
        _ => {
            let products = Product::keyword_search(&query, limit as i64, &deps.db_pool).await?;
            let ranked = products.into_iter().map(|p| (p, None)).collect();
            (SearchMode::Keyword, ranked)
        }
    };

    let manufacturers: HashMap<ManufacturerId, String> = Manufacturer::find_all(&deps.db_pool)
        .await?
        .into_iter()
        .map(|m| (m.id, m.name))
        .collect();

    let results: Vec<ChatMatch> = ranked
        .into_iter()
        .map(|(product, similarity)| ChatMatch {
            product_id: product.id,
            manufacturer: manufacturers.get(&product.manufacturer_id).cloned(),
            similarity,
            key_specs: spec_lines(&product.technical_specs)
                .into_iter()
                .take(KEY_SPECS_PER_PRODUCT)
                .collect(),
            name: product.name,
            source_url: product.source_url,
            pdf_url: product.pdf_url,
        })
        .collect();

    info!(mode = ?mode, results = results.len(), "Chat search answered");

    Ok(ChatSearchResponse {
        answer: compose_answer(&query, &results),
        query,
        mode,
        results,
    })
}

/// Products ranked by similarity, or None when the vector path is unavailable.
async fn vector_matches(
    query: &str,
    limit: usize,
    deps: &ServerDeps,
) -> Option<Vec<(Product, Option<f64>)>> {
    let service = deps.embedding_service.as_ref()?;

    let embedding = match service.generate(query).await {
        Ok(embedding) => embedding,
        Err(e) => {
            warn!(error = %e, "Query embedding failed, falling back to keyword search");
            return None;
        }
    };

    let hits = match ProductEmbedding::search_similar(
        &embedding,
        SIMILARITY_THRESHOLD,
        limit as i64,
        &deps.db_pool,
    )
    .await
    {
        Ok(hits) => hits,
        Err(e) => {
            warn!(error = %e, "Similarity search failed, falling back to keyword search");
            return None;
        }
    };

    let ids: Vec<ProductId> = hits.iter().map(|(id, _)| *id).collect();
    let products = match Product::find_by_ids(&ids, &deps.db_pool).await {
        Ok(products) => products,
        Err(e) => {
            warn!(error = %e, "Loading matched products failed");
            return None;
        }
    };

    let mut by_id: HashMap<ProductId, Product> = products.into_iter().map(|p| (p.id, p)).collect();
    Some(
        hits.into_iter()
            .filter_map(|(id, similarity)| by_id.remove(&id).map(|p| (p, Some(similarity))))
            .collect(),
    )
}

/// Plain-text answer listing each match with its key specs.
pub fn compose_answer(query: &str, results: &[ChatMatch]) -> String {
    if results.is_empty() {
        return format!("No products matched \"{}\".", query);
    }

    let noun = if results.len() == 1 { "product" } else { "products" };
    let mut answer = format!("Found {} {} for \"{}\":", results.len(), noun, query);
    for (i, result) in results.iter().enumerate() {
        answer.push_str(&format!("\n{}. {}", i + 1, result.name));
        if let Some(manufacturer) = &result.manufacturer {
            answer.push_str(&format!(" ({})", manufacturer));
        }
        if !result.key_specs.is_empty() {
            answer.push_str(&format!(": {}", result.key_specs.join("; ")));
        }
    }
    answer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(name: &str, manufacturer: Option<&str>, specs: &[&str]) -> ChatMatch {
        ChatMatch {
            product_id: ProductId::new(),
            name: name.to_string(),
            manufacturer: manufacturer.map(str::to_string),
            similarity: Some(0.8),
            key_specs: specs.iter().map(|s| s.to_string()).collect(),
            source_url: "https://www.baumit.hu/termekek/".to_string(),
            pdf_url: None,
        }
    }

    #[test]
    fn test_validate_clamps_limit() {
        let request = ChatSearchRequest {
            query: "  homlokzati hőszigetelés ".to_string(),
            limit: Some(500),
        };
        let (query, limit) = request.validate().unwrap();
        assert_eq!(query, "homlokzati hőszigetelés");
        assert_eq!(limit, MAX_RESULT_LIMIT);

        let request = ChatSearchRequest {
            query: "vakolat".to_string(),
            limit: None,
        };
        assert_eq!(request.validate().unwrap().1, DEFAULT_RESULT_LIMIT);

        let request = ChatSearchRequest {
            query: "vakolat".to_string(),
            limit: Some(0),
        };
        assert_eq!(request.validate().unwrap().1, 1);
    }

    #[test]
    fn test_validate_rejects_blank_query() {
        let request = ChatSearchRequest {
            query: "   ".to_string(),
            limit: None,
        };
        assert!(matches!(request.validate(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_answer_lists_products_with_specs() {
        let results = vec![
            hit("Frontrock MAX E", Some("ROCKWOOL"), &["Bulk density: 90 kg/m³", "Reaction to fire (Euroclass): A1"]),
            hit("Baumit StarContact", None, &[]),
        ];

        let answer = compose_answer("homlokzat", &results);

        assert_eq!(
            answer,
            "Found 2 products for \"homlokzat\":\n\
             1. Frontrock MAX E (ROCKWOOL): Bulk density: 90 kg/m³; Reaction to fire (Euroclass): A1\n\
             2. Baumit StarContact"
        );
    }

    #[test]
    fn test_answer_without_results() {
        assert_eq!(compose_answer("tégla", &[]), "No products matched \"tégla\".");
    }
}
