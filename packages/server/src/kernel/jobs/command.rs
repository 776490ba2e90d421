use serde::{Deserialize, Serialize};

use super::queue::CommandMeta;
use crate::common::ProductId;

/// Background work the pipeline schedules for itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum JobCommand {
    /// Walk a manufacturer catalogue and upsert its products
    ScrapeManufacturer {
        slug: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_products: Option<usize>,
    },

    /// Download the datasheet and run the extraction orchestrator
    ExtractProduct {
        product_id: ProductId,
        /// Re-run even when the PDF hash is unchanged
        #[serde(default)]
        force: bool,
    },

    /// Refresh the product's vector-store entry
    EmbedProduct { product_id: ProductId },
}

impl CommandMeta for JobCommand {
    fn command_type(&self) -> &'static str {
        match self {
            JobCommand::ScrapeManufacturer { .. } => "scrape_manufacturer",
            JobCommand::ExtractProduct { .. } => "extract_product",
            JobCommand::EmbedProduct { .. } => "embed_product",
        }
    }

    fn idempotency_key(&self) -> Option<String> {
        Some(match self {
            JobCommand::ScrapeManufacturer { slug, .. } => {
                format!("scrape:{}", slug.trim().to_lowercase())
            }
            JobCommand::ExtractProduct { product_id, .. } => format!("extract:{}", product_id),
            JobCommand::EmbedProduct { product_id } => format!("embed:{}", product_id),
        })
    }

    fn max_attempts(&self) -> i32 {
        match self {
            JobCommand::ScrapeManufacturer { .. } => 2,
            JobCommand::ExtractProduct { .. } => 3,
            // Embedding failures are almost always rate limits
            JobCommand::EmbedProduct { .. } => 5,
        }
    }
}
