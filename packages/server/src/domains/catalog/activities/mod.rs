//! Catalog activities
//!
//! Business logic run by the job workers and the admin routes.

pub mod embed;
pub mod extract;
pub mod scrape;

pub use embed::{embed_product, embedding_text, spec_lines, EmbedOutcome};
pub use extract::{extract_product, ExtractOutcome};
pub use scrape::{queue_extraction, scrape_manufacturer, ScrapeSummary};
