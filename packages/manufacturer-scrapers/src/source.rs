//! Source trait - a manufacturer catalogue we can discover products in.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DiscoverOptions, ManufacturerInfo, ProductListing};

/// One manufacturer's product catalogue.
///
/// Adapters own their selectors and fetcher; callers only see listings.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// The manufacturer this source scrapes.
    fn manufacturer(&self) -> ManufacturerInfo;

    /// Walk the catalogue and return product listings.
    ///
    /// Listings are unique by `product_url`.
    async fn discover(&self, options: &DiscoverOptions) -> Result<Vec<ProductListing>>;
}
