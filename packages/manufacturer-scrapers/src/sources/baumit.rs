//! BAUMIT adapter.
//!
//! The catalogue is served by a JSON listing endpoint paged with
//! `page`/`pageSize`.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::http::HttpFetcher;
use crate::links::{is_pdf_link, resolve};
use crate::source::ProductSource;
use crate::types::{parse_price, DiscoverOptions, ManufacturerInfo, ProductListing};

pub const DEFAULT_BASE_URL: &str = "https://baumit.hu/";

const DEFAULT_PAGE_SIZE: usize = 48;

/// One page of the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    #[serde(default, alias = "products", alias = "results")]
    pub items: Vec<ApiProduct>,

    #[serde(default, alias = "pageCount")]
    pub total_pages: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
    #[serde(alias = "title")]
    pub name: String,

    #[serde(alias = "link", alias = "detailUrl")]
    pub url: String,

    #[serde(default, alias = "categoryPath")]
    pub categories: Vec<String>,

    #[serde(default, alias = "downloads", alias = "files")]
    pub documents: Vec<ApiDocument>,

    #[serde(default)]
    pub price: Option<serde_json::Value>,

    #[serde(default, alias = "shortDescription")]
    pub description: Option<String>,

    #[serde(default, alias = "articleNumber")]
    pub sku: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiDocument {
    #[serde(alias = "href", alias = "file")]
    pub url: String,
}

pub struct BaumitSource {
    base_url: Url,
    endpoint: String,
    page_size: usize,
    fetcher: HttpFetcher,
}

impl BaumitSource {
    pub fn new(fetcher: HttpFetcher) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, fetcher)
    }

    pub fn with_base_url(base_url: &str, fetcher: HttpFetcher) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| ScrapeError::Parse {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            endpoint: "api/products".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            fetcher,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn page_url(&self, page: usize) -> Result<Url> {
        let mut url = self.base_url.join(&self.endpoint).map_err(|e| ScrapeError::Parse {
            url: self.endpoint.clone(),
            message: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("pageSize", &self.page_size.to_string());
        Ok(url)
    }

    /// Turn one API item into a listing.
    pub fn to_listing(&self, product: ApiProduct) -> Option<ProductListing> {
        let product_url = resolve(&self.base_url, &product.url)?;
        let pdf_urls = product
            .documents
            .iter()
            .filter(|d| is_pdf_link(&d.url))
            .filter_map(|d| resolve(&self.base_url, &d.url))
            .collect();
        let price = product.price.as_ref().and_then(|p| match p {
            serde_json::Value::String(s) => parse_price(s),
            serde_json::Value::Number(n) => parse_price(&n.to_string()),
            _ => None,
        });

        let mut listing = ProductListing::new(product.name.trim(), product_url)
            .with_category_path(product.categories)
            .with_pdf_urls(pdf_urls)
            .with_price(price);
        listing.description = product.description;
        listing.sku = product.sku;
        Some(listing)
    }
}

#[async_trait]
impl ProductSource for BaumitSource {
    fn manufacturer(&self) -> ManufacturerInfo {
        ManufacturerInfo {
            slug: "baumit".into(),
            name: "BAUMIT".into(),
            website: self.base_url.to_string(),
            country: "HU".into(),
        }
    }

    async fn discover(&self, options: &DiscoverOptions) -> Result<Vec<ProductListing>> {
        let mut listings = Vec::new();
        let mut seen = HashSet::new();

        for page in 1..=options.max_pages {
            let url = self.page_url(page)?;
            let body: ListingPage = self.fetcher.get_json(url.as_str()).await?;
            let received = body.items.len();

            let mut fresh = 0;
            for product in body.items {
                if let Some(listing) = self.to_listing(product) {
                    if seen.insert(listing.product_url.clone()) {
                        listings.push(listing);
                        fresh += 1;
                    }
                }
            }
            debug!(page, received, fresh, "parsed BAUMIT listing page");

            let last_page = body.total_pages.is_some_and(|total| page >= total);
            if fresh == 0 || received < self.page_size || last_page {
                break;
            }
            if listings.len() >= options.max_products {
                break;
            }
        }

        listings.truncate(options.max_products);
        info!(products = listings.len(), "BAUMIT discovery complete");
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "products": [
            {"title": "Baumit StarContact", "link": "/termekek/starcontact",
             "categoryPath": ["Homlokzati hőszigetelő rendszerek", "Ragasztók"],
             "downloads": [
                {"href": "https://media.baumit.com/hu/starcontact-tda.pdf"},
                {"href": "/media/starcontact-muszaki-adatlap.pdf"},
                {"href": "/termekek/starcontact#video"}
             ],
             "price": "6 490 Ft", "articleNumber": "HU-1234"},
            {"name": "Baumit OpenTherm", "url": "https://baumit.hu/termekek/opentherm"}
        ],
        "pageCount": 3
    }"#;

    fn source() -> BaumitSource {
        BaumitSource::new(HttpFetcher::new(2).unwrap()).unwrap()
    }

    #[test]
    fn test_page_url() {
        let url = source().with_page_size(20).page_url(2).unwrap();
        assert_eq!(url.as_str(), "https://baumit.hu/api/products?page=2&pageSize=20");
    }

    #[test]
    fn test_listing_page_aliases() {
        let page: ListingPage = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, Some(3));

        let source = source();
        let mut items = page.items.into_iter();
        let star = source.to_listing(items.next().unwrap()).unwrap();
        assert_eq!(star.name, "Baumit StarContact");
        assert_eq!(star.product_url, "https://baumit.hu/termekek/starcontact");
        assert_eq!(star.category_path.len(), 2);
        assert_eq!(star.pdf_urls.len(), 2);
        assert_eq!(
            star.primary_pdf(),
            Some("https://baumit.hu/media/starcontact-muszaki-adatlap.pdf")
        );
        assert_eq!(star.price, Some(rust_decimal::Decimal::from(6490)));
        assert_eq!(star.sku.as_deref(), Some("HU-1234"));

        let open = source.to_listing(items.next().unwrap()).unwrap();
        assert!(open.pdf_urls.is_empty());
        assert!(open.category_path.is_empty());
    }
}
