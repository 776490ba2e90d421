//! ROCKWOOL adapter.
//!
//! The catalogue pages are rendered client side; the product data ships in
//! an embedded JSON blob, either a Next.js `__NEXT_DATA__` script or a
//! `window.__INITIAL_STATE__ = {...};` assignment. We pull the blob out with
//! a regex and walk it for objects that look like products.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::http::HttpFetcher;
use crate::links::{is_pdf_link, resolve};
use crate::source::ProductSource;
use crate::types::{parse_price, DiscoverOptions, ManufacturerInfo, ProductListing};

pub const DEFAULT_BASE_URL: &str = "https://www.rockwool.com/hu/";

lazy_static! {
    static ref NEXT_DATA: Regex =
        Regex::new(r#"(?s)<script[^>]*id="__NEXT_DATA__"[^>]*>(.*?)</script>"#).unwrap();
    static ref INITIAL_STATE: Regex =
        Regex::new(r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.*?\})\s*;\s*</script>").unwrap();
}

const NAME_KEYS: &[&str] = &["name", "title", "productName"];
const URL_KEYS: &[&str] = &["url", "href", "path", "link", "slug"];
const CATEGORY_KEYS: &[&str] = &["categories", "category", "breadcrumbs", "application"];

pub struct RockwoolSource {
    base_url: Url,
    listing_paths: Vec<String>,
    fetcher: HttpFetcher,
}

impl RockwoolSource {
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
            listing_paths: vec!["termekek/".to_string()],
            fetcher,
        })
    }

    /// Catalogue pages to read, relative to the base URL.
    pub fn with_listing_paths(mut self, paths: Vec<String>) -> Self {
        self.listing_paths = paths;
        self
    }
}

#[async_trait]
impl ProductSource for RockwoolSource {
    fn manufacturer(&self) -> ManufacturerInfo {
        ManufacturerInfo {
            slug: "rockwool".into(),
            name: "ROCKWOOL".into(),
            website: self.base_url.to_string(),
            country: "HU".into(),
        }
    }

    async fn discover(&self, options: &DiscoverOptions) -> Result<Vec<ProductListing>> {
        let mut listings = Vec::new();
        let mut seen = HashSet::new();

        for path in self.listing_paths.iter().take(options.max_pages) {
            let page_url = self.base_url.join(path).map_err(|e| ScrapeError::Parse {
                url: path.clone(),
                message: e.to_string(),
            })?;
            let html = self.fetcher.get_text(page_url.as_str()).await?;

            let found = parse_listing(&html, &page_url)?;
            debug!(url = %page_url, products = found.len(), "parsed ROCKWOOL catalogue page");
            for listing in found {
                if seen.insert(listing.product_url.clone()) {
                    listings.push(listing);
                }
            }
            if listings.len() >= options.max_products {
                break;
            }
        }

        listings.truncate(options.max_products);
        info!(products = listings.len(), "ROCKWOOL discovery complete");
        Ok(listings)
    }
}

/// Pull the embedded state blob out of a catalogue page.
pub fn embedded_state(html: &str) -> Option<Value> {
    [&*NEXT_DATA, &*INITIAL_STATE].iter().find_map(|re| {
        let blob = re.captures(html)?.get(1)?.as_str();
        serde_json::from_str(blob.trim()).ok()
    })
}

/// Parse a catalogue page into listings.
pub fn parse_listing(html: &str, page_url: &Url) -> Result<Vec<ProductListing>> {
    let state = embedded_state(html).ok_or_else(|| ScrapeError::Parse {
        url: page_url.to_string(),
        message: "no embedded product data found".into(),
    })?;

    let mut listings = Vec::new();
    collect_products(&state, page_url, &mut listings);

    let mut seen = HashSet::new();
    listings.retain(|l| seen.insert(l.product_url.clone()));
    Ok(listings)
}

fn collect_products(value: &Value, page_url: &Url, out: &mut Vec<ProductListing>) {
    match value {
        Value::Object(map) => {
            if let Some(listing) = as_product(map, page_url) {
                out.push(listing);
                return;
            }
            for child in map.values() {
                collect_products(child, page_url, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_products(item, page_url, out);
            }
        }
        _ => {}
    }
}

/// An object is a product if it has a name, a page link and at least one PDF.
fn as_product(map: &Map<String, Value>, page_url: &Url) -> Option<ProductListing> {
    let name = first_string(map, NAME_KEYS)?;
    let href = first_string(map, URL_KEYS).filter(|h| !is_pdf_link(h))?;
    let product_url = resolve(page_url, &href)?;

    let mut pdfs = Vec::new();
    collect_pdf_strings(&Value::Object(map.clone()), &mut pdfs);
    let pdf_urls: Vec<String> = pdfs.iter().filter_map(|p| resolve(page_url, p)).collect();
    if pdf_urls.is_empty() {
        return None;
    }

    let price = map.get("price").and_then(|p| match p {
        Value::Number(n) => parse_price(&n.to_string()),
        Value::String(s) => parse_price(s),
        Value::Object(o) => o.get("value").and_then(|v| parse_price(&v.to_string())),
        _ => None,
    });

    let mut listing = ProductListing::new(name, product_url)
        .with_category_path(category_path(map))
        .with_pdf_urls(pdf_urls)
        .with_price(price);
    listing.description = first_string(map, &["description", "summary"]);
    listing.sku = first_string(map, &["sku", "id", "code"]);
    Some(listing)
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match map.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn collect_pdf_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) if is_pdf_link(s) => out.push(s.clone()),
        Value::Object(map) => map.values().for_each(|v| collect_pdf_strings(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_pdf_strings(v, out)),
        _ => {}
    }
}

fn category_path(map: &Map<String, Value>) -> Vec<String> {
    let Some(raw) = CATEGORY_KEYS.iter().find_map(|k| map.get(*k)) else {
        return Vec::new();
    };
    let label = |v: &Value| match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Object(o) => first_string(o, &["name", "title", "label"]),
        _ => None,
    };
    match raw {
        Value::Array(items) => items.iter().filter_map(label).filter(|s| !s.is_empty()).collect(),
        Value::String(s) => s
            .split(['/', '>'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        other => label(other).into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXT_PAGE: &str = r#"<html><head></head><body>
<div id="__next"></div>
<script id="__NEXT_DATA__" type="application/json">
{"props":{"pageProps":{"products":[
  {"name":"Frontrock Max E","url":"/hu/termekek/frontrock-max-e/",
   "categories":[{"name":"Homlokzat"},{"name":"ETICS"}],
   "documents":[{"type":"TDS","href":"/siteassets/frontrock-max-e-tds.pdf"},
                {"type":"DoP","href":"https://cdn.rockwool.com/dop/frontrock.pdf"}]},
  {"name":"Airrock HD","url":"/hu/termekek/airrock-hd/","documents":[]},
  {"name":"Steprock HD","url":"/hu/termekek/steprock-hd/",
   "category":"Padló / Úsztatott padló",
   "datasheet":"/siteassets/steprock-hd-muszaki-adatlap.pdf","price":"12 990 Ft"}
]}}}
</script></body></html>"#;

    fn page_url() -> Url {
        Url::parse("https://www.rockwool.com/hu/termekek/").unwrap()
    }

    #[test]
    fn test_parses_next_data_products() {
        let listings = parse_listing(NEXT_PAGE, &page_url()).unwrap();
        assert_eq!(listings.len(), 2);

        let frontrock = &listings[0];
        assert_eq!(frontrock.name, "Frontrock Max E");
        assert_eq!(
            frontrock.product_url,
            "https://www.rockwool.com/hu/termekek/frontrock-max-e/"
        );
        assert_eq!(frontrock.category_path, vec!["Homlokzat", "ETICS"]);
        assert_eq!(
            frontrock.primary_pdf(),
            Some("https://www.rockwool.com/siteassets/frontrock-max-e-tds.pdf")
        );
        assert_eq!(frontrock.pdf_urls.len(), 2);

        let steprock = &listings[1];
        assert_eq!(steprock.category_path, vec!["Padló", "Úsztatott padló"]);
        assert_eq!(steprock.price, Some(rust_decimal::Decimal::from(12990)));
    }

    #[test]
    fn test_parses_initial_state_assignment() {
        let html = r#"<script>window.__INITIAL_STATE__ = {"catalog":{"items":[
            {"title":"Deltarock","href":"deltarock/","files":["/a/deltarock.pdf"]}
        ]}};</script>"#;
        let listings = parse_listing(html, &page_url()).unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(
            listings[0].product_url,
            "https://www.rockwool.com/hu/termekek/deltarock/"
        );
    }

    #[test]
    fn test_page_without_blob_is_parse_error() {
        let err = parse_listing("<html><body>Termékek</body></html>", &page_url()).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse { .. }));
    }
}
