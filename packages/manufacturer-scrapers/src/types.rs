//! Listing types shared by every adapter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Who a source scrapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerInfo {
    /// Registry key, e.g. `rockwool`
    pub slug: String,
    pub name: String,
    pub website: String,
    pub country: String,
}

/// One product found in a manufacturer catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListing {
    pub name: String,

    /// Product page, the upsert key together with the manufacturer
    pub product_url: String,

    /// Category names from the root down, e.g. `["Hőszigetelés", "Homlokzat"]`
    #[serde(default)]
    pub category_path: Vec<String>,

    /// Absolute PDF links, datasheets first
    #[serde(default)]
    pub pdf_urls: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

impl ProductListing {
    pub fn new(name: impl Into<String>, product_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            product_url: product_url.into(),
            category_path: Vec::new(),
            pdf_urls: Vec::new(),
            price: None,
            description: None,
            sku: None,
        }
    }

    pub fn with_category_path(mut self, path: Vec<String>) -> Self {
        self.category_path = path;
        self
    }

    pub fn with_pdf_urls(mut self, urls: Vec<String>) -> Self {
        self.pdf_urls = crate::links::rank_datasheets(urls);
        self
    }

    pub fn with_price(mut self, price: Option<Decimal>) -> Self {
        self.price = price;
        self
    }

    /// The PDF most likely to be the technical datasheet.
    pub fn primary_pdf(&self) -> Option<&str> {
        self.pdf_urls.first().map(String::as_str)
    }
}

/// Limits for one discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverOptions {
    /// Stop after this many products
    pub max_products: usize,

    /// Stop after this many listing pages
    pub max_pages: usize,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        Self {
            max_products: 500,
            max_pages: 50,
        }
    }
}

impl DiscoverOptions {
    pub fn with_max_products(mut self, n: usize) -> Self {
        self.max_products = n;
        self
    }

    pub fn with_max_pages(mut self, n: usize) -> Self {
        self.max_pages = n;
        self
    }
}

/// Parse a catalogue price like `12 990 Ft`, `1.234,50 €` or `"19.90"`.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if kept.is_empty() {
        return None;
    }

    // The last separator followed by one or two digits is the decimal mark
    let normalized = match kept.rfind([',', '.']) {
        Some(pos) if (1..=2).contains(&(kept.len() - pos - 1)) => {
            let (whole, frac) = kept.split_at(pos);
            format!("{}.{}", whole.replace([',', '.'], ""), &frac[1..])
        }
        _ => kept.replace([',', '.'], ""),
    };
    normalized.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("12 990 Ft"), Some(Decimal::from(12990)));
        assert_eq!(parse_price("1.234,50 €"), Decimal::from_str("1234.50").ok());
        assert_eq!(parse_price("19.90"), Decimal::from_str("19.90").ok());
        assert_eq!(parse_price("1,299"), Some(Decimal::from(1299)));
        assert_eq!(parse_price("ár kérésre"), None);
    }

    #[test]
    fn test_listing_ranks_datasheets_first() {
        let listing = ProductListing::new("Frontrock", "https://x.hu/p").with_pdf_urls(vec![
            "https://x.hu/dop.pdf".into(),
            "https://x.hu/frontrock-tds.pdf".into(),
        ]);
        assert_eq!(listing.primary_pdf(), Some("https://x.hu/frontrock-tds.pdf"));
    }
}
