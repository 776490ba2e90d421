//! LEIER adapter.
//!
//! Paginated HTML catalogue (`?page=N`). Listing pages give product cards;
//! each product page carries the breadcrumb and the PDF downloads.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::http::HttpFetcher;
use crate::links::{is_pdf_link, resolve};
use crate::source::ProductSource;
use crate::types::{parse_price, DiscoverOptions, ManufacturerInfo, ProductListing};

pub const DEFAULT_BASE_URL: &str = "https://www.leier.hu/";

/// CSS selectors for the LEIER markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeierSelectors {
    pub product_card: String,
    pub card_link: String,
    pub card_name: String,
    pub card_price: String,
    pub breadcrumb: String,
    pub description: String,
    pub download_link: String,
}

impl Default for LeierSelectors {
    fn default() -> Self {
        Self {
            product_card: ".product-card, .product-item, article.product".into(),
            card_link: "a[href]".into(),
            card_name: ".product-title, .product-name, h2, h3".into(),
            card_price: ".price, .product-price".into(),
            breadcrumb: ".breadcrumb a, .breadcrumbs a, nav[aria-label=breadcrumb] a".into(),
            description: ".product-description, .product-lead, .entry-content p".into(),
            download_link: "a[href]".into(),
        }
    }
}

struct Compiled {
    product_card: Selector,
    card_link: Selector,
    card_name: Selector,
    card_price: Selector,
    breadcrumb: Selector,
    description: Selector,
    download_link: Selector,
}

impl Compiled {
    fn new(s: &LeierSelectors) -> Result<Self> {
        let parse = |css: &str| {
            Selector::parse(css).map_err(|e| ScrapeError::Parse {
                url: css.to_string(),
                message: format!("invalid selector: {:?}", e),
            })
        };
        Ok(Self {
            product_card: parse(&s.product_card)?,
            card_link: parse(&s.card_link)?,
            card_name: parse(&s.card_name)?,
            card_price: parse(&s.card_price)?,
            breadcrumb: parse(&s.breadcrumb)?,
            description: parse(&s.description)?,
            download_link: parse(&s.download_link)?,
        })
    }
}

/// A product card on a listing page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
    pub name: String,
    pub url: String,
    pub price: Option<rust_decimal::Decimal>,
}

/// What a product page adds to its card.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductDetail {
    pub category_path: Vec<String>,
    pub pdf_urls: Vec<String>,
    pub description: Option<String>,
}

pub struct LeierSource {
    base_url: Url,
    listing_path: String,
    selectors: Compiled,
    fetcher: HttpFetcher,
}

impl LeierSource {
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
            listing_path: "termekek".to_string(),
            selectors: Compiled::new(&LeierSelectors::default())?,
            fetcher,
        })
    }

    pub fn with_selectors(mut self, selectors: &LeierSelectors) -> Result<Self> {
        self.selectors = Compiled::new(selectors)?;
        Ok(self)
    }

    pub fn with_listing_path(mut self, path: impl Into<String>) -> Self {
        self.listing_path = path.into();
        self
    }

    fn page_url(&self, page: usize) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&self.listing_path)
            .map_err(|e| ScrapeError::Parse {
                url: self.listing_path.clone(),
                message: e.to_string(),
            })?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        Ok(url)
    }

    pub fn parse_cards(&self, html: &str, page_url: &Url) -> Vec<ProductCard> {
        let document = Html::parse_document(html);
        let s = &self.selectors;

        document
            .select(&s.product_card)
            .filter_map(|card| {
                let href = card
                    .select(&s.card_link)
                    .filter_map(|a| a.value().attr("href"))
                    .find(|h| !is_pdf_link(h))?;
                let url = resolve(page_url, href)?;
                let name = card
                    .select(&s.card_name)
                    .next()
                    .map(element_text)
                    .filter(|n| !n.is_empty())?;
                let price = card
                    .select(&s.card_price)
                    .next()
                    .and_then(|p| parse_price(&element_text(p)));
                Some(ProductCard { name, url, price })
            })
            .collect()
    }

    pub fn parse_detail(&self, html: &str, page_url: &Url) -> ProductDetail {
        let document = Html::parse_document(html);
        let s = &self.selectors;

        let mut category_path: Vec<String> = document
            .select(&s.breadcrumb)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        // Breadcrumbs start at the home page
        if category_path
            .first()
            .is_some_and(|t| matches!(t.to_lowercase().as_str(), "főoldal" | "kezdőlap" | "home"))
        {
            category_path.remove(0);
        }

        let pdf_urls = document
            .select(&s.download_link)
            .filter_map(|a| a.value().attr("href"))
            .filter(|h| is_pdf_link(h))
            .filter_map(|h| resolve(page_url, h))
            .collect();

        let description = document
            .select(&s.description)
            .next()
            .map(element_text)
            .filter(|d| !d.is_empty());

        ProductDetail {
            category_path,
            pdf_urls,
            description,
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl ProductSource for LeierSource {
    fn manufacturer(&self) -> ManufacturerInfo {
        ManufacturerInfo {
            slug: "leier".into(),
            name: "LEIER".into(),
            website: self.base_url.to_string(),
            country: "HU".into(),
        }
    }

    async fn discover(&self, options: &DiscoverOptions) -> Result<Vec<ProductListing>> {
        let mut cards = Vec::new();
        let mut seen = HashSet::new();

        for page in 1..=options.max_pages {
            let url = self.page_url(page)?;
            let html = self.fetcher.get_text(url.as_str()).await?;

            let fresh: Vec<ProductCard> = self
                .parse_cards(&html, &url)
                .into_iter()
                .filter(|c| seen.insert(c.url.clone()))
                .collect();
            debug!(page, new_products = fresh.len(), "parsed LEIER listing page");

            // Out-of-range pages repeat the last page or come back empty
            if fresh.is_empty() {
                break;
            }
            cards.extend(fresh);
            if cards.len() >= options.max_products {
                break;
            }
        }
        cards.truncate(options.max_products);

        let mut listings = Vec::with_capacity(cards.len());
        for card in cards {
            let detail = match Url::parse(&card.url) {
                Ok(url) => match self.fetcher.get_text(url.as_str()).await {
                    Ok(html) => self.parse_detail(&html, &url),
                    Err(e) => {
                        warn!(url = %card.url, error = %e, "product page fetch failed");
                        ProductDetail::default()
                    }
                },
                Err(_) => ProductDetail::default(),
            };

            let mut listing = ProductListing::new(card.name, card.url)
                .with_category_path(detail.category_path)
                .with_pdf_urls(detail.pdf_urls)
                .with_price(card.price);
            listing.description = detail.description;
            listings.push(listing);
        }

        info!(products = listings.len(), "LEIER discovery complete");
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<html><body><div class="products">
<div class="product-card">
  <a href="/termekek/leier-kemeny-tegla"><img src="t.jpg"></a>
  <h3 class="product-title">LEIER Kémény   tégla</h3>
  <span class="price">4 590 Ft</span>
</div>
<div class="product-card">
  <a href="/files/katalogus.pdf">Katalógus</a>
  <a href="/termekek/porotherm-30">Porotherm 30</a>
  <h3>Porotherm 30 N+F</h3>
</div>
<div class="product-card"><span>no link</span></div>
</div></body></html>"#;

    const DETAIL: &str = r##"<html><body>
<nav class="breadcrumb"><a href="/">Főoldal</a><a href="/termekek">Falazóelemek</a><a href="#">Kéményrendszerek</a></nav>
<div class="product-description">Egy huzamú   kéményrendszer.</div>
<ul>
  <li><a href="/media/kemeny-teljesitmenynyilatkozat.pdf">DoP</a></li>
  <li><a href="/media/kemeny-muszaki-adatlap.pdf?v=2">Műszaki adatlap</a></li>
  <li><a href="/kapcsolat">Kapcsolat</a></li>
</ul></body></html>"##;

    fn source() -> LeierSource {
        LeierSource::new(HttpFetcher::new(2).unwrap()).unwrap()
    }

    #[test]
    fn test_page_url_appends_page_param() {
        let url = source().page_url(3).unwrap();
        assert_eq!(url.as_str(), "https://www.leier.hu/termekek?page=3");
    }

    #[test]
    fn test_parse_cards() {
        let url = Url::parse("https://www.leier.hu/termekek?page=1").unwrap();
        let cards = source().parse_cards(LISTING, &url);

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].name, "LEIER Kémény tégla");
        assert_eq!(cards[0].url, "https://www.leier.hu/termekek/leier-kemeny-tegla");
        assert_eq!(cards[0].price, Some(rust_decimal::Decimal::from(4590)));
        // PDF links are never taken as the product page
        assert_eq!(cards[1].url, "https://www.leier.hu/termekek/porotherm-30");
        assert_eq!(cards[1].price, None);
    }

    #[test]
    fn test_parse_detail() {
        let url = Url::parse("https://www.leier.hu/termekek/leier-kemeny-tegla").unwrap();
        let detail = source().parse_detail(DETAIL, &url);

        assert_eq!(detail.category_path, vec!["Falazóelemek", "Kéményrendszerek"]);
        assert_eq!(detail.pdf_urls.len(), 2);
        assert_eq!(detail.description.as_deref(), Some("Egy huzamú kéményrendszer."));

        let listing = ProductListing::new("x", url.as_str()).with_pdf_urls(detail.pdf_urls);
        assert_eq!(
            listing.primary_pdf(),
            Some("https://www.leier.hu/media/kemeny-muszaki-adatlap.pdf?v=2")
        );
    }

    #[test]
    fn test_invalid_selector_is_rejected() {
        let selectors = LeierSelectors {
            product_card: "div[".into(),
            ..Default::default()
        };
        assert!(source().with_selectors(&selectors).is_err());
    }
}
