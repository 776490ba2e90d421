//! Manufacturer catalogue scrapers.
//!
//! Each supported manufacturer has a [`ProductSource`] adapter that walks
//! its catalogue and returns [`ProductListing`]s with datasheet links. The
//! [`PdfDownloader`] then fetches the datasheets.
//!
//! All HTTP goes through [`HttpFetcher`], which:
//! - rejects URLs that point inside the network ([`UrlValidator`])
//! - rate limits requests per adapter (`governor`)
//! - caps response sizes
//!
//! # Example
//!
//! ```rust,ignore
//! use manufacturer_scrapers::{source_for, DiscoverOptions, PdfDownloader, HttpFetcher, SourceConfig};
//!
//! let source = source_for("rockwool", &SourceConfig::default())?;
//! let listings = source.discover(&DiscoverOptions::default().with_max_products(20)).await?;
//!
//! let downloader = PdfDownloader::new(HttpFetcher::new(2)?);
//! for listing in &listings {
//!     let pdf = downloader.download_first(&listing.pdf_urls).await?;
//!     println!("{} -> {}", listing.name, pdf.sha256);
//! }
//! ```

pub mod downloader;
pub mod error;
pub mod http;
pub mod links;
pub mod registry;
pub mod security;
pub mod source;
pub mod sources;
pub mod types;

pub use downloader::{content_hash, looks_like_pdf, DownloadedPdf, PdfDownloader};
pub use error::{Result, ScrapeError, SecurityError};
pub use http::HttpFetcher;
pub use registry::{registry, source_for, SourceConfig, SLUGS};
pub use security::UrlValidator;
pub use source::ProductSource;
pub use types::{DiscoverOptions, ManufacturerInfo, ProductListing};
