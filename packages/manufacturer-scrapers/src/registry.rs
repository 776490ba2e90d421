//! Adapters by manufacturer slug.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, ScrapeError};
use crate::http::HttpFetcher;
use crate::source::ProductSource;
use crate::sources::{BaumitSource, LeierSource, RockwoolSource};

/// Slugs with a registered adapter.
pub const SLUGS: &[&str] = &["rockwool", "leier", "baumit"];

/// Settings shared by every adapter.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Per-adapter request rate
    pub requests_per_second: u32,

    /// Base URL overrides keyed by slug (staging mirrors, fixtures)
    pub base_urls: HashMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
            base_urls: HashMap::new(),
        }
    }
}

impl SourceConfig {
    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps;
        self
    }

    pub fn with_base_url(mut self, slug: impl Into<String>, url: impl Into<String>) -> Self {
        self.base_urls.insert(slug.into(), url.into());
        self
    }
}

/// Build the adapter for `slug`. Each adapter gets its own rate limiter.
pub fn source_for(slug: &str, config: &SourceConfig) -> Result<Arc<dyn ProductSource>> {
    let slug = slug.trim().to_lowercase();
    let fetcher = HttpFetcher::new(config.requests_per_second)?;
    let base = config.base_urls.get(&slug).map(String::as_str);

    let source: Arc<dyn ProductSource> = match slug.as_str() {
        "rockwool" => Arc::new(match base {
            Some(url) => RockwoolSource::with_base_url(url, fetcher)?,
            None => RockwoolSource::new(fetcher)?,
        }),
        "leier" => Arc::new(match base {
            Some(url) => LeierSource::with_base_url(url, fetcher)?,
            None => LeierSource::new(fetcher)?,
        }),
        "baumit" => Arc::new(match base {
            Some(url) => BaumitSource::with_base_url(url, fetcher)?,
            None => BaumitSource::new(fetcher)?,
        }),
        _ => return Err(ScrapeError::UnknownManufacturer(slug)),
    };
    Ok(source)
}

/// Every registered adapter.
pub fn registry(config: &SourceConfig) -> Result<Vec<Arc<dyn ProductSource>>> {
    SLUGS.iter().map(|slug| source_for(slug, config)).collect()
}
