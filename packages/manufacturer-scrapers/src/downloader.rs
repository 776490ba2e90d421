//! Datasheet download with PDF sniffing and content hashing.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

pub use spec_extraction::looks_like_pdf;

use crate::error::{Result, ScrapeError};
use crate::http::HttpFetcher;

/// Largest datasheet we accept (manufacturer brochures can be big).
pub const DEFAULT_MAX_BYTES: usize = 50 * 1024 * 1024;

/// A downloaded, verified PDF.
#[derive(Debug, Clone)]
pub struct DownloadedPdf {
    pub url: String,
    pub bytes: Vec<u8>,

    /// Lowercase hex SHA-256 of `bytes`
    pub sha256: String,

    pub content_type: Option<String>,
}

impl DownloadedPdf {
    /// File name from the URL path, for logs and storage keys.
    pub fn file_name(&self) -> String {
        self.url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
            .unwrap_or("document.pdf")
            .to_string()
    }
}

#[derive(Clone)]
pub struct PdfDownloader {
    fetcher: HttpFetcher,
    max_bytes: usize,
}

impl PdfDownloader {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self {
            fetcher,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Download `url`, rejecting anything that is not a PDF.
    pub async fn download(&self, url: &str) -> Result<DownloadedPdf> {
        let (bytes, content_type) = self.fetcher.get_bytes(url, self.max_bytes).await?;

        if !looks_like_pdf(&bytes) {
            debug!(url = %url, content_type = ?content_type, "download is not a PDF");
            return Err(ScrapeError::NotPdf {
                url: url.to_string(),
            });
        }

        let sha256 = content_hash(&bytes);
        info!(url = %url, bytes = bytes.len(), sha256 = %sha256, "downloaded PDF");
        Ok(DownloadedPdf {
            url: url.to_string(),
            bytes,
            sha256,
            content_type,
        })
    }

    /// Try each URL in order and return the first real PDF.
    pub async fn download_first(&self, urls: &[String]) -> Result<DownloadedPdf> {
        let mut last_error = None;
        for url in urls {
            match self.download(url).await {
                Ok(pdf) => return Ok(pdf),
                Err(e) => {
                    debug!(url = %url, error = %e, "trying next PDF link");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ScrapeError::NotPdf {
            url: "<no links>".to_string(),
        }))
    }
}

/// Lowercase hex SHA-256.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
