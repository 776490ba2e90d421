//! Typed errors for the scrapers.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur while scraping a manufacturer catalogue.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// URL failed the SSRF checks
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    /// HTTP request failed
    #[error("HTTP error fetching {url}: {message}")]
    Http { url: String, message: String },

    /// Non-success status code
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// Page or API payload did not have the expected shape
    #[error("could not parse {url}: {message}")]
    Parse { url: String, message: String },

    /// Download exceeded the size limit
    #[error("{url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    /// Download is not a PDF
    #[error("{url} is not a PDF")]
    NotPdf { url: String },

    /// No adapter registered under this slug
    #[error("unknown manufacturer: {0}")]
    UnknownManufacturer(String),

    /// HTTP client could not be built
    #[error("client setup failed: {0}")]
    Client(String),
}

/// Security-related errors.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// URL scheme not allowed (e.g., file://, ftp://)
    #[error("disallowed URL scheme: {0}")]
    DisallowedScheme(String),

    /// Host is blocked (e.g., localhost, internal IPs)
    #[error("blocked host: {0}")]
    BlockedHost(String),

    /// IP in blocked CIDR range (e.g., 10.0.0.0/8)
    #[error("blocked IP range: {0}")]
    BlockedCidr(String),

    /// URL has no host
    #[error("URL has no host")]
    NoHost,

    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsResolution(String),

    /// Invalid URL format
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Result type alias for scraping operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for security checks.
pub type SecurityResult<T> = std::result::Result<T, SecurityError>;
