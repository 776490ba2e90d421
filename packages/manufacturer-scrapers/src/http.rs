//! Rate-limited, validated HTTP fetching.
//!
//! Every adapter owns one [`HttpFetcher`], so each manufacturer site gets
//! its own request budget.

use governor::{Quota, RateLimiter};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, ScrapeError};
use crate::security::UrlValidator;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

const MAX_REDIRECTS: usize = 5;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; MaterialsCatalogBot/1.0; +https://example.org/bot)";

/// HTTP client that validates every URL and waits for a rate-limit permit.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    limiter: Arc<DefaultRateLimiter>,
    validator: UrlValidator,
}

impl HttpFetcher {
    /// Create a fetcher allowing `requests_per_second` (minimum 1).
    pub fn new(requests_per_second: u32) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("hu-HU,hu;q=0.9,de;q=0.8,en;q=0.7"),
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ScrapeError::Client(e.to_string()))?;

        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Ok(Self {
            client,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
            validator: UrlValidator::new(),
        })
    }

    pub fn with_validator(mut self, validator: UrlValidator) -> Self {
        self.validator = validator;
        self
    }

    /// GET with manual redirect handling: every hop is validated, with DNS
    /// resolution, before a request goes out.
    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        let mut current = url.to_string();

        for hop in 0..=MAX_REDIRECTS {
            self.validator.validate_with_dns(&current).await?;
            self.limiter.until_ready().await;

            debug!(url = %current, hop, "HTTP fetch starting");
            let response = self.client.get(&current).send().await.map_err(|e| {
                warn!(url = %current, error = %e, "HTTP request failed");
                ScrapeError::Http {
                    url: current.clone(),
                    message: e.to_string(),
                }
            })?;

            let status = response.status();
            if status.is_redirection() {
                current = redirect_target(&response)?;
                debug!(to = %current, status = status.as_u16(), "Following redirect");
                continue;
            }
            if !status.is_success() {
                return Err(ScrapeError::Status {
                    url: current,
                    status: status.as_u16(),
                });
            }
            return Ok(response);
        }

        Err(ScrapeError::Http {
            url: url.to_string(),
            message: format!("more than {} redirects", MAX_REDIRECTS),
        })
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.send(url).await?;
        response.text().await.map_err(|e| ScrapeError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| ScrapeError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    /// Download a body of at most `max_bytes`, returning it with its content type.
    pub async fn get_bytes(&self, url: &str, max_bytes: usize) -> Result<(Vec<u8>, Option<String>)> {
        let mut response = self.send(url).await?;

        let too_large = || ScrapeError::TooLarge {
            url: url.to_string(),
            limit: max_bytes,
        };
        if response.content_length().is_some_and(|len| len as usize > max_bytes) {
            return Err(too_large());
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| ScrapeError::Http {
            url: url.to_string(),
            message: e.to_string(),
        })? {
            if body.len() + chunk.len() > max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }
        Ok((body, content_type))
    }
}

/// Absolute URL a 3xx response points at.
fn redirect_target(response: &reqwest::Response) -> Result<String> {
    let from = response.url();
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ScrapeError::Http {
            url: from.to_string(),
            message: format!("{} without a Location header", response.status()),
        })?;
    from.join(location)
        .map(|next| next.to_string())
        .map_err(|e| ScrapeError::Http {
            url: from.to_string(),
            message: format!("invalid redirect target {:?}: {}", location, e),
        })
}
