use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use spec_extraction::DEFAULT_TARGET_COMPLETENESS;
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Chat + embeddings; without it extraction stays on the free tiers
    pub openai_api_key: Option<SecretString>,
    pub llm_base_url: Option<String>,
    pub llm_model: String,
    pub embedding_model: String,
    /// Bearer token for mutating and admin routes (open when unset)
    pub admin_api_key: Option<SecretString>,
    pub worker_concurrency: usize,
    pub extraction_budget: f64,
    pub target_confidence: f32,
    pub target_completeness: f32,
    pub consensus_mode: bool,
    pub ocr_languages: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: parse_or("PORT", 8080).context("PORT must be a valid number")?,
            openai_api_key: non_empty("OPENAI_API_KEY").map(SecretString::from),
            llm_base_url: non_empty("LLM_BASE_URL"),
            llm_model: non_empty("LLM_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            embedding_model: non_empty("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            admin_api_key: non_empty("ADMIN_API_KEY").map(SecretString::from),
            worker_concurrency: parse_or("WORKER_CONCURRENCY", 2)
                .context("WORKER_CONCURRENCY must be a positive integer")?,
            extraction_budget: parse_or("EXTRACTION_BUDGET", 0.10)
                .context("EXTRACTION_BUDGET must be a number (USD per document)")?,
            target_confidence: parse_or("TARGET_CONFIDENCE", 0.75)
                .context("TARGET_CONFIDENCE must be a number between 0 and 1")?,
            target_completeness: parse_or("TARGET_COMPLETENESS", DEFAULT_TARGET_COMPLETENESS)
                .context("TARGET_COMPLETENESS must be a number between 0 and 1")?,
            consensus_mode: parse_or("CONSENSUS_MODE", false)
                .context("CONSENSUS_MODE must be true or false")?,
            ocr_languages: non_empty("OCR_LANGUAGES").unwrap_or_else(|| "deu+hun+eng".to_string()),
            allowed_origins: non_empty("ALLOWED_ORIGINS")
                .map(|s| parse_list(&s))
                .unwrap_or_default(),
        })
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

/// Comma-separated list with blanks dropped.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
