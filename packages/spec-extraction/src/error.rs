//! Typed errors for the extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

use crate::types::StrategyKind;

/// Errors that can occur while orchestrating an extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Input is not a PDF
    #[error("not a PDF document: {reason}")]
    InvalidDocument { reason: String },

    /// Reading the document failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every strategy failed or was skipped
    #[error("all extraction strategies failed ({attempted} attempted)")]
    AllStrategiesFailed { attempted: usize },

    /// No strategies registered with the orchestrator
    #[error("no extraction strategies configured")]
    NoStrategies,

    /// Language model unavailable or failed
    #[error("AI service error: {0}")]
    AI(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors produced by a single extraction strategy.
///
/// The orchestrator records these per strategy and falls back to the
/// remaining ones; they never abort a run on their own.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The PDF carries no usable text layer (scanned document)
    #[error("no usable text layer ({chars} characters)")]
    NoTextLayer { chars: usize },

    /// PDF text decoding failed
    #[error("PDF parse error: {0}")]
    PdfParse(String),

    /// External tool (pdftoppm, tesseract) missing or failing
    #[error("{tool} failed: {message}")]
    Tool { tool: &'static str, message: String },

    /// Language model call failed
    #[error("language model error: {0}")]
    Model(String),

    /// Model reply was not the expected JSON shape
    #[error("unparseable model response: {0}")]
    Response(String),

    /// Strategy exceeded its time budget
    #[error("{kind} timed out after {seconds}s")]
    Timeout { kind: StrategyKind, seconds: u64 },

    /// I/O error (temp files, reading output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for orchestration.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for strategy execution.
pub type StrategyResult<T> = std::result::Result<T, StrategyError>;
