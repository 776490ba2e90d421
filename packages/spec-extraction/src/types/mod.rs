//! Data types for documents, strategy output and merged records.

pub mod candidate;
pub mod config;
pub mod document;
pub mod field;
pub mod golden;
pub mod strategy;
pub mod value;

pub use candidate::{FieldCandidate, StrategyOutput};
pub use config::{ConsensusConfig, OrchestratorConfig, DEFAULT_TARGET_COMPLETENESS};
pub use document::{looks_like_pdf, PdfDocument, PdfMetadata};
pub use field::{SpecField, ValueKind};
pub use golden::{Agreement, ConflictingCandidate, FieldConflict, GoldenRecord, ResolvedField};
pub use strategy::{CostTier, StrategyKind};
pub use value::{parse_decimal, FieldValue, Unit};
