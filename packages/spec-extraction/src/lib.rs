//! Technical-Specification Extraction for Building-Material Datasheets
//!
//! Pulls structured technical data (thermal conductivity, density,
//! Euroclass, compressive strength, ...) out of manufacturer PDF
//! datasheets written in German, Hungarian or English.
//!
//! # Design
//!
//! Several extraction strategies read the same PDF:
//!
//! - **Text layer** - regex pattern library over the embedded text (free)
//! - **OCR** - `pdftoppm` + `tesseract`, then the same patterns (local, slow)
//! - **AI-native** - a language model reads the text and returns JSON (paid)
//!
//! The [`Orchestrator`](pipeline::Orchestrator) runs them cheapest tier
//! first and stops escalating once the merged result is complete and
//! confident enough. Outputs are merged by [`merge`](pipeline::merge) into a
//! [`GoldenRecord`]: one value per field with a confidence, an agreement
//! grade and any conflicts worth a human look.
//!
//! # Usage
//!
//! ```rust,ignore
//! use spec_extraction::{Orchestrator, OrchestratorConfig, PdfDocument};
//! use spec_extraction::strategies::{OcrStrategy, TextLayerStrategy};
//!
//! let orchestrator = Orchestrator::new(OrchestratorConfig::default())
//!     .with_strategy(TextLayerStrategy::new())
//!     .with_strategy(OcrStrategy::new());
//!
//! let document = PdfDocument::from_path("frontrock-max-e.pdf")?;
//! let result = orchestrator.run(&document).await?;
//! for line in result.golden.summary_lines() {
//!     println!("{line}");
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (ExtractionStrategy, LanguageModel)
//! - [`types`] - Field catalog, values, candidates and golden records
//! - [`strategies`] - Text-layer, OCR and AI-native strategies
//! - [`pipeline`] - Orchestration and consensus merging
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod error;
pub mod pipeline;
pub mod strategies;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractionError, StrategyError};
pub use pipeline::{merge, OrchestrationResult, Orchestrator, StrategyReport, StrategyStatus};
pub use traits::{
    ai::LanguageModel,
    strategy::{ExtractionContext, ExtractionStrategy},
};
pub use types::{
    looks_like_pdf, Agreement, ConsensusConfig, CostTier, FieldCandidate, FieldConflict, FieldValue, GoldenRecord,
    OrchestratorConfig, PdfDocument, PdfMetadata, ResolvedField, SpecField, StrategyKind,
    StrategyOutput, Unit, ValueKind, DEFAULT_TARGET_COMPLETENESS,
};
