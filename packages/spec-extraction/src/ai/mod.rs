//! Language model implementations for the AI-native strategy.
//!
//! The crate only depends on the [`LanguageModel`](crate::traits::ai::LanguageModel)
//! trait; this module provides an OpenAI-compatible implementation behind
//! the `openai` feature.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAiModel;
