//! Core trait abstractions for the extraction library.
//!
//! Applications plug in their own language model; strategies implement
//! [`strategy::ExtractionStrategy`] and are handed to the orchestrator.

pub mod ai;
pub mod strategy;
