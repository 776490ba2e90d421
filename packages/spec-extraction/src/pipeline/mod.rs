//! Extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Tiered escalation (Free → Low → High) with a cost budget
//! - Concurrent strategy runs within a tier, with timeouts and fallback
//! - Consensus merging into a golden record with conflict detection

pub mod consensus;
pub mod orchestrator;

pub use consensus::merge;
pub use orchestrator::{OrchestrationResult, Orchestrator, StrategyReport, StrategyStatus};
