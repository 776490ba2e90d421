//! Tiered escalation across extraction strategies.
//!
//! Strategies are grouped by [`CostTier`] and run cheapest tier first.
//! Inside a tier they run concurrently, each under a timeout. After each
//! tier the outputs so far are merged; once the interim golden record is
//! complete and confident enough the run stops, unless consensus mode asks
//! for every tier. A per-document budget skips strategies that would
//! overspend.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::consensus::merge;
use crate::error::{ExtractionError, Result, StrategyError};
use crate::traits::strategy::{ExtractionContext, ExtractionStrategy};
use crate::types::{
    CostTier, GoldenRecord, OrchestratorConfig, PdfDocument, StrategyKind, StrategyOutput,
};

/// Slack when comparing completeness against its target.
const COMPLETENESS_TOLERANCE: f32 = 0.005;

/// What happened to one strategy during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrategyStatus {
    Succeeded,
    Failed { error: String },
    Skipped { reason: String },
    TimedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: StrategyKind,
    pub tier: CostTier,
    #[serde(flatten)]
    pub status: StrategyStatus,
    pub duration_ms: u64,
    pub candidates: usize,
    pub cost: f64,
}

impl StrategyReport {
    fn new(strategy: &dyn ExtractionStrategy, status: StrategyStatus) -> Self {
        Self {
            strategy: strategy.kind(),
            tier: strategy.tier(),
            status,
            duration_ms: 0,
            candidates: 0,
            cost: 0.0,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == StrategyStatus::Succeeded
    }
}

/// Result of one orchestrated extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationResult {
    pub golden: GoldenRecord,
    pub reports: Vec<StrategyReport>,
    pub total_cost: f64,

    /// Highest tier that actually ran
    pub tier_reached: Option<CostTier>,

    /// Longest text recovered by any strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_text: Option<String>,

    pub needs_review: bool,
}

impl OrchestrationResult {
    /// Outputs that contributed, by strategy.
    pub fn succeeded(&self) -> impl Iterator<Item = StrategyKind> + '_ {
        self.reports.iter().filter(|r| r.succeeded()).map(|r| r.strategy)
    }
}

/// Runs strategies tier by tier and merges their outputs.
///
/// # Example
///
/// ```rust,ignore
/// let orchestrator = Orchestrator::new(OrchestratorConfig::default())
///     .with_strategy(TextLayerStrategy::new())
///     .with_strategy(OcrStrategy::new())
///     .with_strategy(AiNativeStrategy::new(model));
///
/// let result = orchestrator.run(&document).await?;
/// println!("{}", serde_json::to_string_pretty(&result.golden)?);
/// ```
#[derive(Clone)]
pub struct Orchestrator {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self {
            strategies: Vec::new(),
            config,
        }
    }

    pub fn with_strategy(mut self, strategy: impl ExtractionStrategy + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    pub fn with_shared_strategy(mut self, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    fn targets_met(&self, interim: &GoldenRecord) -> bool {
        // Completeness moves in steps of 1/n; a target written as 0.67
        // still means two thirds.
        interim.completeness + COMPLETENESS_TOLERANCE >= self.config.target_completeness
            && interim.overall_confidence >= self.config.target_confidence
    }

    /// Extract the golden record for one document.
    pub async fn run(&self, document: &PdfDocument) -> Result<OrchestrationResult> {
        if self.strategies.is_empty() {
            return Err(ExtractionError::NoStrategies);
        }

        let tiers: BTreeSet<CostTier> = self.strategies.iter().map(|s| s.tier()).collect();
        let timeout = self.config.strategy_timeout;

        let mut outputs: Vec<StrategyOutput> = Vec::new();
        let mut reports: Vec<StrategyReport> = Vec::new();
        let mut spent = 0.0_f64;
        let mut best_text: Option<String> = None;
        let mut tier_reached = None;

        for tier in tiers {
            if !outputs.is_empty() && !self.config.consensus_mode {
                let interim = merge(&outputs, &self.config.consensus);
                if self.targets_met(&interim) {
                    info!(
                        source = %document.source,
                        confidence = interim.overall_confidence,
                        completeness = interim.completeness,
                        "targets met, not escalating to {} tier",
                        tier
                    );
                    break;
                }
            }

            let mut scheduled: Vec<Arc<dyn ExtractionStrategy>> = Vec::new();
            let mut reserved = spent;
            for strategy in self.strategies.iter().filter(|s| s.tier() == tier) {
                let estimate = strategy.estimated_cost(document);
                if reserved + estimate > self.config.budget + f64::EPSILON {
                    let reason = format!(
                        "estimated cost {:.4} exceeds remaining budget {:.4}",
                        estimate,
                        (self.config.budget - reserved).max(0.0)
                    );
                    debug!(strategy = %strategy.kind(), %reason, "skipping strategy");
                    reports.push(StrategyReport::new(
                        &**strategy,
                        StrategyStatus::Skipped { reason },
                    ));
                    continue;
                }
                reserved += estimate;
                scheduled.push(Arc::clone(strategy));
            }
            if scheduled.is_empty() {
                continue;
            }

            let ctx = ExtractionContext::new(document).with_prior_text(best_text.as_deref());
            let runs = scheduled.into_iter().map(|strategy| {
                let ctx = &ctx;
                async move {
                    let started = Instant::now();
                    let result = tokio::time::timeout(timeout, strategy.extract(ctx)).await;
                    (strategy, result, started.elapsed())
                }
            });
            let finished = join_all(runs).await;
            tier_reached = Some(tier);

            for (strategy, result, elapsed) in finished {
                let mut report = StrategyReport::new(&*strategy, StrategyStatus::Succeeded);
                report.duration_ms = elapsed.as_millis() as u64;

                match result {
                    Ok(Ok(output)) => {
                        report.candidates = output.candidates.len();
                        report.cost = output.cost;
                        spent += output.cost;
                        if let Some(text) = &output.text {
                            if is_better_text(text, best_text.as_deref()) {
                                best_text = Some(text.clone());
                            }
                        }
                        debug!(
                            strategy = %output.strategy,
                            candidates = output.candidates.len(),
                            elapsed_ms = report.duration_ms,
                            "strategy succeeded"
                        );
                        outputs.push(output);
                    }
                    Ok(Err(e)) => {
                        warn!(strategy = %strategy.kind(), error = %e, "strategy failed, falling back");
                        report.status = StrategyStatus::Failed {
                            error: e.to_string(),
                        };
                    }
                    Err(_) => {
                        let e = StrategyError::Timeout {
                            kind: strategy.kind(),
                            seconds: timeout.as_secs(),
                        };
                        warn!(error = %e, "strategy timed out, falling back");
                        report.status = StrategyStatus::TimedOut;
                    }
                }
                reports.push(report);
            }
        }

        if outputs.is_empty() {
            let attempted = reports
                .iter()
                .filter(|r| !matches!(r.status, StrategyStatus::Skipped { .. }))
                .count();
            return Err(ExtractionError::AllStrategiesFailed { attempted });
        }

        let golden = merge(&outputs, &self.config.consensus);
        let needs_review = golden.needs_review(self.config.review_threshold);

        info!(
            source = %document.source,
            fields = golden.fields.len(),
            conflicts = golden.conflicts.len(),
            confidence = golden.overall_confidence,
            cost = spent,
            "extraction complete"
        );

        Ok(OrchestrationResult {
            golden,
            reports,
            total_cost: spent,
            tier_reached,
            best_text,
            needs_review,
        })
    }
}

/// Prefer the text with more readable characters.
fn is_better_text(candidate: &str, current: Option<&str>) -> bool {
    let readable = |t: &str| t.chars().filter(|c| c.is_alphanumeric()).count();
    match current {
        None => readable(candidate) > 0,
        Some(current) => readable(candidate) > readable(current),
    }
}
