use std::sync::Arc;

use llm_client::LlmClient;
use spec_extraction::ai::OpenAiModel;
use spec_extraction::strategies::{AiNativeStrategy, OcrStrategy, TextLayerStrategy};
use spec_extraction::{Orchestrator, OrchestratorConfig};
use tracing::info;

use crate::config::Config;

/// Orchestrator settings from the environment.
pub fn orchestrator_config(config: &Config) -> OrchestratorConfig {
    OrchestratorConfig::default()
        .with_budget(config.extraction_budget)
        .with_targets(config.target_confidence, config.target_completeness)
        .with_consensus_mode(config.consensus_mode)
}

pub fn build_orchestrator(config: &Config, llm: Option<LlmClient>) -> Orchestrator {
    assemble_orchestrator(
        orchestrator_config(config),
        &config.ocr_languages,
        llm.map(|client| (client, config.llm_model.clone())),
    )
}

/// Text layer and OCR always; the AI-native tier only with an LLM client
/// and model name.
pub fn assemble_orchestrator(
    settings: OrchestratorConfig,
    ocr_languages: &str,
    llm: Option<(LlmClient, String)>,
) -> Orchestrator {
    let mut orchestrator = Orchestrator::new(settings)
        .with_strategy(TextLayerStrategy::new())
        .with_strategy(OcrStrategy::new().with_languages(ocr_languages.to_string()));

    match llm {
        Some((client, model)) => {
            let model = OpenAiModel::new(client).with_model(model);
            orchestrator = orchestrator.with_strategy(AiNativeStrategy::new(Arc::new(model)));
        }
        None => info!("no LLM configured, AI-native extraction disabled"),
    }

    orchestrator
}
