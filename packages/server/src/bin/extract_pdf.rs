//! Run the extraction pipeline on a local datasheet and print the result.
//!
//! ```text
//! cargo run --bin extract_pdf -- datasheets/frontrock-max-e.pdf --consensus
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use llm_client::LlmClient;
use materials_core::kernel::extraction::assemble_orchestrator;
use spec_extraction::{OrchestratorConfig, PdfDocument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "extract_pdf", about = "Extract technical specs from a product datasheet")]
struct Args {
    /// PDF file to extract
    path: PathBuf,

    /// Run every tier and cross-check all strategies
    #[arg(long)]
    consensus: bool,

    /// Maximum spend in USD for this document
    #[arg(long, default_value_t = 0.10)]
    budget: f64,

    /// Skip the AI-native tier even when OPENAI_API_KEY is set
    #[arg(long)]
    no_ai: bool,

    /// Tesseract language list
    #[arg(long, default_value = "deu+hun+eng")]
    ocr_languages: String,

    /// Chat model for the AI-native tier
    #[arg(long, env = "LLM_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Print the full result including strategy reports
    #[arg(long)]
    full: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,spec_extraction=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let llm = if args.no_ai {
        None
    } else {
        LlmClient::from_env().ok().map(|client| (client, args.model.clone()))
    };

    let settings = OrchestratorConfig::default()
        .with_budget(args.budget)
        .with_consensus_mode(args.consensus);
    let orchestrator = assemble_orchestrator(settings, &args.ocr_languages, llm);

    let document = PdfDocument::from_path(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;
    let result = orchestrator
        .run(&document)
        .await
        .context("Extraction failed")?;

    let output = if args.full {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string_pretty(&result.golden)?
    };
    println!("{}", output);

    for line in result.golden.summary_lines() {
        eprintln!("  {}", line);
    }
    eprintln!(
        "confidence {:.2}, completeness {:.2}, {} conflicts, cost ${:.4}",
        result.golden.overall_confidence,
        result.golden.completeness,
        result.golden.conflicts.len(),
        result.total_cost
    );

    Ok(())
}
