//! Backfill product embeddings.
//!
//! Embeds every product that has no embedding yet or changed since it was
//! embedded. Products whose embedding input is unchanged are only marked
//! current.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use clap::Parser;
use materials_core::common::ProductId;
use materials_core::config::Config;
use materials_core::domains::catalog::activities::{embed_product, EmbedOutcome};
use materials_core::domains::catalog::models::Product;
use materials_core::kernel::ServerDeps;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "generate_embeddings", about = "Backfill product embeddings")]
struct Args {
    /// Products fetched per batch
    #[arg(long, default_value_t = 50)]
    batch_size: i64,

    /// Stop after this many products
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,materials_core=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    if config.openai_api_key.is_none() {
        bail!("OPENAI_API_KEY must be set to generate embeddings");
    }

    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let deps = ServerDeps::from_config(pool, &config)?;

    println!("Connected to database");
    println!("\nStarting embedding generation...\n");

    let mut embedded = 0usize;
    let mut unchanged = 0usize;
    let mut failed: HashSet<ProductId> = HashSet::new();

    'batches: loop {
        let batch = Product::find_needing_embedding(args.batch_size, &deps.db_pool)
            .await
            .context("Failed to find products needing embeddings")?;

        // Only products that already failed are left
        if batch.iter().all(|p| failed.contains(&p.id)) {
            break;
        }

        for product in batch {
            if failed.contains(&product.id) {
                continue;
            }
            if args.limit.is_some_and(|limit| embedded + unchanged >= limit) {
                break 'batches;
            }

            match embed_product(product.id, &deps).await {
                Ok(EmbedOutcome::Embedded) => {
                    embedded += 1;
                    println!("  Embedded {} ({})", product.name, product.id);
                }
                Ok(EmbedOutcome::Unchanged) => unchanged += 1,
                Ok(EmbedOutcome::ProductMissing) => {}
                Ok(EmbedOutcome::Disabled) => bail!("Embedding service is not configured"),
                Err(e) => {
                    eprintln!("Failed to embed product {}: {:#}", product.id, e);
                    failed.insert(product.id);
                }
            }
        }
    }

    println!("\nEmbedding generation complete!");
    println!("  Embedded: {}", embedded);
    println!("  Unchanged: {}", unchanged);
    println!("  Failed: {}", failed.len());

    Ok(())
}
