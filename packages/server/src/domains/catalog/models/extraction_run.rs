use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spec_extraction::OrchestrationResult;
use sqlx::PgPool;

use crate::common::{ExtractionRunId, ProductId};

/// One orchestrator run over a product datasheet.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExtractionRun {
    pub id: ExtractionRunId,
    pub product_id: ProductId,
    pub golden_record: serde_json::Value,
    pub strategy_reports: serde_json::Value,
    pub conflict_count: i32,
    pub overall_confidence: f32,
    pub completeness: f32,
    pub total_cost: f64,
    pub tier_reached: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Latest run of a product that still has unresolved conflicts.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConflictReport {
    pub run_id: ExtractionRunId,
    pub product_id: ProductId,
    pub product_name: String,
    pub manufacturer_name: String,
    pub conflict_count: i32,
    pub overall_confidence: f32,
    pub conflicts: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ExtractionRun {
    pub async fn create(
        product_id: ProductId,
        result: &OrchestrationResult,
        pool: &PgPool,
    ) -> Result<Self> {
        let golden = serde_json::to_value(&result.golden).context("Failed to serialize golden record")?;
        let reports =
            serde_json::to_value(&result.reports).context("Failed to serialize strategy reports")?;

        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO extraction_runs (
                id, product_id, golden_record, strategy_reports, conflict_count,
                overall_confidence, completeness, total_cost, tier_reached
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(ExtractionRunId::new())
        .bind(product_id)
        .bind(golden)
        .bind(reports)
        .bind(result.golden.conflicts.len() as i32)
        .bind(result.golden.overall_confidence)
        .bind(result.golden.completeness)
        .bind(result.total_cost)
        .bind(result.tier_reached.map(|tier| tier.to_string()))
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    /// Newest first.
    pub async fn find_for_product(product_id: ProductId, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(
            "SELECT * FROM extraction_runs WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Products whose most recent run left conflicts, most conflicted first.
    pub async fn find_open_conflicts(limit: i64, pool: &PgPool) -> Result<Vec<ConflictReport>> {
        let rows = sqlx::query_as::<_, ConflictReport>(
            r#"
            WITH latest AS (
                SELECT DISTINCT ON (product_id) *
                FROM extraction_runs
                ORDER BY product_id, created_at DESC
            )
            SELECT
                l.id AS run_id,
                l.product_id,
                p.name AS product_name,
                m.name AS manufacturer_name,
                l.conflict_count,
                l.overall_confidence,
                COALESCE(l.golden_record -> 'conflicts', '[]'::jsonb) AS conflicts,
                l.created_at
            FROM latest l
            JOIN products p ON p.id = l.product_id
            JOIN manufacturers m ON m.id = p.manufacturer_id
            WHERE l.conflict_count > 0
            ORDER BY l.conflict_count DESC, l.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
