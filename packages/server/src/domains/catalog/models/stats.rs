use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;

use crate::common::ManufacturerId;

/// Dashboard numbers for GET /api/admin/overview
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub totals: Totals,
    pub manufacturers: Vec<ManufacturerStats>,
    pub jobs: Vec<JobStatusCount>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Totals {
    pub manufacturers: i64,
    pub categories: i64,
    pub products: i64,
    pub products_with_specs: i64,
    pub products_embedded: i64,
    pub extraction_runs: i64,
    pub average_confidence: Option<f64>,
    pub total_extraction_cost: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ManufacturerStats {
    pub id: ManufacturerId,
    pub name: String,
    pub products: i64,
    pub with_specs: i64,
    pub average_confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct JobStatusCount {
    pub job_type: String,
    pub status: String,
    pub count: i64,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Overview {
    pub async fn load(pool: &PgPool) -> Result<Self> {
        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM manufacturers) AS manufacturers,
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM products) AS products,
                (SELECT COUNT(*) FROM products WHERE technical_specs <> '{}'::jsonb) AS products_with_specs,
                (SELECT COUNT(*) FROM product_embeddings) AS products_embedded,
                (SELECT COUNT(*) FROM extraction_runs) AS extraction_runs,
                (SELECT AVG(extraction_confidence)::float8 FROM products) AS average_confidence,
                (SELECT COALESCE(SUM(total_cost), 0)::float8 FROM extraction_runs) AS total_extraction_cost
            "#,
        )
        .fetch_one(pool)
        .await?;

        let manufacturers = sqlx::query_as::<_, ManufacturerStats>(
            r#"
            SELECT
                m.id,
                m.name,
                COUNT(p.id) AS products,
                COUNT(p.id) FILTER (WHERE p.technical_specs <> '{}'::jsonb) AS with_specs,
                AVG(p.extraction_confidence)::float8 AS average_confidence
            FROM manufacturers m
            LEFT JOIN products p ON p.manufacturer_id = m.id
            GROUP BY m.id, m.name
            ORDER BY m.name
            "#,
        )
        .fetch_all(pool)
        .await?;

        let jobs = sqlx::query_as::<_, JobStatusCount>(
            r#"
            SELECT job_type, status, COUNT(*) AS count
            FROM jobs
            GROUP BY job_type, status
            ORDER BY job_type, status
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(Self {
            totals,
            manufacturers,
            jobs,
        })
    }
}
