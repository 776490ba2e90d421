use anyhow::Result;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::Serialize;
use sqlx::PgPool;

use crate::common::ProductId;

/// Embedding dimension of the `product_embeddings.embedding` column.
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// Vector-store row; the vector itself is never read back.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductEmbedding {
    pub product_id: ProductId,
    pub content_hash: String,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ProductEmbedding {
    pub async fn find_by_product(product_id: ProductId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>(
            "SELECT product_id, content_hash, updated_at FROM product_embeddings WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn upsert(
        product_id: ProductId,
        embedding: &[f32],
        content_hash: &str,
        pool: &PgPool,
    ) -> Result<()> {
        anyhow::ensure!(
            embedding.len() == EMBEDDING_DIMENSIONS,
            "expected a {}-dimensional embedding, got {}",
            EMBEDDING_DIMENSIONS,
            embedding.len()
        );

        sqlx::query(
            r#"
            INSERT INTO product_embeddings (product_id, embedding, content_hash, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (product_id) DO UPDATE SET
                embedding = EXCLUDED.embedding,
                content_hash = EXCLUDED.content_hash,
                updated_at = NOW()
            "#,
        )
        .bind(product_id)
        .bind(Vector::from(embedding.to_vec()))
        .bind(content_hash)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark an embedding current without recomputing it.
    pub async fn touch(product_id: ProductId, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE product_embeddings SET updated_at = NOW() WHERE product_id = $1")
            .bind(product_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Nearest products by cosine similarity, most similar first.
    pub async fn search_similar(
        query: &[f32],
        threshold: f32,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<(ProductId, f64)>> {
        let vector = Vector::from(query.to_vec());
        // Cosine distance is 1 - similarity
        let max_distance = 1.0 - threshold as f64;

        let rows: Vec<(ProductId, f64)> = sqlx::query_as(
            r#"
            SELECT e.product_id, (1 - (e.embedding <=> $1))::float8 AS similarity
            FROM product_embeddings e
            WHERE (e.embedding <=> $1) < $2
            ORDER BY e.embedding <=> $1
            LIMIT $3
            "#,
        )
        .bind(vector)
        .bind(max_distance)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM product_embeddings")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
