use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::ManufacturerId;
use crate::domains::catalog::errors::require_name;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Manufacturer {
    pub id: ManufacturerId,
    pub name: String,
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of POST and PUT /api/manufacturers
#[derive(Debug, Clone, Deserialize)]
pub struct ManufacturerInput {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Manufacturer {
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>("SELECT * FROM manufacturers ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_by_id(id: ManufacturerId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>("SELECT * FROM manufacturers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn exists(id: ManufacturerId, pool: &PgPool) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM manufacturers WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// Duplicate names (case-insensitive) surface as a unique violation.
    pub async fn create(input: ManufacturerInput, pool: &PgPool) -> Result<Self> {
        let name = require_name(&input.name, "Manufacturer")?;
        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO manufacturers (id, name, website)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(ManufacturerId::new())
        .bind(name)
        .bind(input.website)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    /// Insert or refresh by name. Used by scrape runs.
    pub async fn upsert_by_name(name: &str, website: Option<&str>, pool: &PgPool) -> Result<Self> {
        let name = require_name(name, "Manufacturer")?;
        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO manufacturers (id, name, website)
            VALUES ($1, $2, $3)
            ON CONFLICT ((LOWER(name))) DO UPDATE SET
                website = COALESCE(EXCLUDED.website, manufacturers.website),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(ManufacturerId::new())
        .bind(name)
        .bind(website)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    pub async fn update(
        id: ManufacturerId,
        input: ManufacturerInput,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let name = require_name(&input.name, "Manufacturer")?;
        let row = sqlx::query_as::<_, Self>(
            r#"
            UPDATE manufacturers SET
                name = $2,
                website = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(input.website)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Deletes the manufacturer and, by cascade, its products.
    pub async fn delete(id: ManufacturerId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM manufacturers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
