use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::common::{CategoryId, ManufacturerId, ProductId, ValidatedPaginationArgs};
use crate::domains::catalog::errors::{require_name, CatalogError};
use crate::domains::catalog::models::{Category, Manufacturer};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub manufacturer_id: ManufacturerId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub price: Option<Decimal>,

    /// Golden-record values keyed by field key
    pub technical_specs: serde_json::Value,
    pub full_text_content: Option<String>,

    // Provenance
    pub source_url: String,
    pub pdf_url: Option<String>,
    pub pdf_sha256: Option<String>,
    pub extraction_confidence: Option<f32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of POST and PUT /api/products
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub manufacturer_id: ManufacturerId,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub technical_specs: Option<serde_json::Value>,
    pub source_url: String,
    #[serde(default)]
    pub pdf_url: Option<String>,
}

/// A product as found on a manufacturer site.
#[derive(Debug, Clone)]
pub struct ScrapedProduct {
    pub manufacturer_id: ManufacturerId,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub price: Option<Decimal>,
    pub source_url: String,
    pub pdf_url: Option<String>,
}

/// Query-string filters for GET /api/products
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub manufacturer_id: Option<ManufacturerId>,
    pub category_id: Option<CategoryId>,
    pub q: Option<String>,
}

/// What an extraction run writes back onto the product.
#[derive(Debug, Clone)]
pub struct ExtractedSpecs {
    pub technical_specs: serde_json::Value,
    pub full_text_content: Option<String>,
    pub extraction_confidence: f32,
    pub pdf_url: String,
    pub pdf_sha256: String,
}

impl ProductInput {
    async fn validate(&self, pool: &PgPool) -> Result<String> {
        let name = require_name(&self.name, "Product")?;
        if self.source_url.trim().is_empty() {
            return Err(CatalogError::Validation("source_url is required".into()).into());
        }
        if let Some(price) = self.price {
            if price.is_sign_negative() {
                return Err(CatalogError::Validation("price cannot be negative".into()).into());
            }
        }
        if let Some(specs) = &self.technical_specs {
            if !specs.is_object() {
                return Err(
                    CatalogError::Validation("technical_specs must be a JSON object".into()).into(),
                );
            }
        }
        if !Manufacturer::exists(self.manufacturer_id, pool).await? {
            return Err(CatalogError::UnknownManufacturer(self.manufacturer_id).into());
        }
        if let Some(category_id) = self.category_id {
            if !Category::exists(category_id, pool).await? {
                return Err(CatalogError::UnknownCategory(category_id).into());
            }
        }
        Ok(name)
    }
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern.
fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Product {
    pub async fn find_by_id(id: ProductId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn find_by_ids(ids: &[ProductId], pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_by_source_url(
        manufacturer_id: ManufacturerId,
        source_url: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>(
            "SELECT * FROM products WHERE manufacturer_id = $1 AND source_url = $2",
        )
        .bind(manufacturer_id)
        .bind(source_url)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Filtered keyset page, newest id last. Fetches `limit + 1` rows.
    pub async fn find_paginated(
        filter: &ProductFilter,
        args: &ValidatedPaginationArgs,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM products WHERE TRUE");

        if let Some(manufacturer_id) = filter.manufacturer_id {
            query.push(" AND manufacturer_id = ").push_bind(manufacturer_id);
        }
        if let Some(category_id) = filter.category_id {
            query.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            query
                .push(" AND name ILIKE ")
                .push_bind(like_pattern(q));
        }
        if let Some(cursor) = args.cursor {
            query.push(" AND id > ").push_bind(cursor);
        }

        query
            .push(" ORDER BY id LIMIT ")
            .push_bind(args.fetch_limit());

        let rows = query.build_query_as::<Self>().fetch_all(pool).await?;
        Ok(rows)
    }

    /// Full-text match over name and extracted text, best first.
    pub async fn keyword_search(q: &str, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM products
            WHERE to_tsvector('simple', name || ' ' || COALESCE(full_text_content, ''))
                    @@ plainto_tsquery('simple', $1)
               OR name ILIKE $2
            ORDER BY
                ts_rank(
                    to_tsvector('simple', name || ' ' || COALESCE(full_text_content, '')),
                    plainto_tsquery('simple', $1)
                ) DESC,
                name
            LIMIT $3
            "#,
        )
        .bind(q)
        .bind(like_pattern(q))
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Unknown manufacturers and categories are rejected before the insert.
    pub async fn create(input: ProductInput, pool: &PgPool) -> Result<Self> {
        let name = input.validate(pool).await?;
        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO products (
                id, manufacturer_id, category_id, name, price,
                technical_specs, source_url, pdf_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(ProductId::new())
        .bind(input.manufacturer_id)
        .bind(input.category_id)
        .bind(name)
        .bind(input.price)
        .bind(
            input
                .technical_specs
                .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        )
        .bind(input.source_url.trim())
        .bind(input.pdf_url)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    pub async fn update(id: ProductId, input: ProductInput, pool: &PgPool) -> Result<Option<Self>> {
        let name = input.validate(pool).await?;
        let row = sqlx::query_as::<_, Self>(
            r#"
            UPDATE products SET
                manufacturer_id = $2,
                category_id = $3,
                name = $4,
                price = $5,
                technical_specs = COALESCE($6, technical_specs),
                source_url = $7,
                pdf_url = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.manufacturer_id)
        .bind(input.category_id)
        .bind(name)
        .bind(input.price)
        .bind(input.technical_specs)
        .bind(input.source_url.trim())
        .bind(input.pdf_url)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn delete(id: ProductId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert or refresh on (manufacturer_id, source_url). Extracted data is
    /// left alone; a missing category or price keeps the stored one.
    pub async fn upsert_scraped(input: ScrapedProduct, pool: &PgPool) -> Result<Self> {
        let name = require_name(&input.name, "Product")?;
        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO products (
                id, manufacturer_id, category_id, name, price, source_url, pdf_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (manufacturer_id, source_url) DO UPDATE SET
                name = EXCLUDED.name,
                category_id = COALESCE(EXCLUDED.category_id, products.category_id),
                price = COALESCE(EXCLUDED.price, products.price),
                pdf_url = COALESCE(EXCLUDED.pdf_url, products.pdf_url),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(ProductId::new())
        .bind(input.manufacturer_id)
        .bind(input.category_id)
        .bind(name)
        .bind(input.price)
        .bind(input.source_url)
        .bind(input.pdf_url)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    pub async fn record_extraction(
        id: ProductId,
        specs: ExtractedSpecs,
        pool: &PgPool,
    ) -> Result<Self> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            UPDATE products SET
                technical_specs = $2,
                full_text_content = $3,
                extraction_confidence = $4,
                pdf_url = $5,
                pdf_sha256 = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(specs.technical_specs)
        .bind(specs.full_text_content)
        .bind(specs.extraction_confidence)
        .bind(specs.pdf_url)
        .bind(specs.pdf_sha256)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    /// Products with no embedding, or edited since they were embedded.
    pub async fn find_needing_embedding(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>(
            r#"
            SELECT p.* FROM products p
            LEFT JOIN product_embeddings e ON e.product_id = p.id
            WHERE e.product_id IS NULL OR e.updated_at < p.updated_at
            ORDER BY p.id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
