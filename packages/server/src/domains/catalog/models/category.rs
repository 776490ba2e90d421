use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::common::CategoryId;
use crate::domains::catalog::errors::{require_name, CatalogError};

/// Node in the manufacturer-independent category tree.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

/// Category with its subtree, for GET /api/categories/tree
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Category {
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let rows = sqlx::query_as::<_, Self>("SELECT * FROM categories ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn find_by_id(id: CategoryId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, Self>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row)
    }

    pub async fn exists(id: CategoryId, pool: &PgPool) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    pub async fn count_children(id: CategoryId, pool: &PgPool) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
                .bind(id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Whether `candidate` is `id` or sits somewhere above `id` in the tree.
    pub async fn is_ancestor_or_self(
        candidate: CategoryId,
        id: CategoryId,
        pool: &PgPool,
    ) -> Result<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            r#"
            WITH RECURSIVE lineage AS (
                SELECT id, parent_id FROM categories WHERE id = $1
                UNION
                SELECT c.id, c.parent_id
                FROM categories c
                JOIN lineage l ON c.id = l.parent_id
            )
            SELECT EXISTS(SELECT 1 FROM lineage WHERE id = $2)
            "#,
        )
        .bind(id)
        .bind(candidate)
        .fetch_one(pool)
        .await?;
        Ok(found)
    }

    pub async fn create(input: CategoryInput, pool: &PgPool) -> Result<Self> {
        let name = require_name(&input.name, "Category")?;
        if let Some(parent_id) = input.parent_id {
            if !Self::exists(parent_id, pool).await? {
                return Err(CatalogError::UnknownCategory(parent_id).into());
            }
        }

        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO categories (id, name, parent_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(CategoryId::new())
        .bind(name)
        .bind(input.parent_id)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }

    /// Rename or move. Moving under itself or a descendant is rejected.
    pub async fn update(id: CategoryId, input: CategoryInput, pool: &PgPool) -> Result<Option<Self>> {
        let name = require_name(&input.name, "Category")?;
        if let Some(parent_id) = input.parent_id {
            if parent_id == id {
                return Err(CatalogError::CategoryCycle.into());
            }
            if !Self::exists(parent_id, pool).await? {
                return Err(CatalogError::UnknownCategory(parent_id).into());
            }
            // The new parent must not descend from the category being moved
            if Self::is_ancestor_or_self(id, parent_id, pool).await? {
                return Err(CatalogError::CategoryCycle.into());
            }
        }

        let row = sqlx::query_as::<_, Self>(
            r#"
            UPDATE categories SET
                name = $2,
                parent_id = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(input.parent_id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Leaf categories only. Products in the category keep existing with no category.
    pub async fn delete(id: CategoryId, pool: &PgPool) -> Result<bool> {
        let children = Self::count_children(id, pool).await?;
        if children > 0 {
            return Err(CatalogError::CategoryHasChildren(children).into());
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find or create a child by name (case-insensitive).
    pub async fn find_or_create_child(
        name: &str,
        parent_id: Option<CategoryId>,
        pool: &PgPool,
    ) -> Result<Self> {
        let name = require_name(name, "Category")?;

        let inserted = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO categories (id, name, parent_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(CategoryId::new())
        .bind(&name)
        .bind(parent_id)
        .fetch_optional(pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(row);
        }

        let existing = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM categories
            WHERE parent_id IS NOT DISTINCT FROM $1 AND LOWER(name) = LOWER($2)
            "#,
        )
        .bind(parent_id)
        .bind(&name)
        .fetch_one(pool)
        .await?;
        Ok(existing)
    }

    /// Walk a breadcrumb path from the root, creating missing levels.
    /// Returns the leaf, or `None` for an empty path.
    pub async fn ensure_path(path: &[String], pool: &PgPool) -> Result<Option<Self>> {
        let mut current: Option<Self> = None;
        for segment in path.iter().filter(|s| !s.trim().is_empty()) {
            let parent_id = current.as_ref().map(|c| c.id);
            current = Some(Self::find_or_create_child(segment, parent_id, pool).await?);
        }
        Ok(current)
    }
}

/// Assemble the flat list into root nodes with nested children.
/// Orphans (parent missing from the list) are treated as roots.
pub fn build_tree(categories: Vec<Category>) -> Vec<CategoryNode> {
    let ids: std::collections::HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();
    let mut by_parent: HashMap<Option<CategoryId>, Vec<Category>> = HashMap::new();
    for category in categories {
        let parent = category.parent_id.filter(|p| ids.contains(p));
        by_parent.entry(parent).or_default().push(category);
    }

    fn attach(
        parent: Option<CategoryId>,
        by_parent: &mut HashMap<Option<CategoryId>, Vec<Category>>,
    ) -> Vec<CategoryNode> {
        let mut level = by_parent.remove(&parent).unwrap_or_default();
        level.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        level
            .into_iter()
            .map(|category| {
                let children = attach(Some(category.id), by_parent);
                CategoryNode { category, children }
            })
            .collect()
    }

    attach(None, &mut by_parent)
}
