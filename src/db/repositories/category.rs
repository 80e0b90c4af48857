//! Category repository
//!
//! Database operations for categories.
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `SqlxCategoryRepository` implementing the trait for SQLite

use crate::db::DynDatabasePool;
use crate::models::Category;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Get category by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>>;

    /// Create the category named `name`, or overwrite the slug and parent of
    /// the existing one.
    ///
    /// When `slug` already belongs to a differently named category a numeric
    /// suffix is appended.
    async fn upsert_by_name(&self, name: &str, slug: &str, parent_id: Option<i64>) -> Result<Category>;

    /// Link a category to an article (no-op when already linked)
    async fn link_article(&self, category_id: i64, article_id: i64) -> Result<()>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn get_by_name(&self, name: &str) -> Result<Option<Category>> {
        get_category_by_name_sqlite(self.pool.sqlite(), name).await
    }

    async fn upsert_by_name(&self, name: &str, slug: &str, parent_id: Option<i64>) -> Result<Category> {
        upsert_category_sqlite(self.pool.sqlite(), name, slug, parent_id).await
    }

    async fn link_article(&self, category_id: i64, article_id: i64) -> Result<()> {
        add_category_to_article_sqlite(self.pool.sqlite(), category_id, article_id).await
    }
}

#[cfg(test)]
impl SqlxCategoryRepository {
    /// Categories linked to an article, by name
    pub(crate) async fn get_by_article(&self, article_id: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.slug, c.name, c.parent_id, c.created_at
            FROM categories c
            INNER JOIN article_categories ac ON ac.category_id = c.id
            WHERE ac.article_id = ?
            ORDER BY c.name ASC
            "#,
        )
        .bind(article_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to get categories by article")?;

        rows.iter().map(row_to_category_sqlite).collect()
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO categories (slug, name, parent_id, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&category.slug)
    .bind(&category.name)
    .bind(category.parent_id)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_rowid(),
        slug: category.slug.clone(),
        name: category.name.clone(),
        parent_id: category.parent_id,
        created_at: now,
    })
}

async fn get_category_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Category>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, name, parent_id, created_at
        FROM categories
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by name")?;

    row.as_ref().map(row_to_category_sqlite).transpose()
}

/// First of `slug`, `slug-2`, `slug-3`, ... not owned by another category
async fn available_category_slug_sqlite(pool: &SqlitePool, name: &str, slug: &str) -> Result<String> {
    let mut candidate = slug.to_string();
    let mut counter = 1;

    loop {
        let row = sqlx::query("SELECT COUNT(*) as count FROM categories WHERE slug = ? AND name != ?")
            .bind(&candidate)
            .bind(name)
            .fetch_one(pool)
            .await
            .context("Failed to check category slug")?;

        if row.get::<i64, _>("count") == 0 {
            return Ok(candidate);
        }

        counter += 1;
        candidate = format!("{}-{}", slug, counter);
    }
}

async fn upsert_category_sqlite(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
    parent_id: Option<i64>,
) -> Result<Category> {
    let slug = available_category_slug_sqlite(pool, name, slug).await?;

    match get_category_by_name_sqlite(pool, name).await? {
        Some(existing) => {
            sqlx::query("UPDATE categories SET slug = ?, parent_id = ? WHERE id = ?")
                .bind(&slug)
                .bind(parent_id)
                .bind(existing.id)
                .execute(pool)
                .await
                .context("Failed to update category")?;

            Ok(Category {
                slug,
                parent_id,
                ..existing
            })
        }
        None => create_category_sqlite(pool, &Category::new(slug, name.to_string(), parent_id)).await,
    }
}

async fn add_category_to_article_sqlite(pool: &SqlitePool, category_id: i64, article_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO article_categories (article_id, category_id)
        VALUES (?, ?)
        "#,
    )
    .bind(article_id)
    .bind(category_id)
    .execute(pool)
    .await
    .context("Failed to add category to article")?;

    Ok(())
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
    Ok(Category {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        parent_id: row.get("parent_id"),
        created_at: row.get("created_at"),
    })
}
