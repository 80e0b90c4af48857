//! Article repository
//!
//! Database operations for articles.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite

use crate::db::DynDatabasePool;
use crate::models::{Article, ArticleStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

const ARTICLE_COLUMNS: &str = "id, page_id, slug, title, content, excerpt, seo_title, search_description, \
    author_id, status, header_image_id, thumbnail, go_live_at, first_published_at, published_at, \
    created_at, updated_at";

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Create a new article under `article.page_id`
    async fn create(&self, article: &Article) -> Result<Article>;

    /// Get article by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// Persist every mutable field of an existing article
    async fn save(&self, article: &Article) -> Result<Article>;

    /// Mark an article published at `at`, keeping an earlier `first_published_at`
    async fn publish(&self, id: i64, at: DateTime<Utc>) -> Result<Article>;

    /// List articles under a page, oldest first
    async fn list_by_page(&self, page_id: i64) -> Result<Vec<Article>>;
}

/// SQLx-based article repository implementation
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article> {
        create_article_sqlite(self.pool.sqlite(), article).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        get_article_by_slug_sqlite(self.pool.sqlite(), slug).await
    }

    async fn save(&self, article: &Article) -> Result<Article> {
        save_article_sqlite(self.pool.sqlite(), article).await
    }

    async fn publish(&self, id: i64, at: DateTime<Utc>) -> Result<Article> {
        publish_article_sqlite(self.pool.sqlite(), id, at).await
    }

    async fn list_by_page(&self, page_id: i64) -> Result<Vec<Article>> {
        list_articles_by_page_sqlite(self.pool.sqlite(), page_id).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO articles (page_id, slug, title, content, excerpt, seo_title, search_description,
            author_id, status, header_image_id, thumbnail, go_live_at, first_published_at, published_at,
            created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(article.page_id)
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.content)
    .bind(&article.excerpt)
    .bind(&article.seo_title)
    .bind(&article.search_description)
    .bind(article.author_id)
    .bind(article.status.as_str())
    .bind(article.header_image_id)
    .bind(&article.thumbnail)
    .bind(article.go_live_at)
    .bind(article.first_published_at)
    .bind(article.published_at)
    .bind(article.created_at)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_rowid(),
        updated_at: now,
        ..article.clone()
    })
}

async fn get_article_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", ARTICLE_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by ID")?;

    row.as_ref().map(row_to_article_sqlite).transpose()
}

async fn get_article_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Article>> {
    let row = sqlx::query(&format!("SELECT {} FROM articles WHERE slug = ?", ARTICLE_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get article by slug")?;

    row.as_ref().map(row_to_article_sqlite).transpose()
}

async fn save_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE articles
        SET page_id = ?, slug = ?, title = ?, content = ?, excerpt = ?, seo_title = ?,
            search_description = ?, author_id = ?, status = ?, header_image_id = ?, thumbnail = ?,
            go_live_at = ?, first_published_at = ?, published_at = ?, created_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(article.page_id)
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.content)
    .bind(&article.excerpt)
    .bind(&article.seo_title)
    .bind(&article.search_description)
    .bind(article.author_id)
    .bind(article.status.as_str())
    .bind(article.header_image_id)
    .bind(&article.thumbnail)
    .bind(article.go_live_at)
    .bind(article.first_published_at)
    .bind(article.published_at)
    .bind(article.created_at)
    .bind(now)
    .bind(article.id)
    .execute(pool)
    .await
    .context("Failed to save article")?;

    get_article_by_id_sqlite(pool, article.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after save: {}", article.id))
}

async fn publish_article_sqlite(pool: &SqlitePool, id: i64, at: DateTime<Utc>) -> Result<Article> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE articles
        SET status = ?, published_at = ?, first_published_at = COALESCE(first_published_at, ?), updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(ArticleStatus::Published.as_str())
    .bind(at)
    .bind(at)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to publish article")?;

    get_article_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Article not found after publish: {}", id))
}

async fn list_articles_by_page_sqlite(pool: &SqlitePool, page_id: i64) -> Result<Vec<Article>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM articles WHERE page_id = ? ORDER BY created_at ASC, id ASC",
        ARTICLE_COLUMNS
    ))
    .bind(page_id)
    .fetch_all(pool)
    .await
    .context("Failed to list articles by page")?;

    rows.iter().map(row_to_article_sqlite).collect()
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    let status_str: String = row.get("status");
    let status = ArticleStatus::from_str(&status_str)
        .ok_or_else(|| anyhow::anyhow!("Invalid article status: {}", status_str))?;

    Ok(Article {
        id: row.get("id"),
        page_id: row.get("page_id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        seo_title: row.get("seo_title"),
        search_description: row.get("search_description"),
        author_id: row.get("author_id"),
        status,
        header_image_id: row.get("header_image_id"),
        thumbnail: row.get("thumbnail"),
        go_live_at: row.get("go_live_at"),
        first_published_at: row.get("first_published_at"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
