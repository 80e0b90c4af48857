//! Tag repository
//!
//! Database operations for tags and their article links.

use crate::db::DynDatabasePool;
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    /// Get tag by name
    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>>;

    /// Check if a tag slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Return the tag named `name`, creating it with `slug` (suffixed when
    /// taken) if it does not exist yet
    async fn create_or_get(&self, name: &str, slug: &str) -> Result<Tag>;

    /// Link a tag to an article (no-op when already linked)
    async fn link_article(&self, tag_id: i64, article_id: i64) -> Result<()>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        create_tag_sqlite(self.pool.sqlite(), tag).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Tag>> {
        get_tag_by_name_sqlite(self.pool.sqlite(), name).await
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        exists_by_slug_sqlite(self.pool.sqlite(), slug).await
    }

    async fn create_or_get(&self, name: &str, slug: &str) -> Result<Tag> {
        if let Some(existing) = self.get_by_name(name).await? {
            return Ok(existing);
        }

        let mut candidate = slug.to_string();
        let mut counter = 1;
        while self.exists_by_slug(&candidate).await? {
            counter += 1;
            candidate = format!("{}-{}", slug, counter);
        }

        self.create(&Tag::new(candidate, name.to_string())).await
    }

    async fn link_article(&self, tag_id: i64, article_id: i64) -> Result<()> {
        add_tag_to_article_sqlite(self.pool.sqlite(), tag_id, article_id).await
    }
}

#[cfg(test)]
impl SqlxTagRepository {
    /// Tags linked to an article, by name
    pub(crate) async fn get_by_article(&self, article_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.slug, t.name, t.created_at
            FROM tags t
            INNER JOIN article_tags at ON at.tag_id = t.id
            WHERE at.article_id = ?
            ORDER BY t.name ASC
            "#,
        )
        .bind(article_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to get tags by article")?;

        rows.iter().map(row_to_tag_sqlite).collect()
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<Tag> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO tags (slug, name, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&tag.slug)
    .bind(&tag.name)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        slug: tag.slug.clone(),
        name: tag.name.clone(),
        created_at: now,
    })
}

async fn get_tag_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, name, created_at
        FROM tags
        WHERE name = ?
        "#,
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by name")?;

    row.as_ref().map(row_to_tag_sqlite).transpose()
}

async fn exists_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<bool> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM tags WHERE slug = ?")
        .bind(slug)
        .fetch_one(pool)
        .await
        .context("Failed to check tag slug")?;

    Ok(row.get::<i64, _>("count") > 0)
}

async fn add_tag_to_article_sqlite(pool: &SqlitePool, tag_id: i64, article_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO article_tags (article_id, tag_id)
        VALUES (?, ?)
        "#,
    )
    .bind(article_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to add tag to article")?;

    Ok(())
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxTagRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxTagRepository::new(pool.clone());
        (pool, repo)
    }

    /// Helper to create a page and an article under it
    async fn create_test_article(pool: &SqlitePool) -> i64 {
        let page = sqlx::query(
            "INSERT INTO pages (slug, title, content, content_html) VALUES ('blog', 'Blog', '', '')",
        )
        .execute(pool)
        .await
        .expect("Failed to create test page");

        let article = sqlx::query("INSERT INTO articles (page_id, slug, title, content) VALUES (?, ?, ?, ?)")
            .bind(page.last_insert_rowid())
            .bind("hello")
            .bind("Hello")
            .bind("Body")
            .execute(pool)
            .await
            .expect("Failed to create test article");
        article.last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_or_get_reuses_by_name() {
        let (_pool, repo) = setup_test_repo().await;

        let first = repo.create_or_get("Rust", "rust").await.unwrap();
        let second = repo.create_or_get("Rust", "something-else").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.slug, "rust");
    }

    #[tokio::test]
    async fn test_create_or_get_suffixes_taken_slug() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create_or_get("Rust", "rust").await.unwrap();

        let other = repo.create_or_get("rust", "rust").await.unwrap();

        assert_eq!(other.slug, "rust-2");
        assert!(repo.exists_by_slug("rust-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_link_article_is_idempotent() {
        let (pool, repo) = setup_test_repo().await;
        let article_id = create_test_article(pool.sqlite()).await;
        let tag = repo.create_or_get("Rust", "rust").await.unwrap();

        repo.link_article(tag.id, article_id).await.unwrap();
        repo.link_article(tag.id, article_id).await.unwrap();

        let tags = repo.get_by_article(article_id).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0], tag);
    }
}
