//! Page repository
//!
//! The blog root page imported articles are attached to.

use crate::db::DynDatabasePool;
use crate::models::Page;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait PageRepository: Send + Sync {
    async fn create(&self, page: &Page) -> Result<Page>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>>;
    async fn update(&self, page: &Page) -> Result<Page>;
}

pub struct SqlxPageRepository {
    pool: DynDatabasePool,
}

impl SqlxPageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PageRepository for SqlxPageRepository {
    async fn create(&self, page: &Page) -> Result<Page> {
        create_sqlite(self.pool.sqlite(), page).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        get_by_slug_sqlite(self.pool.sqlite(), slug).await
    }

    async fn update(&self, page: &Page) -> Result<Page> {
        update_sqlite(self.pool.sqlite(), page).await
    }
}

// SQLite implementations
async fn create_sqlite(pool: &SqlitePool, page: &Page) -> Result<Page> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO pages (slug, title, content, content_html, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&page.slug)
    .bind(&page.title)
    .bind(&page.content)
    .bind(&page.content_html)
    .bind(page.status.to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create page")?;

    Ok(Page {
        id: result.last_insert_rowid(),
        slug: page.slug.clone(),
        title: page.title.clone(),
        content: page.content.clone(),
        content_html: page.content_html.clone(),
        status: page.status.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Page>> {
    let row = sqlx::query("SELECT id, slug, title, content, content_html, status, created_at, updated_at FROM pages WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get page")?;
    row.map(|r| row_to_page_sqlite(&r)).transpose()
}

async fn get_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Page>> {
    let row = sqlx::query("SELECT id, slug, title, content, content_html, status, created_at, updated_at FROM pages WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get page")?;
    row.map(|r| row_to_page_sqlite(&r)).transpose()
}

async fn update_sqlite(pool: &SqlitePool, page: &Page) -> Result<Page> {
    let now = Utc::now();
    sqlx::query("UPDATE pages SET slug = ?, title = ?, content = ?, content_html = ?, status = ?, updated_at = ? WHERE id = ?")
        .bind(&page.slug)
        .bind(&page.title)
        .bind(&page.content)
        .bind(&page.content_html)
        .bind(page.status.to_string())
        .bind(now)
        .bind(page.id)
        .execute(pool)
        .await
        .context("Failed to update page")?;
    get_by_id_sqlite(pool, page.id).await?.ok_or_else(|| anyhow::anyhow!("Page not found after update"))
}

fn row_to_page_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Page> {
    let status_str: String = row.get("status");
    Ok(Page {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        content_html: row.get("content_html"),
        status: status_str.parse().unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::PageStatus;

    async fn setup() -> SqlxPageRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxPageRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_and_get_by_slug() {
        let repo = setup().await;
        let created = repo.create(&Page::new("blog".into(), "Blog".into())).await.unwrap();
        assert!(created.id > 0);

        let found = repo.get_by_slug("blog").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.status, PageStatus::Draft);

        assert!(repo.get_by_slug("news").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_publishes() {
        let repo = setup().await;
        let mut page = repo.create(&Page::new("blog".into(), "Blog".into())).await.unwrap();

        page.status = PageStatus::Published;
        let updated = repo.update(&page).await.unwrap();

        assert_eq!(updated.status, PageStatus::Published);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let repo = setup().await;
        repo.create(&Page::new("blog".into(), "Blog".into())).await.unwrap();
        assert!(repo.create(&Page::new("blog".into(), "Other".into())).await.is_err());
    }
}
