//! Image repository
//!
//! Records of rehosted media files.

use crate::db::DynDatabasePool;
use crate::models::Image;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn create(&self, image: &Image) -> Result<Image>;
}

pub struct SqlxImageRepository {
    pool: DynDatabasePool,
}

impl SqlxImageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ImageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ImageRepository for SqlxImageRepository {
    async fn create(&self, image: &Image) -> Result<Image> {
        create_image_sqlite(self.pool.sqlite(), image).await
    }
}

#[cfg(test)]
use sqlx::Row;

#[cfg(test)]
impl SqlxImageRepository {
    pub(crate) async fn get_by_id(&self, id: i64) -> Result<Option<Image>> {
        let row = sqlx::query(
            "SELECT id, title, filename, url, size, content_type, source_url, created_at FROM images WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get image")?;

        Ok(row.map(|row| Image {
            id: row.get("id"),
            title: row.get("title"),
            filename: row.get("filename"),
            url: row.get("url"),
            size: row.get("size"),
            content_type: row.get("content_type"),
            source_url: row.get("source_url"),
            created_at: row.get("created_at"),
        }))
    }

    pub(crate) async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM images")
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count images")?;
        Ok(row.get("count"))
    }
}

// SQLite implementations
async fn create_image_sqlite(pool: &SqlitePool, image: &Image) -> Result<Image> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO images (title, filename, url, size, content_type, source_url, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&image.title)
    .bind(&image.filename)
    .bind(&image.url)
    .bind(image.size)
    .bind(&image.content_type)
    .bind(&image.source_url)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create image")?;

    Ok(Image {
        id: result.last_insert_rowid(),
        created_at: now,
        ..image.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    #[tokio::test]
    async fn test_create_and_get_image() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let repo = SqlxImageRepository::new(pool);

        let image = Image::new(
            "Sunset".into(),
            "abc.jpg".into(),
            "/uploads/abc.jpg".into(),
            1024,
            "image/jpeg".into(),
            Some("http://old.example.com/wp-content/uploads/sunset.jpg".into()),
        );
        let created = repo.create(&image).await.unwrap();

        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Sunset");
        assert_eq!(found.size, 1024);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
