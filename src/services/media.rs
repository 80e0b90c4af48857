//! Local media storage
//!
//! Rehosted images are written into the upload directory under a random file
//! name and recorded in the `images` table.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::db::repositories::ImageRepository;
use crate::models::Image;

/// Media storage errors
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("File too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: u64, max: u64 },

    #[error("Empty file")]
    Empty,

    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Asset store for downloaded images
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist image bytes and return the recorded asset
    async fn store(
        &self,
        bytes: &[u8],
        title: &str,
        source_url: &str,
        content_type: Option<&str>,
    ) -> Result<Image, MediaError>;
}

/// `ImageStore` writing to the configured upload directory
pub struct LocalImageStore {
    config: UploadConfig,
    images: Arc<dyn ImageRepository>,
}

impl LocalImageStore {
    pub fn new(config: UploadConfig, images: Arc<dyn ImageRepository>) -> Self {
        Self { config, images }
    }

    pub fn boxed(config: UploadConfig, images: Arc<dyn ImageRepository>) -> Arc<dyn ImageStore> {
        Arc::new(Self::new(config, images))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(
        &self,
        bytes: &[u8],
        title: &str,
        source_url: &str,
        content_type: Option<&str>,
    ) -> Result<Image, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        let size = bytes.len() as u64;
        if size > self.config.max_file_size {
            return Err(MediaError::TooLarge {
                size,
                max: self.config.max_file_size,
            });
        }

        ensure_upload_dir(&self.config.path).await?;

        let ext = get_extension(&self.config, source_url, content_type);
        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        fs::write(self.config.path.join(&filename), bytes).await?;

        let content_type = content_type
            .filter(|ct| ct.starts_with("image/"))
            .map(str::to_string)
            .unwrap_or_else(|| mime_for_extension(&ext).to_string());

        let image = Image::new(
            title.to_string(),
            filename.clone(),
            self.config.public_url(&filename),
            size as i64,
            content_type,
            Some(source_url.to_string()),
        );

        let created = self.images.create(&image).await?;
        tracing::debug!("Stored image {} as {}", source_url, filename);
        Ok(created)
    }
}

async fn ensure_upload_dir(path: &Path) -> Result<(), MediaError> {
    if !path.exists() {
        fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// File extension: from the content type, else from the URL path, else `bin`
fn get_extension(config: &UploadConfig, source_url: &str, content_type: Option<&str>) -> String {
    if let Some(ext) = content_type.and_then(|ct| config.get_extension(ct)) {
        return ext.to_string();
    }

    let path = url::Url::parse(source_url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| source_url.to_string());
    let last_segment = path.rsplit('/').next().unwrap_or_default();

    if let Some((_, ext)) = last_segment.rsplit_once('.') {
        if !ext.is_empty() && ext.len() < 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return ext.to_lowercase();
        }
    }

    "bin".to_string()
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxImageRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_store(dir: &Path, max_file_size: u64) -> LocalImageStore {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let config = UploadConfig {
            path: dir.to_path_buf(),
            public_prefix: "/uploads".to_string(),
            max_file_size,
        };
        LocalImageStore::new(config, SqlxImageRepository::boxed(pool))
    }

    #[test]
    fn test_get_extension() {
        let config = UploadConfig::default();

        assert_eq!(get_extension(&config, "http://x/a.gif", Some("image/png")), "png");
        assert_eq!(get_extension(&config, "http://x/wp-content/a.JPEG?w=300", None), "jpeg");
        assert_eq!(get_extension(&config, "http://x/files/photo", Some("text/html")), "bin");
    }

    #[tokio::test]
    async fn test_store_writes_file_and_records_image() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let store = setup_store(&uploads, 1024).await;

        let image = store
            .store(b"fake-png", "Logo", "http://old.example.com/wp-content/logo.png", Some("image/png"))
            .await
            .expect("Failed to store image");

        assert!(image.id > 0);
        assert_eq!(image.title, "Logo");
        assert!(image.filename.ends_with(".png"));
        assert_eq!(image.url, format!("/uploads/{}", image.filename));
        assert_eq!(image.content_type, "image/png");

        let written = std::fs::read(uploads.join(&image.filename)).unwrap();
        assert_eq!(written, b"fake-png");
    }

    #[tokio::test]
    async fn test_store_rejects_large_and_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(dir.path(), 4).await;

        let too_large = store.store(b"12345", "x", "http://x/a.png", None).await;
        assert!(matches!(too_large, Err(MediaError::TooLarge { size: 5, max: 4 })));

        let empty = store.store(b"", "x", "http://x/a.png", None).await;
        assert!(matches!(empty, Err(MediaError::Empty)));
    }

    #[tokio::test]
    async fn test_store_guesses_content_type_from_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = setup_store(dir.path(), 1024).await;

        let image = store
            .store(b"gif", "Anim", "http://x/files/2010/anim.gif", Some("application/octet-stream"))
            .await
            .unwrap();

        assert_eq!(image.content_type, "image/gif");
        assert!(image.filename.ends_with(".gif"));
    }
}
