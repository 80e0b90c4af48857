//! Test environment for the migration engine: an in-memory database, a
//! temporary upload directory and a stub HTTP client

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use super::{Migrator, MigrationOptions};
use crate::config::{Config, UploadConfig};
use crate::db::repositories::{
    ArticleRepository, PageRepository, SqlxArticleRepository, SqlxCategoryRepository, SqlxImageRepository,
    SqlxPageRepository, SqlxTagRepository, SqlxUserRepository, UserRepository,
};
use crate::db::{create_test_pool, migrations, DynDatabasePool};
use crate::models::{Article, Image, Page, User, UserRole};
use crate::services::http::StubHttpClient;
use crate::wxr::ExportDocument;

use super::console::ScriptedConsole;
use super::images::ImageRehoster;
use super::taxonomy::import_categories;

pub(crate) struct TestEnv {
    pub migrator: Migrator,
    pub http: Arc<StubHttpClient>,
    pub pool: DynDatabasePool,
    dir: TempDir,
}

impl TestEnv {
    pub async fn new(http: StubHttpClient) -> Self {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = Config {
            upload: UploadConfig {
                path: dir.path().join("uploads"),
                public_prefix: "/uploads".to_string(),
                ..UploadConfig::default()
            },
            ..Config::default()
        };

        let http = Arc::new(http);
        let migrator = Migrator::new(pool.clone(), &config, http.clone());

        Self {
            migrator,
            http,
            pool,
            dir,
        }
    }

    pub fn rehoster(&self) -> &ImageRehoster {
        self.migrator.rehoster()
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        SqlxUserRepository::boxed(self.pool.clone())
    }

    pub async fn add_user(&self, username: &str) -> User {
        let user = User::new(
            username.to_string(),
            format!("{}@example.com", username),
            "hash".to_string(),
            UserRole::Admin,
        );
        self.users().create(&user).await.expect("Failed to create user")
    }

    pub async fn user(&self, username: &str) -> User {
        self.users()
            .get_by_username(username)
            .await
            .unwrap()
            .expect("User not found")
    }

    pub async fn blog_page(&self) -> Page {
        self.migrator
            .get_blog_page(&MigrationOptions::default())
            .await
            .expect("Failed to get blog page")
    }

    pub async fn import_categories(&self, doc: &ExportDocument) {
        let mut console = ScriptedConsole::default();
        import_categories(doc.categories(), self.migrator.categories.as_ref(), &mut console)
            .await
            .expect("Failed to import categories");
    }

    pub async fn articles_of(&self, slug: &str) -> Vec<Article> {
        let Some(page) = SqlxPageRepository::new(self.pool.clone())
            .get_by_slug(slug)
            .await
            .unwrap()
        else {
            return Vec::new();
        };
        SqlxArticleRepository::new(self.pool.clone())
            .list_by_page(page.id)
            .await
            .unwrap()
    }

    pub async fn tag_names(&self, article_id: i64) -> Vec<String> {
        SqlxTagRepository::new(self.pool.clone())
            .get_by_article(article_id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect()
    }

    pub async fn category_names(&self, article_id: i64) -> Vec<String> {
        SqlxCategoryRepository::new(self.pool.clone())
            .get_by_article(article_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect()
    }

    pub async fn image(&self, id: i64) -> Image {
        SqlxImageRepository::new(self.pool.clone())
            .get_by_id(id)
            .await
            .unwrap()
            .expect("Image not found")
    }

    pub async fn image_count(&self) -> i64 {
        SqlxImageRepository::new(self.pool.clone()).count().await.unwrap()
    }
}
