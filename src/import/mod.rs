//! WordPress to Noteva migration engine
//!
//! A run is strictly sequential: the blog page is ensured, every author is
//! resolved, every category is imported, then entries are imported one by
//! one against those lookup tables.

pub mod authors;
pub mod console;
pub mod content;
pub mod entries;
pub mod error;
pub mod images;
pub mod stats;
pub mod taxonomy;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use crate::config::{Config, ImportConfig};
use crate::db::repositories::{
    ArticleRepository, CategoryRepository, PageRepository, SqlxArticleRepository,
    SqlxCategoryRepository, SqlxImageRepository, SqlxPageRepository, SqlxTagRepository,
    SqlxUserRepository, TagRepository, UserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::Page;
use crate::services::http::HttpClient;
use crate::services::media::LocalImageStore;
use crate::wxr::ExportDocument;

pub use authors::{collect_authors, AuthorResolver};
pub use console::{Console, StdConsole};
pub use content::ContentRewriter;
pub use entries::EntryOutcome;
pub use error::ImportError;
pub use images::ImageRehoster;
pub use stats::ImportStats;
pub use taxonomy::{import_categories, CategoryMap};

/// Destination blog of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    pub blog_slug: String,
    pub blog_title: String,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            blog_slug: "blog".to_string(),
            blog_title: "Blog".to_string(),
        }
    }
}

/// Imports a parsed export into the destination database
pub struct Migrator {
    config: ImportConfig,
    users: Arc<dyn UserRepository>,
    pages: Arc<dyn PageRepository>,
    articles: Arc<dyn ArticleRepository>,
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
    images: ImageRehoster,
}

impl Migrator {
    pub fn new(pool: DynDatabasePool, config: &Config, http: Arc<dyn HttpClient>) -> Self {
        let store = LocalImageStore::boxed(config.upload.clone(), SqlxImageRepository::boxed(pool.clone()));

        Self {
            config: config.import.clone(),
            users: SqlxUserRepository::boxed(pool.clone()),
            pages: SqlxPageRepository::boxed(pool.clone()),
            articles: SqlxArticleRepository::boxed(pool.clone()),
            categories: SqlxCategoryRepository::boxed(pool.clone()),
            tags: SqlxTagRepository::boxed(pool),
            images: ImageRehoster::new(http, store),
        }
    }

    pub fn rehoster(&self) -> &ImageRehoster {
        &self.images
    }

    /// The page entries are created under, created and published when missing
    pub async fn get_blog_page(&self, options: &MigrationOptions) -> Result<Page, ImportError> {
        if let Some(page) = self.pages.get_by_slug(&options.blog_slug).await? {
            return Ok(page);
        }

        let mut page = self
            .pages
            .create(&Page::new(options.blog_slug.clone(), options.blog_title.clone()))
            .await?;
        page.publish();
        let page = self.pages.update(&page).await?;

        tracing::info!("Created blog page '{}' (id {})", page.slug, page.id);
        Ok(page)
    }

    /// Run a full migration of `doc`
    pub async fn run(
        &self,
        doc: &ExportDocument,
        options: &MigrationOptions,
        console: &mut dyn Console,
    ) -> Result<ImportStats, ImportError> {
        console.println("Starting migration from WordPress to Noteva");
        tracing::info!("Importing WXR {} export into '{}'", doc.version(), options.blog_slug);

        let page = self.get_blog_page(options).await?;

        console.println("- Importing authors");
        let names = collect_authors(doc);
        console.println(&format!("> {} authors found.", names.len()));
        let mut authors = AuthorResolver::new(self.users.clone());
        authors.resolve_all(&names, console).await?;

        console.println("- Importing categories");
        let categories = import_categories(doc.categories(), self.categories.as_ref(), console).await?;

        console.println("- Importing entries");
        let mut stats = ImportStats {
            authors: authors.len(),
            categories: categories.len(),
            ..ImportStats::default()
        };
        self.import_entries(doc, &page, &authors, console, &mut stats).await;

        stats.images_rehosted = self.images.rehosted();
        stats.images_unavailable = self.images.unavailable();

        console.println(&format!("Migration finished: {}", stats));
        tracing::info!("Migration finished: {}", stats);
        Ok(stats)
    }
}
