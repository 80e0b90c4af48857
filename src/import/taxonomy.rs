//! Category and tag import
//!
//! Categories are imported once for the whole export, before any entry, so
//! entries can link to them by name. Tags are created on demand per entry.

use std::collections::HashMap;

use crate::db::repositories::{CategoryRepository, TagRepository};
use crate::models::Category;
use crate::services::text::{slugify, truncate_chars, MAX_FIELD_LENGTH};
use crate::wxr::{CategoryNode, Item};

use super::console::Console;
use super::error::ImportError;

/// Imported categories keyed by title
#[derive(Debug, Default)]
pub struct CategoryMap {
    by_title: HashMap<String, Category>,
    /// nicename -> title, for parents written as nicenames
    titles_by_nicename: HashMap<String, String>,
}

impl CategoryMap {
    pub fn get(&self, title: &str) -> Option<&Category> {
        self.by_title.get(title)
    }

    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }

    /// Category already imported under `parent`, matched by title first and
    /// then by nicename
    fn parent(&self, parent: &str) -> Option<&Category> {
        self.by_title.get(parent).or_else(|| {
            self.titles_by_nicename
                .get(parent)
                .and_then(|title| self.by_title.get(title))
        })
    }

    fn insert(&mut self, nicename: &str, category: Category) {
        if !nicename.is_empty() {
            self.titles_by_nicename
                .insert(nicename.to_string(), category.name.clone());
        }
        self.by_title.insert(category.name.clone(), category);
    }
}

/// Import channel categories in document order.
///
/// A parent is only found when it was imported earlier in the same batch;
/// otherwise the category becomes a root.
pub async fn import_categories<'a>(
    nodes: impl Iterator<Item = CategoryNode<'a>>,
    repo: &dyn CategoryRepository,
    console: &mut dyn Console,
) -> Result<CategoryMap, ImportError> {
    let mut categories = CategoryMap::default();

    for node in nodes {
        let title = truncate_chars(node.name(), MAX_FIELD_LENGTH);
        if title.is_empty() {
            tracing::warn!("Skipping category without a name");
            continue;
        }

        let nicename = truncate_chars(node.nicename(), MAX_FIELD_LENGTH);
        let slug = category_slug(&nicename, &title);
        let parent_id = node
            .parent()
            .map(|p| truncate_chars(p, MAX_FIELD_LENGTH))
            .and_then(|p| categories.parent(&p).map(|c| c.id));

        console.print(&format!("> {}... ", title));
        let category = repo.upsert_by_name(&title, &slug, parent_id).await?;
        console.println("OK");

        tracing::debug!(
            "Imported category '{}' (slug {}, parent {:?})",
            category.name,
            category.slug,
            category.parent_id
        );
        categories.insert(&nicename, category);
    }

    Ok(categories)
}

/// Slug from the nicename, or from the title when the nicename has nothing usable
fn category_slug(nicename: &str, title: &str) -> String {
    let slug = slugify(nicename);
    if !slug.is_empty() {
        return slug;
    }
    let slug = slugify(title);
    if slug.is_empty() {
        "category".to_string()
    } else {
        slug
    }
}

/// Create or reuse the entry's tags and link them. Returns how many were linked.
pub async fn import_entry_tags(
    item: &Item<'_>,
    article_id: i64,
    repo: &dyn TagRepository,
) -> Result<usize, ImportError> {
    let mut linked = 0;

    for term in item.terms().filter(|t| t.is_tag()) {
        let name = truncate_chars(term.name, MAX_FIELD_LENGTH);
        if name.is_empty() {
            continue;
        }

        let mut slug = slugify(&name);
        if slug.is_empty() {
            slug = slugify(term.nicename);
        }
        if slug.is_empty() {
            slug = "tag".to_string();
        }

        let tag = repo.create_or_get(&name, &slug).await?;
        repo.link_article(tag.id, article_id).await?;
        linked += 1;
    }

    Ok(linked)
}

/// Link the entry to its categories. Every category must already exist.
pub async fn import_entry_categories(
    item: &Item<'_>,
    article_id: i64,
    repo: &dyn CategoryRepository,
) -> Result<usize, ImportError> {
    let mut linked = 0;

    for term in item.terms().filter(|t| t.is_category()) {
        let name = truncate_chars(term.name, MAX_FIELD_LENGTH);
        let category = repo
            .get_by_name(&name)
            .await?
            .ok_or_else(|| ImportError::UnknownCategory(name.clone()))?;

        repo.link_article(category.id, article_id).await?;
        linked += 1;
    }

    Ok(linked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxCategoryRepository, SqlxTagRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::import::console::ScriptedConsole;
    use crate::wxr::fixtures::{category, channel_with, post_item};
    use crate::wxr::ExportDocument;

    async fn setup() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        pool
    }

    async fn create_test_article(pool: &DynDatabasePool) -> i64 {
        let page = sqlx::query(
            "INSERT INTO pages (slug, title, content, content_html) VALUES ('blog', 'Blog', '', '')",
        )
        .execute(pool.sqlite())
        .await
        .unwrap();
        sqlx::query("INSERT INTO articles (page_id, slug, title, content) VALUES (?, 'a', 'A', '')")
            .bind(page.last_insert_rowid())
            .execute(pool.sqlite())
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn import(pool: &DynDatabasePool, body: &str) -> (CategoryMap, ScriptedConsole) {
        let doc = ExportDocument::parse(&channel_with("1.2", body)).unwrap();
        let repo = SqlxCategoryRepository::new(pool.clone());
        let mut console = ScriptedConsole::default();
        let map = import_categories(doc.categories(), &repo, &mut console)
            .await
            .expect("Failed to import categories");
        (map, console)
    }

    #[tokio::test]
    async fn test_parent_imported_first_is_linked() {
        let pool = setup().await;
        let body = [category("A", "a", ""), category("B", "b", "A")].join("\n");

        let (map, console) = import(&pool, &body).await;

        let a = map.get("A").unwrap();
        let b = map.get("B").unwrap();
        assert_eq!(a.parent_id, None);
        assert_eq!(b.parent_id, Some(a.id));
        assert_eq!(console.output, "> A... OK\n> B... OK\n");
    }

    #[tokio::test]
    async fn test_parent_listed_later_is_ignored() {
        let pool = setup().await;
        let body = [category("B", "b", "A"), category("A", "a", "")].join("\n");

        let (map, _) = import(&pool, &body).await;

        assert_eq!(map.get("B").unwrap().parent_id, None);
        assert_eq!(map.len(), 2);
    }

    #[tokio::test]
    async fn test_parent_by_nicename() {
        let pool = setup().await;
        let body = [
            category("Programming", "programming", ""),
            category("Rust", "rust", "programming"),
        ]
        .join("\n");

        let (map, _) = import(&pool, &body).await;

        assert_eq!(
            map.get("Rust").unwrap().parent_id,
            Some(map.get("Programming").unwrap().id)
        );
    }

    #[tokio::test]
    async fn test_reimport_overwrites_slug_and_parent() {
        let pool = setup().await;
        import(&pool, &[category("A", "a", ""), category("B", "b", "A")].join("\n")).await;

        let (map, _) = import(&pool, &category("B", "bee", "")).await;

        let b = map.get("B").unwrap();
        assert_eq!(b.slug, "bee");
        assert_eq!(b.parent_id, None);
    }

    #[tokio::test]
    async fn test_long_titles_are_truncated() {
        let pool = setup().await;
        let long = "x".repeat(300);

        let (map, _) = import(&pool, &category(&long, &long, "")).await;

        let title = "x".repeat(MAX_FIELD_LENGTH);
        let imported = map.get(&title).unwrap();
        assert_eq!(imported.slug.len(), MAX_FIELD_LENGTH);
    }

    #[tokio::test]
    async fn test_entry_tags_qualify_by_domain_and_nicename() {
        let pool = setup().await;
        let article_id = create_test_article(&pool).await;
        let terms = r#"<category domain="post_tag" nicename="x"><![CDATA[X]]></category>
<category domain="tag" nicename="rust-lang"><![CDATA[Rust Lang]]></category>
<category domain="post_tag"><![CDATA[No nicename]]></category>
<category domain="category" nicename="news"><![CDATA[News]]></category>"#;
        let doc = ExportDocument::parse(&channel_with("1.2", &post_item("1", "T", "a", "c", terms))).unwrap();
        let item = doc.items().next().unwrap();
        let repo = SqlxTagRepository::new(pool.clone());

        let linked = import_entry_tags(&item, article_id, &repo).await.unwrap();

        assert_eq!(linked, 2);
        let names: Vec<_> = repo
            .get_by_article(article_id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Rust Lang", "X"]);
    }

    #[tokio::test]
    async fn test_entry_categories_link_existing() {
        let pool = setup().await;
        let article_id = create_test_article(&pool).await;
        import(&pool, &category("News", "news", "")).await;
        let terms = r#"<category domain="category" nicename="news"><![CDATA[News]]></category>
<category domain="post_tag" nicename="news"><![CDATA[News]]></category>"#;
        let doc = ExportDocument::parse(&channel_with("1.2", &post_item("1", "T", "a", "c", terms))).unwrap();
        let item = doc.items().next().unwrap();
        let repo = SqlxCategoryRepository::new(pool.clone());

        let linked = import_entry_categories(&item, article_id, &repo).await.unwrap();

        assert_eq!(linked, 1);
        assert_eq!(repo.get_by_article(article_id).await.unwrap()[0].name, "News");
    }

    #[tokio::test]
    async fn test_entry_unknown_category_is_error() {
        let pool = setup().await;
        let article_id = create_test_article(&pool).await;
        let terms = r#"<category domain="category" nicename="ghost"><![CDATA[Ghost]]></category>"#;
        let doc = ExportDocument::parse(&channel_with("1.2", &post_item("1", "T", "a", "c", terms))).unwrap();
        let item = doc.items().next().unwrap();
        let repo = SqlxCategoryRepository::new(pool.clone());

        let result = import_entry_categories(&item, article_id, &repo).await;

        assert!(matches!(result, Err(ImportError::UnknownCategory(name)) if name == "Ghost"));
    }
}
