//! Entry import
//!
//! Every importable `post` item becomes an article under the blog page. An
//! article found by slug keeps its title, body and dates, but its taxonomy
//! links and header image are applied again.

use chrono::{DateTime, Local, NaiveDateTime, Offset, TimeZone, Utc};

use crate::config::ImportConfig;
use crate::models::{Article, Page};
use crate::services::text::{slugify, strip_tags, truncate_chars, truncate_words, MAX_FIELD_LENGTH};
use crate::wxr::{ExportDocument, Item, WxrError};

use super::authors::AuthorResolver;
use super::console::Console;
use super::content::ContentRewriter;
use super::error::ImportError;
use super::stats::ImportStats;
use super::taxonomy::{import_entry_categories, import_entry_tags};
use super::Migrator;

/// WordPress timestamp layout
const WP_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What happened to one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Created,
    /// An article with the same slug already existed
    Updated,
}

impl Migrator {
    /// Import every importable post, one at a time. A failing entry is
    /// reported and counted, the others still run.
    pub async fn import_entries(
        &self,
        doc: &ExportDocument,
        page: &Page,
        authors: &AuthorResolver,
        console: &mut dyn Console,
        stats: &mut ImportStats,
    ) {
        for item in doc.posts().filter(|item| item.is_importable_post()) {
            console.print(&format!("> {}... ", item.title()));

            match self.import_entry(doc, &item, page, authors).await {
                Ok((article, outcome)) => {
                    console.println("OK");
                    tracing::debug!("Entry '{}' {:?} as article {}", article.slug, outcome, article.id);
                    match outcome {
                        EntryOutcome::Created => stats.created += 1,
                        EntryOutcome::Updated => stats.updated += 1,
                    }
                }
                Err(e) => {
                    console.println("FAILED");
                    tracing::error!(
                        "Failed to import entry '{}' (post {}): {}",
                        item.title(),
                        item.post_id().unwrap_or("?"),
                        e
                    );
                    stats.failed += 1;
                }
            }
        }
    }

    /// Import one post item as an article of `page`
    pub async fn import_entry(
        &self,
        doc: &ExportDocument,
        item: &Item<'_>,
        page: &Page,
        authors: &AuthorResolver,
    ) -> Result<(Article, EntryOutcome), ImportError> {
        let content = ContentRewriter::new(&self.images, &self.config.upload_path_marker)
            .rewrite(item.content())
            .await;

        let post_id = item.post_id().unwrap_or_default();
        let title = truncate_chars(item.title(), MAX_FIELD_LENGTH);
        let created_at = entry_date(item, self.config.use_tz)?;
        let go_live_at = go_live_date(item, created_at);
        let excerpt = entry_excerpt(item, &self.config);
        let slug = entry_slug(&title, post_id);

        let existing = self.articles.get_by_slug(&slug).await?;
        let (mut article, outcome) = match existing {
            Some(existing) => (existing, EntryOutcome::Updated),
            None => {
                let mut article = Article::new(page.id, slug, title, content);
                article.search_description = excerpt.clone();
                article.excerpt = excerpt;
                article.author_id = item
                    .creator()
                    .and_then(|creator| authors.get(creator))
                    .map(|user| user.id);
                article.created_at = created_at;
                article.first_published_at = Some(created_at);
                article.go_live_at = Some(go_live_at);

                let mut created = self.articles.create(&article).await?;
                if item.status() == Some("publish") {
                    created = self.articles.publish(created.id, created_at).await?;
                }
                (created, EntryOutcome::Created)
            }
        };

        import_entry_tags(item, article.id, self.tags.as_ref()).await?;
        import_entry_categories(item, article.id, self.categories.as_ref()).await?;
        self.attach_header_image(doc, item, &mut article).await;

        let saved = self.articles.save(&article).await?;
        Ok((saved, outcome))
    }

    /// Rehost the `_thumbnail_id` attachment as the article's header image.
    /// Missing attachments and failed downloads leave the article as it is.
    async fn attach_header_image(&self, doc: &ExportDocument, item: &Item<'_>, article: &mut Article) {
        let Some(attachment_id) = item.header_image_id() else {
            return;
        };
        let Some(attachment) = doc.find_attachment(attachment_id) else {
            tracing::debug!("Header image {} of '{}' is not in the export", attachment_id, article.slug);
            return;
        };
        let Some(url) = attachment.attachment_url().filter(|url| !url.is_empty()) else {
            return;
        };

        let title = match attachment.title() {
            "" => article.title.clone(),
            title => truncate_chars(title, MAX_FIELD_LENGTH),
        };
        if let Some(image) = self.images.rehost(url, &title).await {
            article.header_image_id = Some(image.id);
            article.thumbnail = Some(image.url);
        }
    }
}

/// `post_date` as the creation timestamp, in UTC when `use_tz` is set and in
/// the local zone otherwise
fn entry_date(item: &Item<'_>, use_tz: bool) -> Result<DateTime<Utc>, WxrError> {
    let post_id = item.post_id().unwrap_or_default();
    let value = item.post_date().ok_or_else(|| WxrError::MissingField {
        post_id: post_id.to_string(),
        field: "post_date",
    })?;
    let invalid = || WxrError::InvalidDate {
        post_id: post_id.to_string(),
        field: "post_date",
        value: value.to_string(),
    };

    let naive = NaiveDateTime::parse_from_str(value, WP_DATE_FORMAT).map_err(|_| invalid())?;
    if use_tz {
        Ok(Utc.from_utc_datetime(&naive))
    } else {
        Ok(local_to_utc(&Local, &naive))
    }
}

/// Read `naive` as wall-clock time in `tz`. Ambiguous times take the earlier
/// instant; times skipped by a DST transition take the offset in effect at
/// the same UTC reading.
fn local_to_utc<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            let offset = tz.offset_from_utc_datetime(naive).fix();
            Utc.from_utc_datetime(&(*naive - offset))
        }
    }
}

/// `post_date_gmt`, or `fallback` when absent or unparseable (drafts carry
/// `0000-00-00 00:00:00`)
fn go_live_date(item: &Item<'_>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    item.post_date_gmt()
        .and_then(|value| NaiveDateTime::parse_from_str(value, WP_DATE_FORMAT).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(fallback)
}

/// Plain text excerpt, derived from the body when the export has none
fn entry_excerpt(item: &Item<'_>, config: &ImportConfig) -> String {
    let excerpt = strip_tags(item.excerpt()).trim().to_string();
    if !excerpt.is_empty() {
        return excerpt;
    }
    if config.auto_excerpt {
        truncate_words(&strip_tags(item.content()), config.excerpt_words)
    } else {
        String::new()
    }
}

fn entry_slug(title: &str, post_id: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("post-{}", post_id)
    } else {
        slug
    }
}
