//! Article model
//!
//! This module provides:
//! - `Article` entity, an entry living under the blog root page
//! - `ArticleStatus` enum for publication states

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Article entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Parent page (the blog root)
    pub page_id: i64,
    /// URL-friendly slug
    pub slug: String,
    /// Article title
    pub title: String,
    /// HTML body
    pub content: String,
    /// Plain text summary
    pub excerpt: String,
    /// Title used in search results
    pub seo_title: String,
    /// Meta description
    pub search_description: String,
    /// Owning user, if any
    pub author_id: Option<i64>,
    /// Publication status
    pub status: ArticleStatus,
    /// Header image
    #[serde(default)]
    pub header_image_id: Option<i64>,
    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Scheduled go-live timestamp
    pub go_live_at: Option<DateTime<Utc>>,
    /// First publication timestamp
    pub first_published_at: Option<DateTime<Utc>>,
    /// Latest publication timestamp
    pub published_at: Option<DateTime<Utc>>,
    /// Creation timestamp (the entry date)
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Create a new draft article under the given page
    pub fn new(page_id: i64, slug: String, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            page_id,
            slug,
            seo_title: title.clone(),
            title,
            content,
            excerpt: String::new(),
            search_description: String::new(),
            author_id: None,
            status: ArticleStatus::Draft,
            header_image_id: None,
            thumbnail: None,
            go_live_at: None,
            first_published_at: None,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the article is publicly visible
    pub fn is_live(&self) -> bool {
        self.status == ArticleStatus::Published
    }
}

/// Article publication status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    /// Draft - not visible to public
    #[default]
    Draft,
    /// Published - visible to public
    Published,
}

impl ArticleStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
        }
    }

    /// Parse status from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(ArticleStatus::Draft),
            "published" => Some(ArticleStatus::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
