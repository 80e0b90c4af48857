//! Blog root page
//!
//! Imported articles hang off a single page identified by its slug. The page
//! itself carries no body of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visibility of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    #[default]
    Draft,
    Published,
}

impl std::fmt::Display for PageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Published => "published",
        })
    }
}

impl std::str::FromStr for PageStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            other => Err(anyhow::anyhow!("Invalid page status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub slug: String,
    pub title: String,
    /// Markdown source, empty for a blog root
    pub content: String,
    /// Rendered `content`
    pub content_html: String,
    pub status: PageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    /// Empty draft page
    pub fn new(slug: String, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            slug,
            title,
            content: String::new(),
            content_html: String::new(),
            status: PageStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PageStatus::Published
    }

    pub fn publish(&mut self) {
        self.status = PageStatus::Published;
    }
}
