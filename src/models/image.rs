//! Image model
//!
//! A rehosted media asset: bytes fetched from the source blog and stored in
//! the upload directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    /// Unique identifier
    pub id: i64,
    /// Display title (used in embeds)
    pub title: String,
    /// Stored file name inside the upload directory
    pub filename: String,
    /// Public URL of the stored file
    pub url: String,
    /// Size in bytes
    pub size: i64,
    /// MIME type
    pub content_type: String,
    /// Where the bytes were fetched from
    pub source_url: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub fn new(
        title: String,
        filename: String,
        url: String,
        size: i64,
        content_type: String,
        source_url: Option<String>,
    ) -> Self {
        Self {
            id: 0, // Will be set by the database
            title,
            filename,
            url,
            size,
            content_type,
            source_url,
            created_at: Utc::now(),
        }
    }

    /// Embed placeholder referencing this image inside article content
    pub fn embed_tag(&self) -> String {
        format!(
            r#"<embed alt="{}" embedtype="image" format="fullwidth" id="{}"/>"#,
            html_escape::encode_double_quoted_attribute(&self.title),
            self.id
        )
    }
}
