//! Category model
//!
//! Categories form a forest: each one optionally points at a parent imported
//! before it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub slug: String,
    /// Unique, the WordPress `cat_name`
    pub name: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// An unsaved category
    pub fn new(slug: String, name: String, parent_id: Option<i64>) -> Self {
        Self {
            id: 0,
            slug,
            name,
            parent_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_new_is_unsaved() {
        let category = Category::new("rust".to_string(), "Rust".to_string(), Some(1));

        assert_eq!(category.id, 0);
        assert_eq!(category.name, "Rust");
        assert_eq!(category.parent_id, Some(1));
    }
}
