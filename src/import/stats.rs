//! Run summary

use std::fmt;

/// Counters reported at the end of a migration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub authors: usize,
    pub categories: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub images_rehosted: usize,
    pub images_unavailable: usize,
}

impl ImportStats {
    /// Entries that were imported, new or existing
    pub fn imported(&self) -> usize {
        self.created + self.updated
    }
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} authors, {} categories, {} entries created, {} updated, {} failed, {} images rehosted, {} unavailable",
            self.authors,
            self.categories,
            self.created,
            self.updated,
            self.failed,
            self.images_rehosted,
            self.images_unavailable
        )
    }
}
