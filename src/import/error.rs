//! Import errors

use crate::wxr::WxrError;

/// Errors raised by the migration engine
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Wxr(#[from] WxrError),

    /// An entry references a category missing from the category pass
    #[error("Category '{0}' was not imported")]
    UnknownCategory(String),

    /// Operator input could not be read
    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::Prompt(e.to_string())
    }
}
