//! WXR reader errors

/// Errors raised while loading or reading a WordPress export
#[derive(Debug, thiserror::Error)]
pub enum WxrError {
    #[error("Failed to read WXR file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed WXR document near byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("WXR document has no <channel> element")]
    MissingChannel,

    /// No supported `wp` namespace version carries a `wxr_version` marker
    #[error("Could not resolve the WXR namespace version (tried {tried})")]
    UnresolvedNamespace { tried: String },

    #[error("Item {post_id} is missing required field '{field}'")]
    MissingField {
        post_id: String,
        field: &'static str,
    },

    #[error("Item {post_id} has an invalid {field}: '{value}'")]
    InvalidDate {
        post_id: String,
        field: &'static str,
        value: String,
    },
}
