//! Configuration management
//!
//! This module handles loading and parsing configuration for the Noteva importer.
//! Configuration can be loaded from:
//! - config.yml file (the same file the Noteva server reads)
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload configuration (where rehosted images land)
    #[serde(default)]
    pub upload: UploadConfig,
    /// WordPress import behaviour
    #[serde(default)]
    pub import: ImportConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/noteva.db".to_string()
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload directory path
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Public URL prefix the upload directory is served under
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            public_prefix: default_public_prefix(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_public_prefix() -> String {
    "/uploads".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl UploadConfig {
    /// Get a file extension for an image MIME type
    pub fn get_extension(&self, mime_type: &str) -> Option<&'static str> {
        let ext = match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            "image/bmp" => "bmp",
            "image/tiff" => "tiff",
            "image/x-icon" => "ico",
            _ => return None,
        };
        Some(ext)
    }

    /// Public URL of a stored file
    pub fn public_url(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix.trim_end_matches('/'), filename)
    }
}

/// WordPress import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Path fragment identifying images hosted by the source blog
    #[serde(default = "default_upload_path_marker")]
    pub upload_path_marker: String,
    /// Derive an excerpt from the content when the export has none
    #[serde(default = "default_true")]
    pub auto_excerpt: bool,
    /// Number of words kept in a derived excerpt
    #[serde(default = "default_excerpt_words")]
    pub excerpt_words: usize,
    /// Interpret `post_date` as GMT instead of local time
    #[serde(default = "default_true")]
    pub use_tz: bool,
    /// Timeout for a single image download
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// User agent sent when downloading images
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            upload_path_marker: default_upload_path_marker(),
            auto_excerpt: true,
            excerpt_words: default_excerpt_words(),
            use_tz: true,
            http_timeout_seconds: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_upload_path_marker() -> String {
    "wp-content".to_string()
}

fn default_true() -> bool {
    true
}

fn default_excerpt_words() -> usize {
    50
}

fn default_http_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("noteva-import/{}", env!("CARGO_PKG_VERSION"))
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - NOTEVA_DATABASE_URL
    /// - NOTEVA_UPLOAD_PATH
    /// - NOTEVA_UPLOAD_PUBLIC_PREFIX
    /// - NOTEVA_IMPORT_UPLOAD_PATH_MARKER
    /// - NOTEVA_IMPORT_AUTO_EXCERPT
    /// - NOTEVA_IMPORT_USE_TZ
    /// - NOTEVA_IMPORT_HTTP_TIMEOUT_SECONDS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NOTEVA_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(path) = std::env::var("NOTEVA_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(prefix) = std::env::var("NOTEVA_UPLOAD_PUBLIC_PREFIX") {
            self.upload.public_prefix = prefix;
        }

        if let Ok(marker) = std::env::var("NOTEVA_IMPORT_UPLOAD_PATH_MARKER") {
            self.import.upload_path_marker = marker;
        }
        if let Ok(value) = std::env::var("NOTEVA_IMPORT_AUTO_EXCERPT") {
            if let Some(flag) = parse_bool(&value) {
                self.import.auto_excerpt = flag;
            }
        }
        if let Ok(value) = std::env::var("NOTEVA_IMPORT_USE_TZ") {
            if let Some(flag) = parse_bool(&value) {
                self.import.use_tz = flag;
            }
        }
        if let Ok(timeout) = std::env::var("NOTEVA_IMPORT_HTTP_TIMEOUT_SECONDS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.import.http_timeout_seconds = timeout;
            }
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ENV_KEYS: &[&str] = &[
        "NOTEVA_DATABASE_URL",
        "NOTEVA_UPLOAD_PATH",
        "NOTEVA_UPLOAD_PUBLIC_PREFIX",
        "NOTEVA_IMPORT_UPLOAD_PATH_MARKER",
        "NOTEVA_IMPORT_AUTO_EXCERPT",
        "NOTEVA_IMPORT_USE_TZ",
        "NOTEVA_IMPORT_HTTP_TIMEOUT_SECONDS",
    ];

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        let guard = super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
        guard
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.database.url, "data/noteva.db");
        assert_eq!(config.upload.path, PathBuf::from("uploads"));
        assert_eq!(config.upload.public_prefix, "/uploads");
        assert_eq!(config.import.upload_path_marker, "wp-content");
        assert!(config.import.auto_excerpt);
        assert_eq!(config.import.excerpt_words, 50);
        assert!(config.import.use_tz);
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.database.url, "data/noteva.db");
        assert_eq!(config.import.http_timeout_seconds, 30);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "import:\n  auto_excerpt: false\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert!(!config.import.auto_excerpt);
        assert_eq!(config.import.excerpt_words, 50);
        assert_eq!(config.database.url, "data/noteva.db");
    }

    #[test]
    fn test_load_ignores_server_sections() {
        // The importer shares config.yml with the Noteva server
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 9000
database:
  driver: sqlite
  url: "blog/noteva.db"
upload:
  path: "static/uploads"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.database.url, "blog/noteva.db");
        assert_eq!(config.upload.path, PathBuf::from("static/uploads"));
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "import:\n  excerpt_words: not_a_number\n").unwrap();

        let result = Config::load(file.path());

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("parse"));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = lock_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "database:\n  url: \"file.db\"\n").unwrap();

        std::env::set_var("NOTEVA_DATABASE_URL", "env.db");
        std::env::set_var("NOTEVA_IMPORT_USE_TZ", "false");
        std::env::set_var("NOTEVA_IMPORT_HTTP_TIMEOUT_SECONDS", "5");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.database.url, "env.db");
        assert!(!config.import.use_tz);
        assert_eq!(config.import.http_timeout_seconds, 5);

        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_invalid_values_ignored() {
        let _guard = lock_env();

        std::env::set_var("NOTEVA_IMPORT_AUTO_EXCERPT", "maybe");
        std::env::set_var("NOTEVA_IMPORT_HTTP_TIMEOUT_SECONDS", "soon");

        let config = Config::load_with_env(std::path::Path::new("nonexistent_config.yml")).unwrap();

        assert!(config.import.auto_excerpt);
        assert_eq!(config.import.http_timeout_seconds, 30);

        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_upload_public_url() {
        let mut upload = UploadConfig::default();
        assert_eq!(upload.public_url("a.png"), "/uploads/a.png");

        upload.public_prefix = "https://cdn.example.com/media/".to_string();
        assert_eq!(upload.public_url("a.png"), "https://cdn.example.com/media/a.png");
    }

    #[test]
    fn test_upload_extension_for_mime() {
        let upload = UploadConfig::default();
        assert_eq!(upload.get_extension("image/jpeg"), Some("jpg"));
        assert_eq!(upload.get_extension("text/html"), None);
    }
}
