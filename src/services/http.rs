//! HTTP client used to download images from the source blog
//!
//! A single GET per URL with a fixed timeout and no retries. Callers decide
//! what a non-2xx status means. Bodies larger than the upload limit are
//! abandoned while streaming.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ImportConfig;

/// Response of a GET request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// `Content-Type` header without parameters, if present
    pub content_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors from fetching a URL
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("Connection to '{url}' failed: {message}")]
    Connection { url: String, message: String },

    #[error("Unexpected status {status} from '{url}'")]
    Status { url: String, status: u16 },

    #[error("Body of '{url}' exceeds {max} bytes")]
    TooLarge { url: String, max: u64 },
}

/// Minimal HTTP client contract
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request. Non-2xx responses are returned, not errors.
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// `HttpClient` backed by reqwest
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    max_body: u64,
}

impl ReqwestHttpClient {
    /// `max_body` is the largest body accepted, normally `upload.max_file_size`
    pub fn new(config: &ImportConfig, max_body: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, max_body })
    }

    pub fn boxed(config: &ImportConfig, max_body: u64) -> anyhow::Result<Arc<dyn HttpClient>> {
        Ok(Arc::new(Self::new(config, max_body)?))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let connection_error = |e: reqwest::Error| FetchError::Connection {
            url: url.to_string(),
            message: e.to_string(),
        };

        let too_large = || FetchError::TooLarge {
            url: url.to_string(),
            max: self.max_body,
        };

        let mut response = self.client.get(parsed).send().await.map_err(connection_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(media_type);

        if response.content_length().is_some_and(|len| len > self.max_body) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(connection_error)? {
            if (body.len() + chunk.len()) as u64 > self.max_body {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Strip parameters from a `Content-Type` value: `image/png; q=1` -> `image/png`
fn media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// `HttpClient` serving canned responses; unknown URLs fail to connect
#[cfg(test)]
#[derive(Default)]
pub(crate) struct StubHttpClient {
    responses: std::collections::HashMap<String, HttpResponse>,
    requests: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl StubHttpClient {
    pub fn with_image(mut self, url: &str, body: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            HttpResponse {
                status: 200,
                content_type: Some("image/png".to_string()),
                body: body.to_vec(),
            },
        );
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses.insert(
            url.to_string(),
            HttpResponse {
                status,
                content_type: Some("text/html".to_string()),
                body: b"error".to_vec(),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl HttpClient for StubHttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Connection {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}
