//! Image rehosting
//!
//! Downloads an image from the source blog and stores it locally. Any failure
//! is logged and reported as `None`, so a broken image never fails an entry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::models::Image;
use crate::services::http::{FetchError, HttpClient, HttpResponse};
use crate::services::media::ImageStore;

pub struct ImageRehoster {
    http: Arc<dyn HttpClient>,
    store: Arc<dyn ImageStore>,
    rehosted: AtomicUsize,
    unavailable: AtomicUsize,
}

impl ImageRehoster {
    pub fn new(http: Arc<dyn HttpClient>, store: Arc<dyn ImageStore>) -> Self {
        Self {
            http,
            store,
            rehosted: AtomicUsize::new(0),
            unavailable: AtomicUsize::new(0),
        }
    }

    /// GET `url`, treating transport errors and non-2xx statuses as absent
    pub async fn fetch(&self, url: &str) -> Option<HttpResponse> {
        match self.http.get(url).await {
            Ok(response) if response.is_success() => Some(response),
            Ok(response) => {
                let e = FetchError::Status {
                    url: url.to_string(),
                    status: response.status,
                };
                tracing::warn!("Image unavailable: {}", e);
                None
            }
            Err(e) => {
                tracing::warn!("Image unavailable: {}", e);
                None
            }
        }
    }

    /// Download `url` and store it as a new image titled `title`
    pub async fn rehost(&self, url: &str, title: &str) -> Option<Image> {
        let Some(response) = self.fetch(url).await else {
            self.unavailable.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match self
            .store
            .store(&response.body, title, url, response.content_type.as_deref())
            .await
        {
            Ok(image) => {
                tracing::debug!("Rehosted {} as image {}", url, image.id);
                self.rehosted.fetch_add(1, Ordering::Relaxed);
                Some(image)
            }
            Err(e) => {
                tracing::warn!("Failed to store image from {}: {}", url, e);
                self.unavailable.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Images stored so far
    pub fn rehosted(&self) -> usize {
        self.rehosted.load(Ordering::Relaxed)
    }

    /// Images that could not be fetched or stored
    pub fn unavailable(&self) -> usize {
        self.unavailable.load(Ordering::Relaxed)
    }
}
