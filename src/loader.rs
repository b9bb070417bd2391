//! Image fetching and decoding.
//!
//! Covers and scannable codes come from third-party hosts, so requests carry
//! no referrer, cookies or credentials.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use image::RgbaImage;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RenderError;

/// Source of decoded bitmaps.
#[allow(async_fn_in_trait)]
pub trait ImageLoader {
    async fn load(&self, url: &str) -> Result<RgbaImage, RenderError>;
}

/// HTTP client settings for image and metadata requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    pub user_agent: String,
    /// Unset means requests may wait indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("coverwall/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
        }
    }
}

/// Build the shared anonymous HTTP client.
pub fn build_client(config: &LoaderConfig) -> reqwest::Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("image/*,application/json;q=0.9,*/*;q=0.8"));

    let mut builder = Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        // reqwest sends no Referer unless asked; keep it that way on redirects too.
        .referer(false)
        .redirect(Policy::limited(5));
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build()
}

/// Loads `http(s)://` URLs over the network, `file://` URLs and bare paths
/// from disk.
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, RenderError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| RenderError::image_load(url, e))?;
            let status = response.status();
            if !status.is_success() {
                return Err(RenderError::image_load(url, format!("HTTP {}", status)));
            }
            let bytes = response.bytes().await.map_err(|e| RenderError::image_load(url, e))?;
            return Ok(bytes.to_vec());
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        if path.is_empty() {
            return Err(RenderError::image_load(url, "empty image location"));
        }
        tokio::fs::read(Path::new(path))
            .await
            .map_err(|e| RenderError::image_load(url, e))
    }
}

impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<RgbaImage, RenderError> {
        let bytes = self.fetch(url).await?;
        let image = decode(url, &bytes)?;
        debug!(url, width = image.width(), height = image.height(), "loaded image");
        Ok(image)
    }
}

fn decode(url: &str, bytes: &[u8]) -> Result<RgbaImage, RenderError> {
    let image = image::load_from_memory(bytes).map_err(|e| RenderError::image_load(url, e))?;
    Ok(image.to_rgba8())
}

/// Remembers successfully loaded bitmaps so the cover fetched for palette
/// extraction is not downloaded again for every render.
pub struct CachingImageLoader<L> {
    inner: L,
    cache: Mutex<HashMap<String, RgbaImage>>,
}

impl<L: ImageLoader> CachingImageLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, url: &str) -> Option<RgbaImage> {
        self.cache.lock().ok()?.get(url).cloned()
    }
}

impl<L: ImageLoader> ImageLoader for CachingImageLoader<L> {
    async fn load(&self, url: &str) -> Result<RgbaImage, RenderError> {
        if let Some(image) = self.cached(url) {
            debug!(url, "image cache hit");
            return Ok(image);
        }
        let image = self.inner.load(url).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(url.to_string(), image.clone());
        }
        Ok(image)
    }
}

/// Serves pre-decoded bitmaps by URL; anything else fails to load.
#[derive(Default, Clone)]
pub struct MemoryImageLoader {
    images: HashMap<String, RgbaImage>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: impl Into<String>, image: RgbaImage) -> Self {
        self.images.insert(url.into(), image);
        self
    }
}

impl ImageLoader for MemoryImageLoader {
    async fn load(&self, url: &str) -> Result<RgbaImage, RenderError> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| RenderError::image_load(url, "not found"))
    }
}
