use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Cursor,
    protocol::{ImageHostResponse, ImagesPage, ImagesQuery, NewImage},
};
use tracing::{info, warn};

pub mod cache;
pub mod config;
pub mod gallery;
pub mod toast;
pub mod upload_form;
pub mod validation;

pub use cache::{CacheEvent, InfiniteData, QueryCache, QueryKey, IMAGES_QUERY_KEY};
pub use config::{load_settings, Settings};
pub use gallery::{GalleryQuery, GalleryState, GalleryStatus, GalleryView, LoadMore};
pub use toast::{Toast, ToastStatus};
pub use upload_form::{SubmissionReport, SubmitBlocked, SubmitOutcome, UploadForm, UploadTicket};
pub use validation::{FieldErrors, ImageFile};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// REST surface of the gallery backend.
#[async_trait]
pub trait GalleryApi: Send + Sync {
    async fn list_images(&self, after: Option<&Cursor>) -> Result<ImagesPage>;
    async fn create_image(&self, image: &NewImage) -> Result<()>;
}

/// External file host that turns raw image bytes into a public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload_image(&self, upload: ImageUpload) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub struct MissingImageHost;

#[async_trait]
impl ImageHost for MissingImageHost {
    async fn upload_image(&self, upload: ImageUpload) -> Result<String> {
        Err(anyhow!(
            "no image host configured for '{}'",
            upload.filename
        ))
    }
}

fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build http client")
}

pub struct HttpGalleryClient {
    http: Client,
    base_url: String,
}

impl HttpGalleryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: build_http_client(settings.request_timeout())?,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw bytes behind an image record's public URL, for thumbnails.
    pub async fn download_image(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl GalleryApi for HttpGalleryClient {
    async fn list_images(&self, after: Option<&Cursor>) -> Result<ImagesPage> {
        let page: ImagesPage = self
            .http
            .get(format!("{}/api/images", self.base_url))
            .query(&ImagesQuery {
                after: after.cloned(),
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("invalid images page payload")?;
        Ok(page)
    }

    async fn create_image(&self, image: &NewImage) -> Result<()> {
        self.http
            .post(format!("{}/api/images", self.base_url))
            .json(image)
            .send()
            .await?
            .error_for_status()?;
        info!(title = %image.title, "api: image created");
        Ok(())
    }
}

pub struct HttpImageHost {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpImageHost {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            api_key,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            http: build_http_client(settings.request_timeout())?,
            endpoint: settings.image_host_url.clone(),
            api_key: settings.image_host_key.clone(),
        })
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    async fn upload_image(&self, upload: ImageUpload) -> Result<String> {
        let mut query = vec![
            ("filename", upload.filename.clone()),
            (
                "mime_type",
                upload
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            ),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.clone()));
        }

        let size_bytes = upload.bytes.len();
        let response: ImageHostResponse = self
            .http
            .post(&self.endpoint)
            .query(&query)
            .body(upload.bytes)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("invalid image host response payload")?;

        let url = response.into_url();
        if url.trim().is_empty() {
            warn!(filename = %upload.filename, "image host returned an empty url");
            return Err(anyhow!("image host returned an empty url"));
        }
        info!(filename = %upload.filename, size_bytes, "image host: upload complete");
        Ok(url)
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
