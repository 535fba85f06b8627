use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Cursor, ImageId},
    protocol::{ImageRecord, ImagesPage, NewImage},
};
use tokio::sync::Mutex;

use crate::{GalleryApi, ImageHost, ImageUpload};

pub fn record(id: &str) -> ImageRecord {
    ImageRecord {
        id: ImageId::new(id),
        title: format!("title {id}"),
        description: format!("desc {id}"),
        url: format!("https://cdn.test/{id}.png"),
        ts: 1_700_000_000_000,
    }
}

pub fn page(ids: &[&str], after: Option<&str>) -> ImagesPage {
    ImagesPage {
        data: ids.iter().map(|id| record(id)).collect(),
        after: after.map(Cursor::new),
    }
}

/// Serves scripted pages keyed by cursor (`""` for the first page).
#[derive(Default)]
pub struct FakeGalleryApi {
    pub pages: Mutex<HashMap<String, ImagesPage>>,
    pub failing_cursors: Mutex<Vec<String>>,
    pub fail_create: bool,
    pub created: Mutex<Vec<NewImage>>,
    pub list_calls: AtomicUsize,
    pub requested_cursors: Mutex<Vec<Option<String>>>,
}

impl FakeGalleryApi {
    pub fn with_pages(pages: Vec<(Option<&str>, ImagesPage)>) -> Arc<Self> {
        let api = Self::default();
        {
            let mut guard = api.pages.try_lock().expect("fresh mutex");
            for (cursor, page) in pages {
                guard.insert(cursor.unwrap_or_default().to_string(), page);
            }
        }
        Arc::new(api)
    }

    pub fn failing_create() -> Arc<Self> {
        Arc::new(Self {
            fail_create: true,
            ..Self::default()
        })
    }

    pub async fn fail_cursor(&self, cursor: Option<&str>) {
        self.failing_cursors
            .lock()
            .await
            .push(cursor.unwrap_or_default().to_string());
    }

    pub async fn set_page(&self, cursor: Option<&str>, page: ImagesPage) {
        self.pages
            .lock()
            .await
            .insert(cursor.unwrap_or_default().to_string(), page);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GalleryApi for FakeGalleryApi {
    async fn list_images(&self, after: Option<&Cursor>) -> Result<ImagesPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_cursors
            .lock()
            .await
            .push(after.map(|c| c.as_str().to_string()));
        let key = after.map(|c| c.as_str().to_string()).unwrap_or_default();
        if self.failing_cursors.lock().await.contains(&key) {
            return Err(anyhow!("500 Internal Server Error for cursor '{key}'"));
        }
        self.pages
            .lock()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found for cursor '{key}'"))
    }

    async fn create_image(&self, image: &NewImage) -> Result<()> {
        if self.fail_create {
            return Err(anyhow!("500 Internal Server Error"));
        }
        self.created.lock().await.push(image.clone());
        Ok(())
    }
}

pub struct FakeImageHost {
    pub url: Option<String>,
    pub uploads: Mutex<Vec<ImageUpload>>,
}

impl FakeImageHost {
    pub fn returning(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            url: None,
            uploads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload_image(&self, upload: ImageUpload) -> Result<String> {
        self.uploads.lock().await.push(upload);
        self.url
            .clone()
            .ok_or_else(|| anyhow!("image host unavailable"))
    }
}
