//! Cursor-paginated image list.
//!
//! [`GalleryState`] is the observer-side state machine (loading, error,
//! ready, fetching the next page) and holds no I/O, so the GUI thread can own
//! it. [`GalleryQuery`] performs the fetches through the shared
//! [`QueryCache`].

use std::sync::Arc;

use shared::{
    domain::Cursor,
    error::Failure,
    protocol::{ImageRecord, ImagesPage},
};
use tracing::{debug, info, warn};

use crate::{
    cache::{InfiniteData, QueryCache, QueryKey},
    GalleryApi,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GalleryStatus {
    Loading,
    Error(Failure),
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMore {
    pub busy: bool,
}

/// What the page should draw. Loading and error views are exclusive.
#[derive(Debug, PartialEq, Eq)]
pub enum GalleryView<'a> {
    Loading,
    Error(&'a Failure),
    Ready {
        cards: Vec<&'a ImageRecord>,
        load_more: Option<LoadMore>,
    },
}

#[derive(Debug, Clone)]
pub struct GalleryState {
    status: GalleryStatus,
    data: InfiniteData<ImagesPage>,
    /// Cursor of the outstanding next-page request. Survives a refetch so the
    /// late result is still accounted for.
    pending_next: Option<Cursor>,
}

impl Default for GalleryState {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryState {
    pub fn new() -> Self {
        Self {
            status: GalleryStatus::Loading,
            data: InfiniteData::default(),
            pending_next: None,
        }
    }

    pub fn status(&self) -> &GalleryStatus {
        &self.status
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.pending_next.is_some()
    }

    /// Result of the first-page query (or of a refetch after invalidation).
    /// An outstanding next-page request stays outstanding; its result is
    /// dropped later if the refetched chain no longer ends at its cursor.
    pub fn apply_initial(&mut self, result: Result<InfiniteData<ImagesPage>, Failure>) {
        match result {
            Ok(data) => {
                self.data = data;
                self.status = GalleryStatus::Ready;
            }
            Err(failure) => {
                self.data = InfiniteData::default();
                self.status = GalleryStatus::Error(failure);
            }
        }
    }

    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.data.pages.last().and_then(|page| page.after.as_ref())
    }

    pub fn has_next_page(&self) -> bool {
        self.status == GalleryStatus::Ready && self.next_cursor().is_some()
    }

    /// Enters the fetching-next-page sub-state and hands out the cursor to
    /// request. `None` when not ready, already fetching, or on the last page.
    pub fn begin_next_page(&mut self) -> Option<Cursor> {
        if self.status != GalleryStatus::Ready || self.pending_next.is_some() {
            return None;
        }
        let cursor = self.next_cursor()?.clone();
        self.pending_next = Some(cursor.clone());
        Some(cursor)
    }

    /// Failures of follow-up pages are not surfaced: the control just becomes
    /// available again. A page is appended only while the list still ends at
    /// the cursor it was requested with.
    pub fn apply_next_page(&mut self, cursor: Cursor, result: Result<ImagesPage, Failure>) {
        if self.pending_next.as_ref() != Some(&cursor) {
            debug!(%cursor, "gallery: ignoring next page that was not requested");
            return;
        }
        self.pending_next = None;
        if self.status != GalleryStatus::Ready {
            return;
        }
        if self.next_cursor() != Some(&cursor) {
            debug!(%cursor, "gallery: dropping next page from before a refetch");
            return;
        }
        match result {
            Ok(page) => self.data.push(Some(cursor), page),
            Err(failure) => warn!(%cursor, "gallery: next page failed: {failure}"),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.data.pages.iter().flat_map(|page| page.data.iter())
    }

    pub fn view(&self) -> GalleryView<'_> {
        match &self.status {
            GalleryStatus::Loading => GalleryView::Loading,
            GalleryStatus::Error(failure) => GalleryView::Error(failure),
            GalleryStatus::Ready => GalleryView::Ready {
                cards: self.records().collect(),
                load_more: self.next_cursor().map(|_| LoadMore {
                    busy: self.pending_next.is_some(),
                }),
            },
        }
    }
}

pub struct GalleryQuery {
    api: Arc<dyn GalleryApi>,
    cache: Arc<QueryCache<ImagesPage>>,
    key: QueryKey,
}

impl GalleryQuery {
    pub fn new(api: Arc<dyn GalleryApi>, cache: Arc<QueryCache<ImagesPage>>) -> Self {
        Self {
            api,
            cache,
            key: QueryKey::images(),
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Serves fresh cached pages as-is. A stale entry is refetched page by
    /// page with the cursors the server hands back, up to as many pages as
    /// were loaded before.
    pub async fn fetch_initial(&self) -> Result<InfiniteData<ImagesPage>, Failure> {
        let cached = self.cache.get(&self.key).await;
        if let Some(data) = &cached {
            if !self.cache.is_stale(&self.key).await {
                debug!(key = %self.key, pages = data.len(), "gallery: serving cached pages");
                return Ok(data.clone());
            }
        }

        if !self.cache.try_begin_fetch(&self.key, None).await {
            return cached.ok_or_else(|| Failure::fetch("first page is already being fetched"));
        }
        let page_budget = cached.as_ref().map_or(1, |data| data.len().max(1));
        let result = self.refetch_pages(page_budget).await;
        self.cache.finish_fetch(&self.key, None).await;

        let data = result.map_err(|err| Failure::fetch(format!("{err:#}")))?;
        info!(key = %self.key, pages = data.len(), "gallery: pages loaded");
        self.cache.replace(&self.key, data.clone()).await;
        Ok(data)
    }

    async fn refetch_pages(&self, page_budget: usize) -> anyhow::Result<InfiniteData<ImagesPage>> {
        let mut data = InfiniteData::default();
        let mut param: Option<Cursor> = None;
        for _ in 0..page_budget {
            let page = self.api.list_images(param.as_ref()).await?;
            let next = page.after.clone();
            data.push(param, page);
            match next {
                Some(cursor) => param = Some(cursor),
                None => break,
            }
        }
        Ok(data)
    }

    pub async fn fetch_next_page(&self, cursor: &Cursor) -> Result<ImagesPage, Failure> {
        if !self.cache.try_begin_fetch(&self.key, Some(cursor)).await {
            return Err(Failure::fetch(format!(
                "page after {cursor} is already being fetched"
            )));
        }
        debug!(key = %self.key, %cursor, "gallery: fetch next page");
        let result = self.api.list_images(Some(cursor)).await;
        self.cache.finish_fetch(&self.key, Some(cursor)).await;

        let page = result.map_err(|err| Failure::fetch(format!("{err:#}")))?;
        self.cache
            .store_page(&self.key, Some(cursor.clone()), page.clone())
            .await;
        Ok(page)
    }

    pub async fn load(&self, state: &mut GalleryState) {
        state.apply_initial(self.fetch_initial().await);
    }

    /// Returns whether a request was issued.
    pub async fn load_more(&self, state: &mut GalleryState) -> bool {
        let Some(cursor) = state.begin_next_page() else {
            return false;
        };
        let result = self.fetch_next_page(&cursor).await;
        state.apply_next_page(cursor, result);
        true
    }
}

#[cfg(test)]
#[path = "tests/gallery_tests.rs"]
mod tests;
