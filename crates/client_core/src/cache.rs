//! Keyed store for paginated server state.
//!
//! One entry per logical list name. An entry keeps every fetched page along
//! with the cursor it was requested with, so a repeated cursor replaces its
//! page instead of growing the list. Invalidation only marks the entry stale;
//! readers decide when to refetch. Listeners learn about changes through
//! [`QueryCache::subscribe`].

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

use shared::domain::Cursor;
use tokio::sync::{broadcast, Mutex};

pub const IMAGES_QUERY_KEY: &str = "images";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn images() -> Self {
        Self::new(IMAGES_QUERY_KEY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Updated(QueryKey),
    Invalidated(QueryKey),
}

/// Pages of one infinite query, in fetch order. `page_params[i]` is the
/// cursor `pages[i]` was requested with (`None` for the first page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfiniteData<P> {
    pub pages: Vec<P>,
    pub page_params: Vec<Option<Cursor>>,
}

impl<P> InfiniteData<P> {
    pub fn first(page: P) -> Self {
        Self {
            pages: vec![page],
            page_params: vec![None],
        }
    }

    pub fn push(&mut self, param: Option<Cursor>, page: P) {
        match self.page_params.iter().position(|p| *p == param) {
            Some(index) => self.pages[index] = page,
            None => {
                self.page_params.push(param);
                self.pages.push(page);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl<P> Default for InfiniteData<P> {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            page_params: Vec::new(),
        }
    }
}

struct CacheEntry<P> {
    data: InfiniteData<P>,
    stale: bool,
}

struct QueryCacheState<P> {
    entries: HashMap<QueryKey, CacheEntry<P>>,
    inflight: HashSet<(QueryKey, Option<Cursor>)>,
}

pub struct QueryCache<P> {
    inner: Mutex<QueryCacheState<P>>,
    events: broadcast::Sender<CacheEvent>,
}

impl<P: Clone + Send + 'static> QueryCache<P> {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            inner: Mutex::new(QueryCacheState {
                entries: HashMap::new(),
                inflight: HashSet::new(),
            }),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub async fn get(&self, key: &QueryKey) -> Option<InfiniteData<P>> {
        let guard = self.inner.lock().await;
        guard.entries.get(key).map(|entry| entry.data.clone())
    }

    /// Missing entries count as stale.
    pub async fn is_stale(&self, key: &QueryKey) -> bool {
        let guard = self.inner.lock().await;
        guard.entries.get(key).map_or(true, |entry| entry.stale)
    }

    /// Marks `key` stale. Returns whether an entry existed.
    pub async fn invalidate(&self, key: &QueryKey) -> bool {
        let existed = {
            let mut guard = self.inner.lock().await;
            match guard.entries.get_mut(key) {
                Some(entry) => {
                    entry.stale = true;
                    true
                }
                None => false,
            }
        };
        tracing::debug!(key = %key, existed, "cache: invalidate");
        let _ = self.events.send(CacheEvent::Invalidated(key.clone()));
        existed
    }

    /// Replaces the whole entry with freshly fetched pages.
    pub async fn replace(&self, key: &QueryKey, data: InfiniteData<P>) {
        {
            let mut guard = self.inner.lock().await;
            guard.entries.insert(
                key.clone(),
                CacheEntry {
                    data,
                    stale: false,
                },
            );
        }
        let _ = self.events.send(CacheEvent::Updated(key.clone()));
    }

    /// Stores one page under `param`, replacing a page previously fetched
    /// with the same cursor. Staleness is left untouched.
    pub async fn store_page(&self, key: &QueryKey, param: Option<Cursor>, page: P) {
        {
            let mut guard = self.inner.lock().await;
            let entry = guard
                .entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry {
                    data: InfiniteData::default(),
                    stale: false,
                });
            entry.data.push(param, page);
        }
        let _ = self.events.send(CacheEvent::Updated(key.clone()));
    }

    /// Claims the (key, cursor) fetch slot. `false` means an identical
    /// request is already outstanding and the caller should not issue another.
    pub async fn try_begin_fetch(&self, key: &QueryKey, param: Option<&Cursor>) -> bool {
        let mut guard = self.inner.lock().await;
        guard.inflight.insert((key.clone(), param.cloned()))
    }

    pub async fn finish_fetch(&self, key: &QueryKey, param: Option<&Cursor>) {
        let mut guard = self.inner.lock().await;
        guard.inflight.remove(&(key.clone(), param.cloned()));
    }
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
