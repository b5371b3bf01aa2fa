//! Show id cache
//!
//! Holds the show catalog and per-search results for a fixed time so that
//! repeated lookups skip the network. Share one cache between providers by
//! wrapping it in an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// How long show ids stay valid (three weeks)
pub const SHOW_EXPIRATION_TIME: Duration = Duration::from_secs(21 * 24 * 60 * 60);

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

impl<T: Clone> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn fresh(&self, ttl: Duration) -> Option<T> {
        (self.stored_at.elapsed() < ttl).then(|| self.value.clone())
    }
}

type SearchKey = (String, Option<i32>);

/// Expiring cache of Addic7ed show ids
pub struct ShowIdCache {
    ttl: Duration,
    catalog: Mutex<Option<Entry<Arc<HashMap<String, u32>>>>>,
    searches: Mutex<HashMap<SearchKey, Entry<Option<u32>>>>,
}

impl ShowIdCache {
    /// Create a cache whose entries expire after `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            catalog: Mutex::new(None),
            searches: Mutex::new(HashMap::new()),
        }
    }

    /// Time to live of every entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached show catalog, if present and not expired
    pub async fn catalog(&self) -> Option<Arc<HashMap<String, u32>>> {
        self.catalog.lock().await.as_ref().and_then(|e| e.fresh(self.ttl))
    }

    /// Store a freshly fetched show catalog
    pub async fn store_catalog(&self, show_ids: HashMap<String, u32>) -> Arc<HashMap<String, u32>> {
        let show_ids = Arc::new(show_ids);
        *self.catalog.lock().await = Some(Entry::new(Arc::clone(&show_ids)));
        show_ids
    }

    /// Cached search result for `(series, year)`
    ///
    /// The outer `Option` is the cache hit; the inner one is the search
    /// result, which may itself be "not found".
    pub async fn search(&self, series: &str, year: Option<i32>) -> Option<Option<u32>> {
        let searches = self.searches.lock().await;
        searches
            .get(&(series.to_string(), year))
            .and_then(|e| e.fresh(self.ttl))
    }

    /// Store a search result for `(series, year)`
    pub async fn store_search(&self, series: &str, year: Option<i32>, show_id: Option<u32>) {
        self.searches
            .lock()
            .await
            .insert((series.to_string(), year), Entry::new(show_id));
    }

    /// Drop every entry
    pub async fn clear(&self) {
        *self.catalog.lock().await = None;
        self.searches.lock().await.clear();
    }
}

impl Default for ShowIdCache {
    fn default() -> Self {
        Self::new(SHOW_EXPIRATION_TIME)
    }
}
