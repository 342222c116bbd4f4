use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::debug;

use crate::document::WordDocument;

/// An open document. Holding the lock serialises edits to it.
pub type SharedDocument = Arc<Mutex<WordDocument>>;

/// Configuration for the open-document cache.
#[derive(Debug, Clone)]
pub struct DocumentCacheConfig {
    pub ttl: Option<Duration>,
    pub sweep_interval: Duration,
    pub max_entries: Option<usize>,
}

impl Default for DocumentCacheConfig {
    fn default() -> Self {
        Self {
            ttl: None,
            sweep_interval: Duration::from_secs(60),
            max_entries: None,
        }
    }
}

impl DocumentCacheConfig {
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub const fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    CapacityReached { max: usize },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityReached { max } => {
                write!(f, "open document limit reached (max {max})")
            }
        }
    }
}

impl Error for CacheError {}

/// Cache of parsed documents keyed by document id.
#[derive(Clone)]
pub struct DocumentCache {
    inner: Arc<DocumentCacheInner>,
}

struct DocumentCacheInner {
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    config: DocumentCacheConfig,
}

struct CacheEntry {
    document: OnceCell<SharedDocument>,
    last_used_ms: AtomicU64,
}

impl CacheEntry {
    fn new() -> Self {
        Self {
            document: OnceCell::new(),
            last_used_ms: AtomicU64::new(now_ms()),
        }
    }

    fn touch(&self) {
        self.last_used_ms.store(now_ms(), Ordering::Relaxed);
    }

    /// Loading, or locked by a reader or editor.
    fn is_busy(&self) -> bool {
        self.document
            .get()
            .is_none_or(|document| document.try_lock().is_err())
    }

    fn idle_for(&self, now_ms: u64) -> Duration {
        let last = self.last_used_ms.load(Ordering::Relaxed);
        Duration::from_millis(now_ms.saturating_sub(last))
    }
}

impl DocumentCache {
    #[must_use]
    pub fn new(config: DocumentCacheConfig) -> Self {
        Self {
            inner: Arc::new(DocumentCacheInner {
                entries: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Returns the open document, loading it once when absent. Concurrent
    /// callers for the same id share a single load. A failed load leaves
    /// nothing cached.
    ///
    /// # Errors
    /// Returns the loader's error, or `CacheError::CapacityReached` (converted
    /// into `E`) when the cache is full.
    pub async fn get_or_load<F, Fut, E>(&self, document_id: &str, load: F) -> Result<SharedDocument, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WordDocument, E>>,
        E: From<CacheError>,
    {
        let entry = self.entry(document_id).await?;
        entry.touch();
        let result = entry
            .document
            .get_or_try_init(|| async move { load().await.map(|doc| Arc::new(Mutex::new(doc))) })
            .await
            .cloned();
        if result.is_err() {
            let mut map = self.inner.entries.write().await;
            if map
                .get(document_id)
                .is_some_and(|current| Arc::ptr_eq(current, &entry) && !current.document.initialized())
            {
                map.remove(document_id);
            }
        }
        result
    }

    async fn entry(&self, document_id: &str) -> Result<Arc<CacheEntry>, CacheError> {
        let entry = {
            let map = self.inner.entries.read().await;
            map.get(document_id).cloned()
        };
        if let Some(entry) = entry {
            return Ok(entry);
        }
        let mut map = self.inner.entries.write().await;
        if let Some(entry) = map.get(document_id).cloned() {
            return Ok(entry);
        }
        if let Some(max_entries) = self.inner.config.max_entries
            && map.len() >= max_entries
        {
            return Err(CacheError::CapacityReached { max: max_entries });
        }
        let entry = Arc::new(CacheEntry::new());
        map.insert(document_id.to_string(), entry.clone());
        Ok(entry)
    }

    /// Returns the document only when it is already open.
    pub async fn get(&self, document_id: &str) -> Option<SharedDocument> {
        let map = self.inner.entries.read().await;
        let entry = map.get(document_id)?;
        entry.touch();
        entry.document.get().cloned()
    }

    /// Drops an idle document from the cache. A document that is loading or
    /// locked by an operation stays. Returns whether it was dropped.
    pub async fn evict(&self, document_id: &str) -> bool {
        let mut map = self.inner.entries.write().await;
        if map.get(document_id).is_none_or(|entry| entry.is_busy()) {
            return false;
        }
        map.remove(document_id);
        debug!(document_id, "document evicted from cache");
        true
    }

    /// Drops a document whether or not it is in use. Operations already
    /// holding it notice through [`DocumentCache::is_current`].
    pub async fn remove(&self, document_id: &str) -> bool {
        let removed = self.inner.entries.write().await.remove(document_id).is_some();
        if removed {
            debug!(document_id, "document removed from cache");
        }
        removed
    }

    /// Whether `document` is still the cached copy for `document_id`.
    pub async fn is_current(&self, document_id: &str, document: &SharedDocument) -> bool {
        let map = self.inner.entries.read().await;
        map.get(document_id)
            .and_then(|entry| entry.document.get())
            .is_some_and(|cached| Arc::ptr_eq(cached, document))
    }

    pub async fn document_ids(&self) -> Vec<String> {
        let map = self.inner.entries.read().await;
        let mut ids: Vec<String> = map.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Drops documents idle for longer than the TTL. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let Some(ttl) = self.inner.config.ttl else {
            return 0;
        };
        let now = now_ms();
        let mut map = self.inner.entries.write().await;
        let before = map.len();
        map.retain(|_, entry| entry.is_busy() || entry.idle_for(now) <= ttl);
        let evicted = before.saturating_sub(map.len());
        if evicted > 0 {
            debug!(evicted, "evicted idle documents");
        }
        evicted
    }

    /// Starts the periodic idle sweep. Returns `None` without a TTL.
    #[must_use]
    pub fn spawn_sweeper(self) -> Option<tokio::task::JoinHandle<()>> {
        let _ttl = self.inner.config.ttl?;
        let interval = self.inner.config.sweep_interval;
        let cache = self;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let _ = cache.evict_idle().await;
            }
        }))
    }
}

fn now_ms() -> u64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(elapsed).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        Cache(CacheError),
        Load,
    }

    impl From<CacheError> for TestError {
        fn from(err: CacheError) -> Self {
            Self::Cache(err)
        }
    }

    async fn load_counted(calls: Arc<AtomicUsize>) -> Result<WordDocument, TestError> {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        Ok(WordDocument::new())
    }

    #[tokio::test]
    async fn loads_once_for_concurrent_callers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DocumentCache::new(DocumentCacheConfig::default());
        let (left, right) = tokio::join!(
            cache.get_or_load("alpha", || load_counted(calls.clone())),
            cache.get_or_load("alpha", || load_counted(calls.clone())),
        );
        assert!(Arc::ptr_eq(&left.unwrap(), &right.unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.get("alpha").await.is_some());
    }

    #[tokio::test]
    async fn failed_loads_are_not_cached() {
        let cache = DocumentCache::new(DocumentCacheConfig::default());
        let failed = cache
            .get_or_load("alpha", || async { Err::<WordDocument, _>(TestError::Load) })
            .await;
        assert_eq!(failed.err(), Some(TestError::Load));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn enforces_capacity() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DocumentCache::new(DocumentCacheConfig::default().with_max_entries(1));
        cache
            .get_or_load("alpha", || load_counted(calls.clone()))
            .await
            .unwrap();
        let full = cache.get_or_load("beta", || load_counted(calls.clone())).await;
        assert_eq!(
            full.err(),
            Some(TestError::Cache(CacheError::CapacityReached { max: 1 }))
        );
        assert!(cache.evict("alpha").await);
        assert!(cache.get_or_load("beta", || load_counted(calls.clone())).await.is_ok());
    }

    #[tokio::test]
    async fn locked_documents_are_not_evicted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DocumentCache::new(DocumentCacheConfig::default().with_ttl(Duration::from_millis(1)));
        let shared = cache
            .get_or_load("alpha", || load_counted(calls.clone()))
            .await
            .unwrap();
        let guard = shared.lock().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!cache.evict("alpha").await);
        assert_eq!(cache.evict_idle().await, 0);
        assert!(cache.is_current("alpha", &shared).await);
        drop(guard);

        assert!(cache.evict("alpha").await);
        assert!(!cache.is_current("alpha", &shared).await);
        let reloaded = cache
            .get_or_load("alpha", || load_counted(calls.clone()))
            .await
            .unwrap();
        assert!(!Arc::ptr_eq(&shared, &reloaded));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn remove_drops_documents_in_use() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DocumentCache::new(DocumentCacheConfig::default());
        let shared = cache
            .get_or_load("alpha", || load_counted(calls.clone()))
            .await
            .unwrap();
        let _guard = shared.lock().await;
        assert!(cache.remove("alpha").await);
        assert!(!cache.is_current("alpha", &shared).await);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn evicts_idle_entries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = DocumentCache::new(
            DocumentCacheConfig::default()
                .with_ttl(Duration::from_millis(1))
                .with_sweep_interval(Duration::from_millis(1)),
        );
        cache
            .get_or_load("alpha", || load_counted(calls.clone()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.evict_idle().await, 1);
        assert_eq!(cache.len().await, 0);
    }
}
