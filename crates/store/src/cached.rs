//! Read-through cache in front of any `DocumentStore`.
//!
//! Successful lookups are kept for a fixed time-to-live, keyed by
//! repository and code flag. Failures are never cached, so a repository
//! that appears later is picked up on the next call.

use async_trait::async_trait;
use onboardctx_core::document::DocumentSet;
use onboardctx_core::error::StoreError;
use onboardctx_core::store::DocumentStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

type CacheKey = (String, bool);

struct CacheEntry {
    set: DocumentSet,
    stored_at: Instant,
}

/// A store wrapper that remembers document sets for `ttl`.
pub struct CachedStore<S> {
    inner: S,
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<S: DocumentStore> CachedStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Drop every cached set.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached sets. Expired sets linger until the next insert.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// `(hits, misses)` since construction.
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    async fn lookup(&self, key: &CacheKey) -> Option<DocumentSet> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.set.clone())
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for CachedStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list_documents(
        &self,
        repo_name: &str,
        include_code: bool,
    ) -> Result<DocumentSet, StoreError> {
        let key = (repo_name.to_string(), include_code);
        if let Some(set) = self.lookup(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(repo = %repo_name, include_code, "Cache hit");
            return Ok(set);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let set = self.inner.list_documents(repo_name, include_code).await?;
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| now.duration_since(entry.stored_at) < self.ttl);
        entries.insert(
            key,
            CacheEntry {
                set: set.clone(),
                stored_at: now,
            },
        );
        drop(entries);
        debug!(repo = %repo_name, include_code, documents = set.len(), "Cached document set");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onboardctx_core::document::Document;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    /// Counts calls; knows only the repository "demo".
    #[derive(Default)]
    struct CountingStore {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        fn name(&self) -> &str {
            "counting"
        }

        async fn list_documents(
            &self,
            repo_name: &str,
            _include_code: bool,
        ) -> Result<DocumentSet, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if repo_name != "demo" {
                return Err(StoreError::not_found(repo_name));
            }
            DocumentSet::new("demo", vec![Document::new("overview", "Overview", "a b c")])
        }
    }

    fn cached(ttl: Duration) -> (CachedStore<CountingStore>, Arc<AtomicUsize>) {
        let store = CountingStore::default();
        let calls = store.calls.clone();
        (CachedStore::new(store, ttl), calls)
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let (store, calls) = cached(Duration::from_secs(60));
        store.list_documents("demo", true).await.unwrap();
        store.list_documents("demo", true).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.stats(), (1, 1));
        assert_eq!(store.name(), "counting");
    }

    #[tokio::test]
    async fn code_flag_is_part_of_the_key() {
        let (store, calls) = cached(Duration::from_secs(60));
        store.list_documents("demo", true).await.unwrap();
        store.list_documents("demo", false).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let (store, calls) = cached(Duration::from_secs(60));
        assert!(store.list_documents("missing", true).await.is_err());
        assert!(store.list_documents("missing", true).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let (store, calls) = cached(Duration::from_secs(5));
        store.list_documents("demo", true).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        store.list_documents("demo", true).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_pruned_on_insert() {
        let (store, _calls) = cached(Duration::from_secs(5));
        store.list_documents("demo", true).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        store.list_documents("demo", false).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(store.lookup(&("demo".to_string(), false)).await.is_some());
    }

    #[tokio::test]
    async fn clear_forgets_everything() {
        let (store, calls) = cached(Duration::from_secs(60));
        store.list_documents("demo", true).await.unwrap();
        store.clear().await;
        store.list_documents("demo", true).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
