//! URL-keyed response cache.
//!
//! Readers of the same key share one in-flight fetch. A cached value is served
//! until the key is invalidated; the next read then refetches.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::BlogClientError;

type Slot = Arc<OnceCell<Value>>;

#[derive(Default)]
pub struct FetchCache {
    entries: Mutex<HashMap<String, Slot>>,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, key: &str) -> Slot {
        self.entries()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Returns the cached value for `key`, running `fetch` only if nothing is
    /// cached and no other caller is already fetching it. A failed fetch
    /// leaves the key empty.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<Value, BlogClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, BlogClientError>>,
    {
        let slot = self.slot(key);
        let value = slot
            .get_or_try_init(|| {
                debug!(key, "cache miss");
                fetch()
            })
            .await?;
        Ok(value.clone())
    }

    /// Fetches `key` unconditionally and replaces whatever was cached.
    pub async fn revalidate<F, Fut>(&self, key: &str, fetch: F) -> Result<Value, BlogClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, BlogClientError>>,
    {
        let value = fetch().await?;
        self.entries()
            .insert(key.to_string(), Arc::new(OnceCell::from(value.clone())));
        Ok(value)
    }

    pub fn invalidate(&self, key: &str) {
        if self.entries().remove(key).is_some() {
            debug!(key, "cache entry invalidated");
        }
    }

    pub fn invalidate_prefix(&self, prefix: &str) {
        self.entries().retain(|key, _| !key.starts_with(prefix));
    }

    /// Whether a value for `key` is cached (an in-flight fetch doesn't count).
    pub fn contains(&self, key: &str) -> bool {
        self.entries()
            .get(key)
            .is_some_and(|slot| slot.initialized())
    }

    pub fn clear(&self) {
        self.entries().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn counted(calls: &AtomicUsize, value: Value) -> Result<Value, BlogClientError> {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(value)
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = FetchCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_fetch("/api/posts", || counted(&calls, json!([1])))
            .await
            .unwrap();
        let second = cache
            .get_or_fetch("/api/posts", || counted(&calls, json!([2])))
            .await
            .unwrap();

        assert_eq!(first, json!([1]));
        assert_eq!(second, json!([1]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_fetch() {
        let cache = FetchCache::new();
        let calls = AtomicUsize::new(0);

        let (a, b) = tokio::join!(
            cache.get_or_fetch("/api/posts", || counted(&calls, json!("a"))),
            cache.get_or_fetch("/api/posts", || counted(&calls, json!("b"))),
        );

        assert_eq!(a.unwrap(), json!("a"));
        assert_eq!(b.unwrap(), json!("a"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = FetchCache::new();
        let calls = AtomicUsize::new(0);

        cache
            .get_or_fetch("/api/admin/posts", || counted(&calls, json!(1)))
            .await
            .unwrap();
        cache.invalidate("/api/admin/posts");
        assert!(!cache.contains("/api/admin/posts"));

        let value = cache
            .get_or_fetch("/api/admin/posts", || counted(&calls, json!(2)))
            .await
            .unwrap();
        assert_eq!(value, json!(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_is_not_cached() {
        let cache = FetchCache::new();
        let err = cache
            .get_or_fetch("/api/posts/1", || async { Err(BlogClientError::NotFound) })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!cache.contains("/api/posts/1"));
    }

    #[tokio::test]
    async fn prefix_invalidation_and_revalidate() {
        let cache = FetchCache::new();
        for key in ["/api/admin/posts", "/api/admin/posts/1", "/api/posts"] {
            cache
                .get_or_fetch(key, || async { Ok(json!(0)) })
                .await
                .unwrap();
        }

        cache.invalidate_prefix("/api/admin/posts");
        assert!(!cache.contains("/api/admin/posts"));
        assert!(!cache.contains("/api/admin/posts/1"));
        assert!(cache.contains("/api/posts"));

        let fresh = cache
            .revalidate("/api/posts", || async { Ok(json!(5)) })
            .await
            .unwrap();
        assert_eq!(fresh, json!(5));
        let cached = cache
            .get_or_fetch("/api/posts", || async { Ok(json!(6)) })
            .await
            .unwrap();
        assert_eq!(cached, json!(5));
    }
}
