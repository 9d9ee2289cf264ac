//! Cache abstraction and the cache-first computation helper.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connection(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

/// A shared key/value store with per-entry expiry.
///
/// Implementations must be fail-open on reads: a backend error is logged at
/// the implementation and reported as a miss, never as a request failure.
#[async_trait]
pub trait ReadCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// Look up `key`; on a hit return the stored value unchanged, on a miss run
/// `compute`, store its serialized result under `key` with expiry `ttl`, and
/// return it.
///
/// An unreadable or undecodable entry counts as a miss; a failed store is
/// logged and the freshly computed value is returned anyway. Only `compute`
/// errors propagate.
pub async fn get_or_compute<T, E, F, Fut>(
    cache: &dyn ReadCache,
    key: &str,
    ttl: Duration,
    compute: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(raw) = cache.get(key).await {
        match serde_json::from_str(&raw) {
            Ok(value) => {
                counter!("racconto_cache_hit_total", "key" => key.to_string()).increment(1);
                return Ok(value);
            }
            Err(err) => {
                counter!("racconto_cache_error_total", "key" => key.to_string()).increment(1);
                warn!(key, error = %err, "discarding undecodable cache entry");
            }
        }
    }

    counter!("racconto_cache_miss_total", "key" => key.to_string()).increment(1);
    let value = compute().await?;

    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(err) = cache.set(key, &raw, ttl).await {
                counter!("racconto_cache_error_total", "key" => key.to_string()).increment(1);
                warn!(key, error = %err, "failed to store cache entry");
            }
        }
        Err(err) => {
            warn!(key, error = %err, "failed to serialize cache entry");
        }
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::InMemoryCache;

    /// A backend where every operation fails, for fail-open coverage.
    struct BrokenCache;

    #[async_trait]
    impl ReadCache for BrokenCache {
        async fn get(&self, _key: &str) -> Option<String> {
            None
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Operation("backend unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn computes_at_most_once_within_ttl() {
        let cache = InMemoryCache::new();
        let calls = AtomicUsize::new(0);

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CacheError>(vec![3i64, 1])
        };

        let first = get_or_compute(&cache, "k", Duration::from_secs(60), compute)
            .await
            .expect("first call");
        let second = get_or_compute(&cache, "k", Duration::from_secs(60), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CacheError>(vec![9i64])
        })
        .await
        .expect("second call");

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backend_failure_falls_back_to_computation() {
        let cache = BrokenCache;

        let value = get_or_compute(&cache, "k", Duration::from_secs(60), || async {
            Ok::<_, CacheError>(41i64)
        })
        .await
        .expect("fail-open");

        assert_eq!(value, 41);
    }

    #[tokio::test]
    async fn undecodable_entry_is_treated_as_miss() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "not json", Duration::from_secs(60))
            .await
            .expect("seed");

        let value = get_or_compute(&cache, "k", Duration::from_secs(60), || async {
            Ok::<_, CacheError>(7i64)
        })
        .await
        .expect("recompute");

        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn compute_errors_propagate() {
        let cache = InMemoryCache::new();

        let result = get_or_compute::<i64, _, _, _>(&cache, "k", Duration::from_secs(60), || {
            async { Err(CacheError::Operation("boom".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert!(cache.get("k").await.is_none());
    }
}
