//! Remote signing-key resolution with a bounded in-memory cache.
//!
//! [`KeyResolver`] fetches the provider's JWKS document on demand and caches
//! decoded keys by `kid`. The cache holds at most a handful of entries with a
//! per-entry max age, matching the scale of a rotating signing-key set; when
//! full, the least-recently-inserted entry is evicted. A `kid` absent from the
//! cache triggers exactly one remote fetch before the resolve fails.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::DecodingKey;
use tokio::sync::RwLock;

use crate::error::KeyFetchError;

const DEFAULT_MAX_ENTRIES: usize = 5;
const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 10);
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches and caches the authorization server's public signing keys.
///
/// Shared across all concurrent requests. Concurrent misses for the same
/// `kid` may fetch redundantly; the cache is a performance optimization, not
/// a single-fetch guarantee, but inserts and evictions are atomic with
/// respect to lookups.
pub struct KeyResolver {
    jwks_url: String,
    http: reqwest::Client,
    max_entries: usize,
    max_age: Duration,
    cache: RwLock<KeyCache>,
    fetches: AtomicU64,
}

impl KeyResolver {
    /// Create a resolver for the given JWKS URL with default cache bounds
    /// (5 entries, 10 minute max age).
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            http: reqwest::Client::new(),
            max_entries: DEFAULT_MAX_ENTRIES,
            max_age: DEFAULT_MAX_AGE,
            cache: RwLock::new(KeyCache::default()),
            fetches: AtomicU64::new(0),
        }
    }

    /// Override the cache bounds.
    pub fn with_limits(mut self, max_entries: usize, max_age: Duration) -> Self {
        self.max_entries = max_entries;
        self.max_age = max_age;
        self
    }

    /// Number of remote JWKS fetches performed so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Resolve the public key for `kid`.
    ///
    /// Cache hits that are not past their max age return without network I/O.
    /// On miss or expiry the resolver performs exactly one fetch of the JWKS
    /// document, repopulates the cache, and answers from it.
    ///
    /// # Errors
    ///
    /// Fails when the endpoint is unreachable, returns malformed data, or the
    /// requested `kid` is still absent after a fresh fetch. No retries; the
    /// caller treats failure as terminal for the request.
    pub async fn resolve(&self, kid: &str) -> Result<Arc<DecodingKey>, KeyFetchError> {
        {
            let cache = self.cache.read().await;
            if let Some(key) = cache.get(kid, self.max_age) {
                tracing::debug!(kid = %kid, "signing key cache hit");
                return Ok(key);
            }
        }

        self.refresh(kid).await?;

        let cache = self.cache.read().await;
        cache
            .get(kid, self.max_age)
            .ok_or_else(|| KeyFetchError::UnknownKeyId(kid.to_string()))
    }

    /// Fetch the JWKS document and repopulate the cache.
    async fn refresh(&self, wanted_kid: &str) -> Result<(), KeyFetchError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(url = %self.jwks_url, kid = %wanted_kid, "fetching JWKS");

        let response = self
            .http
            .get(&self.jwks_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(KeyFetchError::Status(response.status().as_u16()));
        }

        let jwks: JwkSet = response.json().await?;

        let mut cache = self.cache.write().await;
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => cache.insert(kid, Arc::new(key), self.max_entries),
                Err(source) if kid == wanted_kid => {
                    return Err(KeyFetchError::BadKey { kid, source });
                }
                Err(source) => {
                    tracing::warn!(kid = %kid, error = %source, "skipping unusable JWKS entry");
                }
            }
        }
        Ok(())
    }
}

/// Bounded key cache with least-recently-inserted eviction.
#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, CachedKey>,
    insertion_order: VecDeque<String>,
}

struct CachedKey {
    key: Arc<DecodingKey>,
    inserted_at: Instant,
}

impl KeyCache {
    fn get(&self, kid: &str, max_age: Duration) -> Option<Arc<DecodingKey>> {
        let entry = self.keys.get(kid)?;
        if entry.inserted_at.elapsed() > max_age {
            return None;
        }
        Some(Arc::clone(&entry.key))
    }

    fn insert(&mut self, kid: String, key: Arc<DecodingKey>, max_entries: usize) {
        if self
            .keys
            .insert(
                kid.clone(),
                CachedKey {
                    key,
                    inserted_at: Instant::now(),
                },
            )
            .is_none()
        {
            self.insertion_order.push_back(kid);
        }

        while self.keys.len() > max_entries {
            match self.insertion_order.pop_front() {
                Some(oldest) => {
                    self.keys.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_key() -> Arc<DecodingKey> {
        Arc::new(DecodingKey::from_secret(b"test"))
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let mut cache = KeyCache::default();
        cache.insert("a".to_string(), dummy_key(), 5);

        assert!(cache.get("a", Duration::from_secs(600)).is_some());
        assert!(cache.get("b", Duration::from_secs(600)).is_none());
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let mut cache = KeyCache::default();
        cache.insert("a".to_string(), dummy_key(), 5);

        assert!(cache.get("a", Duration::ZERO).is_none());
    }

    #[test]
    fn test_evicts_least_recently_inserted() {
        let mut cache = KeyCache::default();
        for kid in ["k1", "k2", "k3"] {
            cache.insert(kid.to_string(), dummy_key(), 2);
        }

        assert!(cache.get("k1", Duration::from_secs(600)).is_none());
        assert!(cache.get("k2", Duration::from_secs(600)).is_some());
        assert!(cache.get("k3", Duration::from_secs(600)).is_some());
    }

    #[test]
    fn test_reinsert_does_not_duplicate_order_entry() {
        let mut cache = KeyCache::default();
        cache.insert("a".to_string(), dummy_key(), 2);
        cache.insert("a".to_string(), dummy_key(), 2);
        cache.insert("b".to_string(), dummy_key(), 2);
        cache.insert("c".to_string(), dummy_key(), 2);

        // "a" was the oldest insertion and must be the one evicted.
        assert!(cache.get("a", Duration::from_secs(600)).is_none());
        assert!(cache.get("b", Duration::from_secs(600)).is_some());
        assert!(cache.get("c", Duration::from_secs(600)).is_some());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_fails() {
        let resolver = KeyResolver::new("http://127.0.0.1:1/.well-known/jwks.json");
        let result = resolver.resolve("any-kid").await;
        assert!(matches!(result, Err(KeyFetchError::Request(_))));
        assert_eq!(resolver.fetch_count(), 1);
    }
}
