//! In-memory cache for the client-credentials access token.
//!
//! The cache is an explicit object with an injected [`Clock`], so expiry can
//! be tested without sleeping. It holds a single entry: the token for the
//! configured store.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use secrecy::SecretString;
use tokio::sync::RwLock;

/// A cached token is only served while more than this much lifetime remains.
pub const MIN_REMAINING_MS: i64 = 60_000;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TTL_MS: i64 = 20 * 60 * 1000;

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Create a clock frozen at `now_ms`.
    #[must_use]
    pub const fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let delta = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        self.now_ms.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// A token together with its absolute expiry.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CachedToken {
    pub token: SecretString,
    pub expires_at_ms: i64,
}

impl CachedToken {
    /// Whether more than [`MIN_REMAINING_MS`] remain at `now_ms`.
    #[must_use]
    pub const fn is_fresh(&self, now_ms: i64) -> bool {
        self.expires_at_ms.saturating_sub(now_ms) > MIN_REMAINING_MS
    }
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("token", &"[REDACTED]")
            .field("expires_at_ms", &self.expires_at_ms)
            .finish()
    }
}

/// Single-entry token cache.
///
/// Concurrent refreshes are not coordinated: each writer overwrites the entry
/// and the last write wins.
#[derive(Debug)]
pub struct TokenCache {
    entry: RwLock<Option<CachedToken>>,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    /// Create an empty cache reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: RwLock::new(None),
            clock,
        }
    }

    /// Current time according to the cache's clock.
    #[must_use]
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// The cached token, if it is still fresh.
    pub async fn get(&self) -> Option<SecretString> {
        let now = self.now_ms();
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|cached| cached.is_fresh(now))
            .map(|cached| cached.token.clone())
    }

    /// Store `token` for `ttl_ms` from now, replacing any previous entry.
    pub async fn set(&self, token: SecretString, ttl_ms: i64) -> CachedToken {
        let cached = CachedToken {
            token,
            expires_at_ms: self.now_ms().saturating_add(ttl_ms),
        };
        *self.entry.write().await = Some(cached.clone());
        cached
    }

    /// Snapshot of the raw entry, fresh or not.
    pub async fn peek(&self) -> Option<CachedToken> {
        self.entry.read().await.clone()
    }

    /// Drop the cached entry.
    pub async fn clear(&self) {
        *self.entry.write().await = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn cache_at(now_ms: i64) -> (Arc<ManualClock>, TokenCache) {
        let clock = Arc::new(ManualClock::new(now_ms));
        let cache = TokenCache::new(clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn test_empty_cache_misses() {
        let (_, cache) = cache_at(0);
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_token_hits() {
        let (_, cache) = cache_at(1_000);
        cache.set(SecretString::from("tok"), DEFAULT_TTL_MS).await;
        assert_eq!(cache.get().await.unwrap().expose_secret(), "tok");
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let (clock, cache) = cache_at(0);
        let cached = cache.set(SecretString::from("tok"), 120_000).await;
        assert_eq!(cached.expires_at_ms, 120_000);

        // 60_001 ms remaining: still served
        clock.set(59_999);
        assert!(cache.get().await.is_some());

        // exactly 60_000 ms remaining: treated as absent
        clock.set(60_000);
        assert!(cache.get().await.is_none());

        // the stale entry is still there until overwritten
        assert!(cache.peek().await.is_some());
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let (_, cache) = cache_at(0);
        cache.set(SecretString::from("first"), DEFAULT_TTL_MS).await;
        cache.set(SecretString::from("second"), DEFAULT_TTL_MS).await;
        assert_eq!(cache.get().await.unwrap().expose_secret(), "second");
    }

    #[tokio::test]
    async fn test_clear() {
        let (_, cache) = cache_at(0);
        cache.set(SecretString::from("tok"), DEFAULT_TTL_MS).await;
        cache.clear().await;
        assert!(cache.peek().await.is_none());
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(10);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_ms(), 2_010);
    }
}
