//! Bounded response cache for generated content.
//!
//! [`ResponseCache`] maps a request [`Fingerprint`] to the
//! [`GenerationResponse`] produced for it. A hit is free: the client
//! returns it without touching the circuit breaker or its request metrics.
//! Hit/miss counters are emitted to the `metrics` facade only.
//!
//! # Bounding
//!
//! Entries are held in moka's async-friendly LRU + TTL cache, bounded by
//! [`CacheConfig::max_entries`] and expiring after [`CacheConfig::ttl`].
//! The cache is owned per client; nothing is shared across clients.
//!
//! # Concurrency
//!
//! Two concurrent misses for the same fingerprint both reach the provider;
//! the last insert wins. Responses are immutable, so either value is valid.

use std::time::Duration;

use moka::future::Cache;

use crate::fingerprint::Fingerprint;
use crate::telemetry;
use crate::types::GenerationResponse;
use crate::{QuillonError, Result};

/// Longest TTL moka accepts.
pub const MAX_TTL: Duration = Duration::from_secs(1000 * 365 * 24 * 60 * 60);

/// Configuration for the response cache.
///
/// ```rust
/// # use quillon::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(10_000)
///     .ttl(Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 10,000.
    pub max_entries: u64,
    /// Time-to-live for cached entries. Default: 1 hour.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Reject settings the cache cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(QuillonError::Configuration(
                "cache max_entries must be at least 1".into(),
            ));
        }
        if self.ttl.is_zero() || self.ttl > MAX_TTL {
            return Err(QuillonError::Configuration(format!(
                "cache ttl must be between 1s and {}s, got {}s",
                MAX_TTL.as_secs(),
                self.ttl.as_secs()
            )));
        }
        Ok(())
    }
}

/// In-memory cache of generated responses, keyed on request fingerprint.
pub struct ResponseCache {
    cache: Cache<Fingerprint, GenerationResponse>,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    ///
    /// The config must already have passed [`CacheConfig::validate`].
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }

    /// Look up a cached response.
    ///
    /// Returns `None` on cache miss. Emits cache hit/miss metrics.
    pub async fn get(&self, key: &Fingerprint) -> Option<GenerationResponse> {
        match self.cache.get(key).await {
            Some(response) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(response)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Insert (or overwrite) a response.
    pub async fn insert(&self, key: Fingerprint, response: GenerationResponse) {
        self.cache.insert(key, response).await;
    }

    /// Approximate number of live entries.
    ///
    /// moka applies writes lazily; call after [`sync()`](Self::sync) for an
    /// exact figure.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Flush pending maintenance so counts and evictions are up to date.
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Evict all entries.
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
