//! Builder for [`ContentClient`].

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::service::ContentClient;
use crate::cache::{CacheConfig, ResponseCache};
use crate::pricing::PricingTable;
use crate::providers::{CircuitBreaker, CircuitBreakerConfig, ContentProvider, RetryConfig};
use crate::types::ServiceConfig;
use crate::{QuillonError, Result};

/// Concurrent items per batch unless overridden.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Builder for configuring a [`ContentClient`].
///
/// ```rust,ignore
/// let client = ContentClient::builder(config, Arc::new(my_provider))
///     .breaker(CircuitBreakerConfig::new().failure_threshold(3))
///     .cache(CacheConfig::new().max_entries(500))
///     .batch_concurrency(8)
///     .build()?;
/// ```
pub struct ClientBuilder {
    config: ServiceConfig,
    provider: Arc<dyn ContentProvider>,
    breaker: Option<CircuitBreakerConfig>,
    cache: CacheConfig,
    pricing: PricingTable,
    backoff: Option<(Duration, Duration)>,
    batch_concurrency: usize,
}

impl ContentClient {
    /// Start building a client for `provider` with the given service config.
    pub fn builder(config: ServiceConfig, provider: Arc<dyn ContentProvider>) -> ClientBuilder {
        ClientBuilder::new(config, provider)
    }
}

impl ClientBuilder {
    pub fn new(config: ServiceConfig, provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            config,
            provider,
            breaker: None,
            cache: CacheConfig::default(),
            pricing: PricingTable::default(),
            backoff: None,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Circuit breaker settings.
    ///
    /// When unset, the defaults apply with `expected_response_time` taken
    /// from the service config's `timeout`.
    pub fn breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker = Some(config);
        self
    }

    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Per-model cost rates. Default: the built-in table.
    pub fn pricing(mut self, table: PricingTable) -> Self {
        self.pricing = table;
        self
    }

    /// Backoff between retries. The number of retries always comes from
    /// `ServiceConfig::max_retries`.
    pub fn retry_backoff(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.backoff = Some((initial_delay, max_delay));
        self
    }

    /// Maximum batch items in flight at once. Must be at least 1.
    pub fn batch_concurrency(mut self, n: usize) -> Self {
        self.batch_concurrency = n;
        self
    }

    /// Validate everything and build the client.
    pub fn build(self) -> Result<ContentClient> {
        self.config.validate()?;
        if self.batch_concurrency == 0 {
            return Err(QuillonError::Configuration(
                "batch_concurrency must be at least 1".into(),
            ));
        }

        let breaker_config = self.breaker.unwrap_or_else(|| {
            CircuitBreakerConfig::default().expected_response_time(self.config.timeout)
        });
        breaker_config.validate()?;
        self.cache.validate()?;

        let mut retry = RetryConfig::from_max_retries(self.config.max_retries);
        if let Some((initial, max)) = self.backoff {
            retry = retry.initial_delay(initial).max_delay(max);
        }

        info!(
            provider = self.provider.name(),
            model = %self.config.model,
            failure_threshold = breaker_config.failure_threshold,
            max_attempts = retry.max_attempts,
            cache_entries = self.cache.max_entries,
            "content client ready"
        );

        Ok(ContentClient::new(
            self.config,
            self.provider,
            CircuitBreaker::new(breaker_config),
            retry,
            ResponseCache::new(&self.cache),
            self.pricing,
            self.batch_concurrency,
        ))
    }
}
