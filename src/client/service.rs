//! The resilient content client.
//!
//! ```text
//! generate_content(request)
//!        │ validate ──────────────► Validation (nothing else touched)
//!        │ fingerprint
//!        ▼
//!   ResponseCache ── hit ─────────► cached response (no metrics, no breaker)
//!        │ miss
//!        ▼ request_count += 1
//!   retry policy (max_retries)
//!        │ each attempt
//!        ▼
//!   CircuitBreaker ── open ───────► CircuitOpen
//!        │ timeout race ──────────► Timeout
//!        ▼
//!   ContentProvider::generate
//!        │ ok: cost, cache insert, success metrics
//!        ▼ err: failure metrics, error returned unchanged
//! ```

use std::sync::Arc;
use std::time::Instant;

use futures_util::{StreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::recorder::{MetricsRecorder, MetricsSnapshot};
use crate::cache::ResponseCache;
use crate::fingerprint::fingerprint;
use crate::pricing::PricingTable;
use crate::providers::retry::{RetryConfig, with_retry};
use crate::providers::{BreakerSnapshot, CircuitBreaker, CircuitState, ContentProvider};
use crate::types::{
    GenerationRequest, GenerationResponse, GenerationUsage, ProviderOutput, QualityMetrics,
    ServiceConfig,
};
use crate::{QuillonError, Result};

/// Counts a request as cancelled if its future is dropped before an
/// outcome is recorded.
struct InFlight<'a> {
    metrics: &'a MetricsRecorder,
    done: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.metrics.record_cancelled();
        }
    }
}

/// Content-generation client over one provider adapter.
///
/// Owns its circuit breaker, response cache and metrics; nothing is shared
/// with other clients. `Send + Sync`: wrap in an `Arc` to share between
/// tasks. Build with [`ContentClient::builder`].
pub struct ContentClient {
    config: ServiceConfig,
    provider: Arc<dyn ContentProvider>,
    breaker: CircuitBreaker,
    retry: RetryConfig,
    cache: ResponseCache,
    metrics: MetricsRecorder,
    pricing: PricingTable,
    batch_concurrency: usize,
}

impl ContentClient {
    pub(crate) fn new(
        config: ServiceConfig,
        provider: Arc<dyn ContentProvider>,
        breaker: CircuitBreaker,
        retry: RetryConfig,
        cache: ResponseCache,
        pricing: PricingTable,
        batch_concurrency: usize,
    ) -> Self {
        let metrics = MetricsRecorder::new(provider.name());
        Self {
            config,
            provider,
            breaker,
            retry,
            cache,
            metrics,
            pricing,
            batch_concurrency,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate content for one request.
    ///
    /// Errors: `Validation`, `CircuitOpen`, `Timeout`, or the provider's own
    /// error, unchanged. Nothing is retried unless the config sets
    /// `max_retries`.
    pub async fn generate_content(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.generate_content_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`generate_content`](Self::generate_content), aborting with
    /// `Cancelled` when `cancel` fires.
    ///
    /// A cancelled call counts as neither success nor failure, in the client
    /// metrics and (unless configured otherwise) in the breaker.
    #[instrument(
        skip(self, request, cancel),
        fields(provider = self.provider.name(), content_type = %request.content_type)
    )]
    pub async fn generate_content_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerationResponse> {
        request.validate()?;
        let key = fingerprint(request)?;

        if let Some(cached) = self.cache.get(&key).await {
            debug!(fingerprint = %key, "cache hit");
            return Ok(cached);
        }

        self.metrics.record_request();
        let mut in_flight = InFlight {
            metrics: &self.metrics,
            done: false,
        };
        let start = Instant::now();

        let outcome = with_retry(&self.retry, self.provider.name(), cancel, || {
            self.breaker.execute_with_cancel(
                || self.provider.generate(request, &self.config),
                cancel,
            )
        })
        .await;
        let elapsed = start.elapsed();

        let result = match outcome {
            Ok(output) => {
                let response = self.build_response(request, output);
                self.cache.insert(key, response.clone()).await;
                self.metrics.record_success(elapsed, &response.usage);
                debug!(
                    tokens = response.usage.tokens,
                    cost = response.usage.cost,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "content generated"
                );
                Ok(response)
            }
            Err(QuillonError::Cancelled) => {
                self.metrics.record_cancelled();
                debug!("generation cancelled");
                Err(QuillonError::Cancelled)
            }
            Err(e) => {
                self.metrics.record_failure(elapsed);
                warn!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "generation failed");
                Err(e)
            }
        };
        in_flight.done = true;
        result
    }

    /// Generate content for each request independently.
    ///
    /// Returns one result per input, in input order. Items run concurrently
    /// up to the configured batch concurrency; a failing item never aborts
    /// the others.
    pub async fn generate_batch(
        &self,
        requests: &[GenerationRequest],
    ) -> Vec<Result<GenerationResponse>> {
        self.generate_batch_with_cancel(requests, &CancellationToken::new())
            .await
    }

    /// Like [`generate_batch`](Self::generate_batch); `cancel` applies to
    /// every item still pending.
    #[instrument(skip(self, requests, cancel), fields(batch_size = requests.len()))]
    pub async fn generate_batch_with_cancel(
        &self,
        requests: &[GenerationRequest],
        cancel: &CancellationToken,
    ) -> Vec<Result<GenerationResponse>> {
        stream::iter(requests)
            .map(|request| self.generate_content_with_cancel(request, cancel))
            .buffered(self.batch_concurrency)
            .collect()
            .await
    }

    /// Snapshot of the request counters and breaker state.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.breaker.state())
    }

    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// `true` unless the circuit breaker is open.
    pub fn is_healthy(&self) -> bool {
        self.breaker.state() != CircuitState::Open
    }

    /// Force the breaker closed. Cache and metrics are left untouched.
    pub fn reset_circuit_breaker(&self) {
        self.breaker.reset();
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached responses.
    pub async fn cached_entries(&self) -> u64 {
        self.cache.sync().await;
        self.cache.entry_count()
    }

    fn build_response(&self, request: &GenerationRequest, output: ProviderOutput) -> GenerationResponse {
        let model = self.config.model.clone();
        let cost = self.pricing.calculate_cost(output.tokens_used, &model);
        let quality = QualityMetrics::measure(&output.text, &request.keywords);
        GenerationResponse {
            content: output.text,
            title: output.title,
            summary: output.summary,
            keywords: request.keywords.clone(),
            quality: Some(quality),
            usage: GenerationUsage {
                tokens: output.tokens_used,
                cost,
                model,
            },
        }
    }
}
