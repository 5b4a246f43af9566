//! End-to-end tests of `ContentClient` against a scripted provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quillon::cache::response::MAX_TTL;
use quillon::{
    CacheConfig, CircuitBreakerConfig, CircuitState, ContentClient, ContentProvider, ContentType,
    GenerationRequest, ProviderKind, ProviderOutput, QuillonError, Result, ServiceConfig,
};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock provider
// ============================================================================

/// Provider that answers with text derived from the topic.
///
/// Optionally sleeps before answering, always fails for one topic, or fails
/// its first N calls with a transient error.
struct MockProvider {
    calls: AtomicU32,
    transient_failures: AtomicU32,
    failing_topic: Option<&'static str>,
    delay: Duration,
}

impl MockProvider {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            transient_failures: AtomicU32::new(0),
            failing_topic: None,
            delay: Duration::ZERO,
        }
    }

    fn failing_on(topic: &'static str) -> Self {
        Self {
            failing_topic: Some(topic),
            ..Self::new()
        }
    }

    fn flaky(failures: u32) -> Self {
        Self {
            transient_failures: AtomicU32::new(failures),
            ..Self::new()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
        _config: &ServiceConfig,
    ) -> Result<ProviderOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing_topic == Some(request.topic.as_str()) {
            return Err(QuillonError::Provider("model refused".into()));
        }
        if self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(QuillonError::Http("connection reset".into()));
        }
        Ok(ProviderOutput::new(
            format!("An article about {} covering tokio and async", request.topic),
            1_500,
        )
        .title(format!("On {}", request.topic)))
    }
}

fn config() -> ServiceConfig {
    ServiceConfig::new(ProviderKind::OpenAi, "gpt-4", "sk-test")
}

fn client(provider: &Arc<MockProvider>) -> ContentClient {
    ContentClient::builder(config(), provider.clone())
        .build()
        .unwrap()
}

fn request(topic: &str) -> GenerationRequest {
    GenerationRequest::new(ContentType::Article, topic)
}

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
async fn generates_content_with_cost_and_quality() {
    let provider = Arc::new(MockProvider::new());
    let client = client(&provider);

    let response = client
        .generate_content(&request("rust async").keywords(["tokio", "rust"]))
        .await
        .unwrap();

    assert_eq!(
        response.content,
        "An article about rust async covering tokio and async"
    );
    assert_eq!(response.title.as_deref(), Some("On rust async"));
    assert_eq!(response.keywords, vec!["tokio", "rust"]);
    assert_eq!(response.usage.tokens, 1_500);
    assert_eq!(response.usage.model, "gpt-4");
    assert!((response.usage.cost - 0.045).abs() < 1e-12);

    let quality = response.quality.unwrap();
    assert_eq!(quality.word_count, 9);
    assert_eq!(quality.reading_time_minutes, 1);
    assert_eq!(quality.keyword_coverage, Some(1.0));
}

#[tokio::test]
async fn exposes_config_and_provider_name() {
    let provider = Arc::new(MockProvider::new());
    let client = client(&provider);
    assert_eq!(client.provider_name(), "mock");
    assert_eq!(client.config().model, "gpt-4");
    assert!(client.is_healthy());
}

// ============================================================================
// Cache
// ============================================================================

#[tokio::test]
async fn cache_hit_skips_provider_and_metrics() {
    let provider = Arc::new(MockProvider::new());
    let client = client(&provider);

    let first = client
        .generate_content(&request("caching").keywords(["a", "b"]))
        .await
        .unwrap();
    let before = client.metrics();
    assert_eq!(before.request_count, 1);
    assert_eq!(before.success_count, 1);

    let second = client
        .generate_content(&request("caching").keywords(["b", "a"]))
        .await
        .unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(first.content, second.content);
    assert_eq!(first.usage, second.usage);
    assert_eq!(client.metrics(), before);
}

#[tokio::test]
async fn distinct_requests_miss_the_cache() {
    let provider = Arc::new(MockProvider::new());
    let client = client(&provider);

    client.generate_content(&request("one")).await.unwrap();
    client
        .generate_content(&request("one").target_length(300))
        .await
        .unwrap();
    client.generate_content(&request("two")).await.unwrap();

    assert_eq!(provider.calls(), 3);
    assert_eq!(client.cached_entries().await, 3);
}

#[tokio::test]
async fn clear_cache_forces_a_fresh_call() {
    let provider = Arc::new(MockProvider::new());
    let client = client(&provider);

    client.generate_content(&request("fresh")).await.unwrap();
    client.clear_cache();
    assert_eq!(client.cached_entries().await, 0);

    client.generate_content(&request("fresh")).await.unwrap();
    assert_eq!(provider.calls(), 2);
    assert_eq!(client.metrics().request_count, 2);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let provider = Arc::new(MockProvider::failing_on("doomed"));
    let client = client(&provider);

    for _ in 0..2 {
        let err = client.generate_content(&request("doomed")).await.unwrap_err();
        assert!(matches!(err, QuillonError::Provider(_)));
    }
    assert_eq!(provider.calls(), 2);
    assert_eq!(client.cached_entries().await, 0);
}

// ============================================================================
// Validation and metrics
// ============================================================================

#[tokio::test]
async fn invalid_request_never_reaches_provider() {
    let provider = Arc::new(MockProvider::new());
    let client = client(&provider);

    let err = client.generate_content(&request("   ")).await.unwrap_err();
    assert!(matches!(err, QuillonError::Validation(_)));

    let err = client
        .generate_content(&request("fine").target_length(0))
        .await
        .unwrap_err();
    assert!(matches!(err, QuillonError::Validation(_)));

    assert_eq!(provider.calls(), 0);
    assert_eq!(client.metrics().request_count, 0);
}

#[tokio::test]
async fn success_and_failure_counts_partition_requests() {
    let provider = Arc::new(MockProvider::failing_on("bad"));
    let client = client(&provider);

    for topic in ["a", "bad", "b", "bad", "c"] {
        let _ = client.generate_content(&request(topic)).await;
    }

    let metrics = client.metrics();
    assert_eq!(metrics.request_count, 5);
    assert_eq!(metrics.success_count, 3);
    assert_eq!(metrics.failure_count, 2);
    assert_eq!(metrics.cancelled_count, 0);
    assert!((metrics.total_cost - 3.0 * 0.045).abs() < 1e-12);
    assert!(metrics.last_request_at.is_some());
    assert_eq!(metrics.breaker_state, CircuitState::Closed);
}

// ============================================================================
// Circuit breaker integration
// ============================================================================

#[tokio::test]
async fn open_circuit_fails_fast_and_counts_as_failure() {
    let provider = Arc::new(MockProvider::failing_on("bad"));
    let client = ContentClient::builder(config(), provider.clone())
        .breaker(CircuitBreakerConfig::new().failure_threshold(1))
        .build()
        .unwrap();

    client.generate_content(&request("bad")).await.unwrap_err();
    assert!(!client.is_healthy());

    let err = client.generate_content(&request("good")).await.unwrap_err();
    assert!(matches!(err, QuillonError::CircuitOpen { .. }));
    assert_eq!(provider.calls(), 1);

    let metrics = client.metrics();
    assert_eq!(metrics.request_count, 2);
    assert_eq!(metrics.failure_count, 2);
    assert_eq!(metrics.breaker_state, CircuitState::Open);
}

#[tokio::test]
async fn reset_leaves_cache_and_metrics_alone() {
    let provider = Arc::new(MockProvider::failing_on("bad"));
    let client = ContentClient::builder(config(), provider.clone())
        .breaker(CircuitBreakerConfig::new().failure_threshold(1))
        .build()
        .unwrap();

    client.generate_content(&request("cached")).await.unwrap();
    client.generate_content(&request("bad")).await.unwrap_err();
    assert_eq!(client.breaker_snapshot().state, CircuitState::Open);

    let before = client.metrics();
    client.reset_circuit_breaker();
    assert!(client.is_healthy());

    let after = client.metrics();
    assert_eq!(after.request_count, before.request_count);
    assert_eq!(after.failure_count, before.failure_count);
    assert_eq!(after.breaker_state, CircuitState::Closed);

    client.generate_content(&request("cached")).await.unwrap();
    assert_eq!(provider.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_provider_times_out() {
    let provider = Arc::new(MockProvider::slow(Duration::from_secs(5)));
    let client = ContentClient::builder(config().timeout(Duration::from_secs(1)), provider)
        .build()
        .unwrap();

    let err = client.generate_content(&request("slow")).await.unwrap_err();
    match err {
        QuillonError::Timeout(limit) => assert_eq!(limit, Duration::from_secs(1)),
        other => panic!("expected Timeout, got {other:?}"),
    }
    assert_eq!(client.metrics().failure_count, 1);
    assert_eq!(client.breaker_snapshot().consecutive_failures, 1);
}

// ============================================================================
// Retry
// ============================================================================

#[tokio::test]
async fn transient_errors_are_not_retried_by_default() {
    let provider = Arc::new(MockProvider::flaky(1));
    let client = client(&provider);

    let err = client.generate_content(&request("flaky")).await.unwrap_err();
    assert!(matches!(err, QuillonError::Http(_)));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn max_retries_recovers_from_transient_errors() {
    let provider = Arc::new(MockProvider::flaky(2));
    let client = ContentClient::builder(config().max_retries(2), provider.clone())
        .retry_backoff(Duration::from_millis(1), Duration::from_millis(1))
        .build()
        .unwrap();

    client.generate_content(&request("flaky")).await.unwrap();
    assert_eq!(provider.calls(), 3);

    let metrics = client.metrics();
    assert_eq!(metrics.request_count, 1);
    assert_eq!(metrics.success_count, 1);
    assert_eq!(metrics.failure_count, 0);
    assert_eq!(client.breaker_snapshot().consecutive_failures, 0);
}

#[tokio::test]
async fn permanent_errors_are_never_retried() {
    let provider = Arc::new(MockProvider::failing_on("bad"));
    let client = ContentClient::builder(config().max_retries(3), provider.clone())
        .retry_backoff(Duration::from_millis(1), Duration::from_millis(1))
        .build()
        .unwrap();

    client.generate_content(&request("bad")).await.unwrap_err();
    assert_eq!(provider.calls(), 1);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn cancelled_call_is_neither_success_nor_failure() {
    let provider = Arc::new(MockProvider::new());
    let client = client(&provider);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client
        .generate_content_with_cancel(&request("never"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, QuillonError::Cancelled));

    let metrics = client.metrics();
    assert_eq!(metrics.request_count, 1);
    assert_eq!(metrics.cancelled_count, 1);
    assert_eq!(metrics.success_count + metrics.failure_count, 0);
    assert_eq!(client.breaker_snapshot().consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn dropped_call_counts_as_cancelled() {
    let provider = Arc::new(MockProvider::slow(Duration::from_secs(10)));
    let client = client(&provider);

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        client.generate_content(&request("abandoned")),
    )
    .await;
    assert!(outcome.is_err());

    let metrics = client.metrics();
    assert_eq!(metrics.cancelled_count, 1);
    assert_eq!(metrics.failure_count, 0);
    assert_eq!(client.breaker_snapshot().state, CircuitState::Closed);
}

// ============================================================================
// Batch
// ============================================================================

#[tokio::test]
async fn batch_isolates_failures_and_keeps_order() {
    let provider = Arc::new(MockProvider::failing_on("second"));
    let client = client(&provider);

    let requests = vec![request("first"), request("second"), request("third")];
    let results = client.generate_batch(&requests).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().unwrap().content.contains("first"));
    assert!(matches!(results[1], Err(QuillonError::Provider(_))));
    assert!(results[2].as_ref().unwrap().content.contains("third"));
}

#[tokio::test]
async fn empty_batch_yields_no_results() {
    let provider = Arc::new(MockProvider::new());
    let client = client(&provider);
    assert!(client.generate_batch(&[]).await.is_empty());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn batch_concurrency_bounds_items_in_flight() {
    let provider = Arc::new(MockProvider::slow(Duration::from_secs(1)));
    let client = ContentClient::builder(config(), provider.clone())
        .batch_concurrency(2)
        .build()
        .unwrap();

    let requests: Vec<_> = (0..4).map(|i| request(&format!("topic {i}"))).collect();
    let start = tokio::time::Instant::now();
    let results = client.generate_batch(&requests).await;
    let elapsed = start.elapsed();

    assert!(results.iter().all(|r| r.is_ok()));
    assert!(elapsed >= Duration::from_secs(2), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "elapsed {elapsed:?}");
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn client_is_shareable_across_tasks() {
    let provider = Arc::new(MockProvider::new());
    let client = Arc::new(client(&provider));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                client
                    .generate_content(&request(&format!("task {i}")))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let metrics = client.metrics();
    assert_eq!(metrics.request_count, 16);
    assert_eq!(metrics.success_count, 16);
    assert_eq!(provider.calls(), 16);
}

// ============================================================================
// Builder validation
// ============================================================================

#[test]
fn builder_rejects_invalid_settings() {
    let provider = Arc::new(MockProvider::new());

    let bad_credential = ServiceConfig::new(ProviderKind::OpenAi, "gpt-4", "");
    assert!(matches!(
        ContentClient::builder(bad_credential, provider.clone()).build(),
        Err(QuillonError::Configuration(_))
    ));

    assert!(matches!(
        ContentClient::builder(config(), provider.clone())
            .batch_concurrency(0)
            .build(),
        Err(QuillonError::Configuration(_))
    ));

    assert!(matches!(
        ContentClient::builder(config(), provider.clone())
            .breaker(CircuitBreakerConfig::new().failure_threshold(0))
            .build(),
        Err(QuillonError::Configuration(_))
    ));

    assert!(matches!(
        ContentClient::builder(config(), provider.clone())
            .cache(CacheConfig::new().max_entries(0))
            .build(),
        Err(QuillonError::Configuration(_))
    ));

    assert!(matches!(
        ContentClient::builder(config(), provider.clone())
            .cache(CacheConfig::new().ttl(Duration::ZERO))
            .build(),
        Err(QuillonError::Configuration(_))
    ));

    assert!(matches!(
        ContentClient::builder(config(), provider.clone())
            .cache(CacheConfig::new().ttl(MAX_TTL + Duration::from_secs(1)))
            .build(),
        Err(QuillonError::Configuration(_))
    ));

    assert!(
        ContentClient::builder(config(), provider)
            .cache(CacheConfig::new().ttl(MAX_TTL))
            .build()
            .is_ok()
    );
}
