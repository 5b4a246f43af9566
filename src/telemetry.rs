//! Telemetry metric name constants.
//!
//! Centralised metric names for quillon operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! These are process-wide series. The per-client counters required by
//! [`ContentClient::metrics()`](crate::ContentClient::metrics) are kept
//! separately in [`MetricsRecorder`](crate::client::MetricsRecorder).
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `quillon_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`, `_usd`).
//!
//! # Common labels
//!
//! - `provider`: provider adapter name (e.g. "openai", "gemini")
//! - `status`: outcome: "ok", "error" or "cancelled"
//! - `to`: breaker state entered: "closed", "open" or "half_open"

/// Total guarded requests (cache misses) issued by a client.
///
/// Labels: `provider`, `status` ("ok" | "error" | "cancelled").
pub const REQUESTS_TOTAL: &str = "quillon_requests_total";

/// Request duration in seconds, including retries.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "quillon_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "quillon_retries_total";

/// Total tokens consumed by successful generations.
///
/// Labels: `provider`, `model`.
pub const TOKENS_TOTAL: &str = "quillon_tokens_total";

/// Cost of each successful generation in USD.
///
/// Labels: `provider`, `model`.
pub const COST_USD: &str = "quillon_cost_usd";

/// Total response cache hits. No labels.
pub const CACHE_HITS_TOTAL: &str = "quillon_cache_hits_total";

/// Total response cache misses. No labels.
pub const CACHE_MISSES_TOTAL: &str = "quillon_cache_misses_total";

/// Total circuit breaker state transitions.
///
/// Labels: `to`.
pub const CIRCUIT_TRANSITIONS_TOTAL: &str = "quillon_circuit_transitions_total";

/// Total calls rejected by an open circuit breaker.
pub const CIRCUIT_REJECTIONS_TOTAL: &str = "quillon_circuit_rejections_total";
