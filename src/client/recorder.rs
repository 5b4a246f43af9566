//! Per-client request metrics.
//!
//! [`MetricsRecorder`] keeps the counters behind
//! [`ContentClient::metrics()`](crate::ContentClient::metrics) and mirrors
//! each outcome to the process-wide `metrics` facade (see
//! [`telemetry`](crate::telemetry)). Every outcome is applied under one
//! short lock section, so two calls completing together never lose an
//! update.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::providers::CircuitState;
use crate::telemetry;
use crate::types::GenerationUsage;

/// Immutable view of a client's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Guarded requests issued (cache misses that passed validation).
    pub request_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Requests abandoned by the caller; not part of the average.
    pub cancelled_count: u64,
    /// Mean latency over completed (successful + failed) requests.
    pub average_response_time_ms: f64,
    /// Accumulated cost in USD.
    pub total_cost: f64,
    pub last_request_at: Option<SystemTime>,
    pub breaker_state: CircuitState,
}

#[derive(Debug, Default)]
struct Counters {
    request_count: u64,
    success_count: u64,
    failure_count: u64,
    cancelled_count: u64,
    average_response_time_ms: f64,
    total_cost: f64,
    last_request_at: Option<SystemTime>,
}

impl Counters {
    fn complete(&mut self, elapsed: Duration) {
        let completed = self.success_count + self.failure_count;
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.average_response_time_ms +=
            (ms - self.average_response_time_ms) / completed as f64;
        self.last_request_at = Some(SystemTime::now());
    }
}

/// Running counters for one client.
pub struct MetricsRecorder {
    provider: String,
    counters: Mutex<Counters>,
}

impl MetricsRecorder {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            counters: Mutex::new(Counters::default()),
        }
    }

    /// Count a request about to be sent to the provider.
    pub fn record_request(&self) {
        self.lock().request_count += 1;
    }

    /// Record a successful request and its usage.
    pub fn record_success(&self, elapsed: Duration, usage: &GenerationUsage) {
        {
            let mut c = self.lock();
            c.success_count += 1;
            c.total_cost += usage.cost;
            c.complete(elapsed);
        }
        self.emit("ok", elapsed);
        metrics::counter!(telemetry::TOKENS_TOTAL,
            "provider" => self.provider.clone(),
            "model" => usage.model.clone(),
        )
        .increment(u64::from(usage.tokens));
        metrics::histogram!(telemetry::COST_USD,
            "provider" => self.provider.clone(),
            "model" => usage.model.clone(),
        )
        .record(usage.cost);
    }

    /// Record a failed request (provider error, timeout or open circuit).
    pub fn record_failure(&self, elapsed: Duration) {
        {
            let mut c = self.lock();
            c.failure_count += 1;
            c.complete(elapsed);
        }
        self.emit("error", elapsed);
    }

    /// Record a request abandoned through cancellation.
    pub fn record_cancelled(&self) {
        self.lock().cancelled_count += 1;
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => self.provider.clone(),
            "status" => "cancelled",
        )
        .increment(1);
    }

    /// Copy the counters, tagged with the breaker's current state.
    pub fn snapshot(&self, breaker_state: CircuitState) -> MetricsSnapshot {
        let c = self.lock();
        MetricsSnapshot {
            request_count: c.request_count,
            success_count: c.success_count,
            failure_count: c.failure_count,
            cancelled_count: c.cancelled_count,
            average_response_time_ms: c.average_response_time_ms,
            total_cost: c.total_cost,
            last_request_at: c.last_request_at,
            breaker_state,
        }
    }

    fn emit(&self, status: &'static str, elapsed: Duration) {
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => self.provider.clone(),
            "status" => status,
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS,
            "provider" => self.provider.clone(),
        )
        .record(elapsed.as_secs_f64());
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(cost: f64) -> GenerationUsage {
        GenerationUsage {
            tokens: 100,
            cost,
            model: "gpt-4".into(),
        }
    }

    #[test]
    fn average_covers_successes_and_failures() {
        let recorder = MetricsRecorder::new("mock");
        recorder.record_request();
        recorder.record_success(Duration::from_millis(100), &usage(0.5));
        recorder.record_request();
        recorder.record_failure(Duration::from_millis(300));
        recorder.record_request();
        recorder.record_success(Duration::from_millis(200), &usage(0.25));

        let snap = recorder.snapshot(CircuitState::Closed);
        assert_eq!(snap.request_count, 3);
        assert_eq!(snap.success_count, 2);
        assert_eq!(snap.failure_count, 1);
        assert!((snap.average_response_time_ms - 200.0).abs() < 1e-9);
        assert!((snap.total_cost - 0.75).abs() < 1e-12);
        assert!(snap.last_request_at.is_some());
    }

    #[test]
    fn cancellation_is_not_averaged() {
        let recorder = MetricsRecorder::new("mock");
        recorder.record_request();
        recorder.record_cancelled();

        let snap = recorder.snapshot(CircuitState::Open);
        assert_eq!(snap.cancelled_count, 1);
        assert_eq!(snap.success_count + snap.failure_count, 0);
        assert_eq!(snap.average_response_time_ms, 0.0);
        assert!(snap.last_request_at.is_none());
        assert_eq!(snap.breaker_state, CircuitState::Open);
    }
}
