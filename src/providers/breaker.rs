//! Three-state circuit breaker guarding provider calls.
//!
//! ```text
//! Closed --[failure_threshold consecutive failures]--> Open
//! Open   --[call after recovery_timeout]-------------> HalfOpen (that call is the probe)
//! HalfOpen --[probe succeeds]--> Closed
//! HalfOpen --[probe fails]-----> Open (last failure refreshed)
//! ```
//!
//! While open, calls are rejected with [`QuillonError::CircuitOpen`] and the
//! operation is never invoked. In half-open exactly one probe is in flight;
//! concurrent callers are rejected until it settles.
//!
//! [`CircuitBreaker::execute`] races the operation against
//! `expected_response_time` using `tokio::time::timeout`, so whichever side
//! loses is dropped rather than left running. A timeout counts as a failure.
//!
//! Cancellation through a [`CancellationToken`] yields
//! [`QuillonError::Cancelled`]. By default a cancelled call is neither a
//! success nor a failure; set
//! [`CircuitBreakerConfig::cancellation_counts_as_failure`] to count it.
//! A cancelled (or dropped) half-open probe returns the breaker to open
//! without refreshing the failure timestamp, so the next call probes again.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::telemetry;
use crate::{QuillonError, Result};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls flow through.
    Closed,
    /// Calls are rejected without reaching the provider.
    Open,
    /// One probe call is allowed through.
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Configuration for a [`CircuitBreaker`].
///
/// ```rust
/// # use quillon::CircuitBreakerConfig;
/// # use std::time::Duration;
/// let config = CircuitBreakerConfig::new()
///     .failure_threshold(3)
///     .recovery_timeout(Duration::from_secs(10))
///     .expected_response_time(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit. Must be at least 1. Default: 5.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a probe is allowed. Default: 60s.
    pub recovery_timeout: Duration,
    /// Hard timeout of each guarded call. Default: 30s.
    pub expected_response_time: Duration,
    /// Observation window reported in snapshots. Advisory only; failures are
    /// counted as a consecutive run regardless of age. Default: 5 minutes.
    pub monitoring_window: Duration,
    /// Count cancelled calls as failures. Default: false.
    pub cancellation_counts_as_failure: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
            expected_response_time: Duration::from_secs(30),
            monitoring_window: Duration::from_secs(300),
            cancellation_counts_as_failure: false,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }

    pub fn expected_response_time(mut self, limit: Duration) -> Self {
        self.expected_response_time = limit;
        self
    }

    pub fn monitoring_window(mut self, window: Duration) -> Self {
        self.monitoring_window = window;
        self
    }

    pub fn cancellation_counts_as_failure(mut self, enabled: bool) -> Self {
        self.cancellation_counts_as_failure = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(QuillonError::Configuration(
                "failure_threshold must be at least 1".into(),
            ));
        }
        if self.expected_response_time.is_zero() {
            return Err(QuillonError::Configuration(
                "expected_response_time must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub expected_response_time: Duration,
    pub monitoring_window: Duration,
    /// Time left before a probe is admitted, while open.
    pub open_remaining: Option<Duration>,
}

#[derive(Debug)]
struct State {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure_at: Option<Instant>,
    /// Id of the half-open probe currently in flight.
    probe: Option<u64>,
    next_probe_id: u64,
}

#[derive(Debug, Clone, Copy)]
enum Permit {
    Normal,
    Probe(u64),
}

/// Releases a half-open probe slot if the `execute` future is dropped
/// before the call settles.
struct Admission<'a> {
    breaker: &'a CircuitBreaker,
    permit: Permit,
    settled: bool,
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release_probe(self.permit);
        }
    }
}

/// Circuit breaker with a hard per-call timeout.
///
/// Thread-safe; state lives behind a mutex that is never held across an
/// `.await`, so a slow guarded call blocks no other caller.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure_at: None,
                probe: None,
                next_probe_id: 0,
            }),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. An open breaker whose recovery timeout has elapsed
    /// still reports `Open` until the next call probes it.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let st = self.lock();
        let open_remaining = match (st.state, st.last_failure_at) {
            (CircuitState::Open, Some(at)) => Some(
                self.config
                    .recovery_timeout
                    .saturating_sub(Instant::now().saturating_duration_since(at)),
            ),
            _ => None,
        };
        BreakerSnapshot {
            state: st.state,
            consecutive_failures: st.consecutive_failures,
            failure_threshold: self.config.failure_threshold,
            recovery_timeout: self.config.recovery_timeout,
            expected_response_time: self.config.expected_response_time,
            monitoring_window: self.config.monitoring_window,
            open_remaining,
        }
    }

    /// Force the breaker closed, independent of any timer.
    pub fn reset(&self) {
        let mut st = self.lock();
        st.consecutive_failures = 0;
        st.last_failure_at = None;
        st.probe = None;
        if st.state != CircuitState::Closed {
            Self::transition(&mut st, CircuitState::Closed);
        }
        info!("circuit breaker reset");
    }

    /// Run `operation` under the breaker.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_with_cancel(operation, &CancellationToken::new())
            .await
    }

    /// Run `operation` under the breaker, aborting early if `cancel` fires.
    ///
    /// Returns the operation's own result or error, `CircuitOpen` if the
    /// call was rejected, `Timeout` if it exceeded `expected_response_time`,
    /// or `Cancelled`.
    pub async fn execute_with_cancel<F, Fut, T>(
        &self,
        operation: F,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut admission = Admission {
            breaker: self,
            permit: self.admit()?,
            settled: false,
        };

        let limit = self.config.expected_response_time;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(QuillonError::Cancelled),
            result = tokio::time::timeout(limit, operation()) => match result {
                Ok(result) => result,
                Err(_) => Err(QuillonError::Timeout(limit)),
            },
        };

        match &outcome {
            Ok(_) => self.on_success(),
            Err(QuillonError::Cancelled) if !self.config.cancellation_counts_as_failure => {
                self.release_probe(admission.permit)
            }
            Err(e) => self.on_failure(admission.permit, e),
        }
        admission.settled = true;
        outcome
    }

    fn admit(&self) -> Result<Permit> {
        let mut st = self.lock();
        match st.state {
            CircuitState::Closed => Ok(Permit::Normal),
            CircuitState::Open => {
                let elapsed = st
                    .last_failure_at
                    .map(|at| Instant::now().saturating_duration_since(at))
                    .unwrap_or(self.config.recovery_timeout);
                if elapsed >= self.config.recovery_timeout {
                    Self::transition(&mut st, CircuitState::HalfOpen);
                    Ok(Self::take_probe(&mut st))
                } else {
                    Err(Self::reject(self.config.recovery_timeout - elapsed))
                }
            }
            CircuitState::HalfOpen if st.probe.is_some() => {
                Err(Self::reject(self.config.expected_response_time))
            }
            CircuitState::HalfOpen => Ok(Self::take_probe(&mut st)),
        }
    }

    fn on_success(&self) {
        let mut st = self.lock();
        st.consecutive_failures = 0;
        if st.state != CircuitState::Closed {
            st.probe = None;
            st.last_failure_at = None;
            Self::transition(&mut st, CircuitState::Closed);
        }
    }

    fn on_failure(&self, permit: Permit, error: &QuillonError) {
        let mut st = self.lock();
        st.consecutive_failures = st.consecutive_failures.saturating_add(1);
        st.last_failure_at = Some(Instant::now());
        debug!(
            consecutive_failures = st.consecutive_failures,
            probe = matches!(permit, Permit::Probe(_)),
            error = %error,
            "guarded call failed"
        );
        let opens = match st.state {
            CircuitState::Closed => st.consecutive_failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if opens {
            st.probe = None;
            warn!(
                consecutive_failures = st.consecutive_failures,
                recovery_timeout_ms = self.config.recovery_timeout.as_millis() as u64,
                "circuit breaker opening"
            );
            Self::transition(&mut st, CircuitState::Open);
        }
    }

    /// Give back an unsettled probe slot: the breaker returns to open with
    /// its previous failure timestamp. No-op for normal permits or a probe
    /// that has since been superseded.
    fn release_probe(&self, permit: Permit) {
        let Permit::Probe(id) = permit else {
            return;
        };
        let mut st = self.lock();
        if st.state == CircuitState::HalfOpen && st.probe == Some(id) {
            st.probe = None;
            Self::transition(&mut st, CircuitState::Open);
        }
    }

    fn take_probe(st: &mut State) -> Permit {
        let id = st.next_probe_id;
        st.next_probe_id = st.next_probe_id.wrapping_add(1);
        st.probe = Some(id);
        Permit::Probe(id)
    }

    fn reject(retry_in: Duration) -> QuillonError {
        metrics::counter!(telemetry::CIRCUIT_REJECTIONS_TOTAL).increment(1);
        debug!(retry_in_ms = retry_in.as_millis() as u64, "circuit open, call rejected");
        QuillonError::CircuitOpen { retry_in }
    }

    fn transition(st: &mut State, to: CircuitState) {
        debug!(from = st.state.as_str(), to = to.as_str(), "circuit breaker transition");
        st.state = to;
        metrics::counter!(telemetry::CIRCUIT_TRANSITIONS_TOTAL, "to" => to.as_str()).increment(1);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State is plain counters; a panic mid-update cannot leave it invalid.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
