//! Provider boundary and the reliability policies wrapped around it.
//!
//! - [`traits`]: the [`ContentProvider`] adapter trait.
//! - [`breaker`]: [`CircuitBreaker`] with hard timeout and cancellation.
//! - [`retry`]: bounded retry policy layered above the breaker.

pub mod breaker;
pub mod retry;
pub mod traits;

pub use breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::RetryConfig;
pub use traits::ContentProvider;
