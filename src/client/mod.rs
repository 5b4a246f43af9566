//! The resilient content client.
//!
//! [`ContentClient`] composes a provider adapter with a circuit breaker,
//! a response cache, pricing and per-client metrics. Construct one with
//! [`ContentClient::builder`] or from a settings file via
//! [`Settings::client_builder`](crate::config::Settings::client_builder).

mod builder;
mod recorder;
mod service;

pub use builder::{ClientBuilder, DEFAULT_BATCH_CONCURRENCY};
pub use recorder::{MetricsRecorder, MetricsSnapshot};
pub use service::ContentClient;
