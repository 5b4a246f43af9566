//! Quillon - resilient client core for AI content generation
//!
//! This crate wraps a pluggable LLM provider adapter with the reliability
//! machinery a content service needs: a three-state circuit breaker with a
//! hard per-call timeout, a bounded response cache keyed on a request
//! fingerprint, per-model cost accounting, request metrics, and concurrent
//! batch generation with per-item failure isolation.
//!
//! Provider adapters implement [`ContentProvider`]; the client never
//! speaks HTTP itself.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use quillon::{
//!     ContentClient, ContentProvider, ContentType, GenerationRequest, ProviderKind,
//!     ProviderOutput, ServiceConfig,
//! };
//!
//! struct EchoProvider;
//!
//! #[async_trait]
//! impl ContentProvider for EchoProvider {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn generate(
//!         &self,
//!         request: &GenerationRequest,
//!         _config: &ServiceConfig,
//!     ) -> quillon::Result<ProviderOutput> {
//!         Ok(ProviderOutput::new(format!("All about {}", request.topic), 42))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> quillon::Result<()> {
//!     let config = ServiceConfig::new(ProviderKind::OpenAi, "gpt-4", "sk-your-key");
//!     let client = ContentClient::builder(config, Arc::new(EchoProvider)).build()?;
//!
//!     let request = GenerationRequest::new(ContentType::BlogPost, "Rust async")
//!         .keywords(["tokio", "futures"])
//!         .target_length(800);
//!     let response = client.generate_content(&request).await?;
//!
//!     println!("{} (${:.4})", response.content, response.usage.cost);
//!     println!("{:?}", client.metrics());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod pricing;
pub mod providers;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::CacheConfig;
pub use client::{ClientBuilder, ContentClient, MetricsSnapshot};
pub use config::Settings;
pub use error::{QuillonError, Result};
pub use fingerprint::{Fingerprint, fingerprint};
pub use pricing::{PricingOverrides, PricingTable};
pub use providers::{
    BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState, ContentProvider,
    RetryConfig,
};

// Re-export all types
pub use types::{
    ContentType, GenerationRequest, GenerationResponse, GenerationUsage, Personality,
    ProviderKind, ProviderOutput, QualityMetrics, ServiceConfig,
};
