//! Provider adapter boundary.
//!
//! A [`ContentProvider`] performs the actual remote call to one vendor's
//! API. Adapters are stateless from the client's point of view: the client
//! holds an `Arc<dyn ContentProvider>`, calls it under its circuit breaker,
//! and never manages its lifecycle. Request shaping, auth and marshaling
//! are the adapter's business.
//!
//! # Errors
//!
//! Adapters should map vendor failures onto the provider family of
//! [`QuillonError`](crate::QuillonError) (`Http`, `Api`, `RateLimited`,
//! `AuthenticationFailed`, `EmptyResponse`, `Provider`) so the retry policy
//! can tell transient failures from permanent ones. Whatever they return is
//! counted as a breaker failure and propagated unchanged.
//!
//! # Example
//!
//! ```ignore
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
//!     ) -> Result<ProviderOutput> {
//!         Ok(ProviderOutput::new(format!("About {}", request.topic), 12))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::Result;
use crate::types::{GenerationRequest, ProviderOutput, ServiceConfig};

/// Adapter for one LLM vendor.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Provider name for logging/metrics.
    fn name(&self) -> &str;

    /// Generate text for `request`.
    ///
    /// `config` is the owning client's configuration (model, credential,
    /// temperature, token limit, base URL, timeout).
    async fn generate(
        &self,
        request: &GenerationRequest,
        config: &ServiceConfig,
    ) -> Result<ProviderOutput>;
}
