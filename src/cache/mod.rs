//! Caching subsystem.
//!
//! - [`response::ResponseCache`]: bounded LRU + TTL cache of generated
//!   responses, keyed on the request [`Fingerprint`](crate::fingerprint::Fingerprint).
//!   Sized via [`CacheConfig`] on the client builder.

pub mod response;

pub use response::{CacheConfig, ResponseCache};
