//! Public types for the Quillon API.

mod config;
mod request;
mod response;

pub use config::{ProviderKind, ServiceConfig};
pub use request::{
    ContentType, GenerationRequest, MAX_KEYWORDS, MAX_TARGET_LENGTH, MAX_TOPIC_CHARS, Personality,
};
pub use response::{GenerationResponse, GenerationUsage, ProviderOutput, QualityMetrics};
