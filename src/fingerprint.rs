//! Request fingerprinting for the response cache.
//!
//! A fingerprint is the SHA-256 of a canonical projection of the request,
//! restricted to the fields that determine the generated output: content
//! type, topic, sorted keywords, target length, language, personality name
//! and template. `context`, `requirements` and the personality's tone and
//! style are left out: requests differing only there share a cache entry.
//!
//! The digest is stable across processes and builds.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::Result;
use crate::types::{ContentType, GenerationRequest};

/// Hex-encoded SHA-256 cache key of a [`GenerationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field order here is the serialisation order.
#[derive(Serialize)]
struct Canonical<'a> {
    content_type: ContentType,
    topic: &'a str,
    keywords: Vec<&'a str>,
    target_length: Option<u32>,
    language: Option<&'a str>,
    personality: Option<&'a str>,
    template: Option<&'a str>,
}

impl<'a> Canonical<'a> {
    fn of(request: &'a GenerationRequest) -> Self {
        let mut keywords: Vec<&str> = request.keywords.iter().map(String::as_str).collect();
        keywords.sort_unstable();
        Self {
            content_type: request.content_type,
            topic: &request.topic,
            keywords,
            target_length: request.target_length,
            language: request.language.as_deref(),
            personality: request.personality.as_ref().map(|p| p.name.as_str()),
            template: request.template.as_deref(),
        }
    }
}

/// Compute the cache key of a request.
pub fn fingerprint(request: &GenerationRequest) -> Result<Fingerprint> {
    let canonical = serde_json::to_vec(&Canonical::of(request))?;
    let digest = Sha256::digest(&canonical);
    Ok(Fingerprint(format!("{digest:x}")))
}
