//! Generation response types

use serde::{Deserialize, Serialize};

/// Words per minute used for reading-time estimates.
const READING_WORDS_PER_MINUTE: usize = 200;

/// Raw output of a provider adapter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderOutput {
    pub text: String,
    pub tokens_used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ProviderOutput {
    pub fn new(text: impl Into<String>, tokens_used: u32) -> Self {
        Self {
            text: text.into(),
            tokens_used,
            title: None,
            summary: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Token usage and cost of one generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationUsage {
    pub tokens: u32,
    /// Cost in USD.
    pub cost: f64,
    pub model: String,
}

/// Locally computed quality indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub word_count: usize,
    pub reading_time_minutes: usize,
    /// Fraction of requested keywords present in the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_coverage: Option<f64>,
}

impl QualityMetrics {
    /// Measure `content` against the requested keywords.
    pub fn measure(content: &str, keywords: &[String]) -> Self {
        let word_count = content.split_whitespace().count();
        let reading_time_minutes = word_count.div_ceil(READING_WORDS_PER_MINUTE);

        let keyword_coverage = if keywords.is_empty() {
            None
        } else {
            let haystack = content.to_lowercase();
            let found = keywords
                .iter()
                .filter(|k| haystack.contains(&k.to_lowercase()))
                .count();
            Some(found as f64 / keywords.len() as f64)
        };

        Self {
            word_count,
            reading_time_minutes,
            keyword_coverage,
        }
    }
}

/// Result of a successful generation. Cached verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityMetrics>,
    pub usage: GenerationUsage,
}
