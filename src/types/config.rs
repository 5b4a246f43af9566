//! Service configuration for a content client.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{QuillonError, Result};

/// Upstream LLM vendor behind a provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// Conventional environment variable holding the credential.
    ///
    /// Ollama runs locally and needs none.
    pub fn credential_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = QuillonError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(QuillonError::Configuration(format!(
                "unknown provider '{other}'"
            ))),
        }
    }
}

/// Configuration of one client. Immutable once the client is built.
///
/// ```rust
/// # use quillon::{ProviderKind, ServiceConfig};
/// # use std::time::Duration;
/// let config = ServiceConfig::new(ProviderKind::OpenAi, "gpt-4", "sk-test")
///     .timeout(Duration::from_secs(20))
///     .temperature(0.4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq)]
pub struct ServiceConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub credential: String,
    pub base_url: Option<String>,
    /// Provider call timeout. Also the default hard timeout of the breaker.
    pub timeout: Duration,
    /// Retries on transient errors. 0 disables retry.
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ServiceConfig {
    /// Create a config with defaults for the optional knobs.
    pub fn new(
        provider: ProviderKind,
        model: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            credential: credential.into(),
            base_url: None,
            timeout: Duration::from_secs(30),
            max_retries: 0,
            temperature: 0.7,
            max_tokens: 2_000,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = n;
        self
    }

    /// Check the configuration invariants.
    pub fn validate(&self) -> Result<()> {
        if self.credential.trim().is_empty() {
            return Err(QuillonError::Configuration(format!(
                "credential for provider '{}' must not be empty",
                self.provider
            )));
        }
        if self.model.trim().is_empty() {
            return Err(QuillonError::Configuration("model must not be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(QuillonError::Configuration(
                "timeout must be greater than zero".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(QuillonError::Configuration(format!(
                "temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(QuillonError::Configuration(
                "max_tokens must be greater than zero".into(),
            ));
        }
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(QuillonError::Configuration(format!(
                    "base_url must be an http(s) URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("credential", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
