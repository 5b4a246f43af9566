//! Settings file loading.
//!
//! Settings are loaded from TOML with the following resolution order:
//! 1. Explicit path (if provided)
//! 2. `~/.quillon/config.toml` (user)
//! 3. `/etc/quillon/config.toml` (system)
//!
//! ```toml
//! [service]
//! provider = "openai"
//! model = "gpt-4"
//! # credential falls back to OPENAI_API_KEY when omitted
//! timeout_secs = 30
//! max_retries = 2
//!
//! [breaker]
//! failure_threshold = 5
//! recovery_timeout_secs = 60
//!
//! [cache]
//! max_entries = 10000
//! ttl_secs = 3600
//!
//! [batch]
//! concurrency = 4
//!
//! [pricing]
//! default_rate = 0.002
//! [pricing.rates]
//! my-finetune = 0.012
//! ```
//!
//! Every value goes through the same validation as programmatic
//! construction when the client is built.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::cache::CacheConfig;
use crate::client::ClientBuilder;
use crate::pricing::{PricingOverrides, PricingTable};
use crate::providers::{CircuitBreakerConfig, ContentProvider};
use crate::types::{ProviderKind, ServiceConfig};
use crate::{ContentClient, QuillonError, Result};

/// Credential used for providers that need none.
pub const OLLAMA_PLACEHOLDER_CREDENTIAL: &str = "ollama";

/// Parsed settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub service: ServiceSection,
    #[serde(default)]
    pub breaker: BreakerSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub batch: BatchSection,
    #[serde(default)]
    pub pricing: PricingOverrides,
}

/// `[service]`: which provider and model, and how to call it.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    pub provider: ProviderKind,
    pub model: String,
    /// Falls back to the provider's environment variable when absent.
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2_000
}

/// `[breaker]`
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerSection {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_recovery_timeout_secs")]
    pub recovery_timeout_secs: u64,
    /// Defaults to the service timeout.
    #[serde(default)]
    pub expected_response_time_ms: Option<u64>,
    #[serde(default = "default_monitoring_window_secs")]
    pub monitoring_window_secs: u64,
    #[serde(default)]
    pub cancellation_counts_as_failure: bool,
}

impl Default for BreakerSection {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
            expected_response_time_ms: None,
            monitoring_window_secs: default_monitoring_window_secs(),
            cancellation_counts_as_failure: false,
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout_secs() -> u64 {
    60
}

fn default_monitoring_window_secs() -> u64 {
    300
}

/// `[cache]`
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_entries() -> u64 {
    10_000
}

fn default_ttl_secs() -> u64 {
    3_600
}

/// `[batch]`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSection {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    crate::client::DEFAULT_BATCH_CONCURRENCY
}

impl Settings {
    /// Load settings from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.quillon/config.toml`
    /// 3. `/etc/quillon/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            QuillonError::Configuration(format!("failed to read config file {path:?}: {e}"))
        })?;
        debug!(path = %path.display(), "loading settings");
        toml::from_str(&content).map_err(|e| {
            QuillonError::Configuration(format!("failed to parse config file {path:?}: {e}"))
        })
    }

    /// Parse settings from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| QuillonError::Configuration(format!("failed to parse settings: {e}")))
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(QuillonError::Configuration(format!(
                "config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".quillon").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/quillon/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(QuillonError::Configuration(
            "no config file found. Create ~/.quillon/config.toml or /etc/quillon/config.toml"
                .to_string(),
        ))
    }

    /// The `[service]` section as a validated [`ServiceConfig`], reading a
    /// missing credential from the process environment.
    pub fn service_config(&self) -> Result<ServiceConfig> {
        self.service_config_with_env(|name| std::env::var(name).ok())
    }

    /// Like [`service_config`](Self::service_config) with a custom
    /// environment lookup.
    pub fn service_config_with_env(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<ServiceConfig> {
        let s = &self.service;
        let credential = match (&s.credential, s.provider.credential_env_var()) {
            (Some(credential), _) => credential.clone(),
            (None, Some(var)) => env(var).ok_or_else(|| {
                QuillonError::Configuration(format!(
                    "no credential for provider '{}': set service.credential or {var}",
                    s.provider
                ))
            })?,
            (None, None) => OLLAMA_PLACEHOLDER_CREDENTIAL.to_string(),
        };

        let mut config = ServiceConfig::new(s.provider, s.model.clone(), credential)
            .timeout(Duration::from_secs(s.timeout_secs))
            .max_retries(s.max_retries)
            .temperature(s.temperature)
            .max_tokens(s.max_tokens);
        if let Some(url) = &s.base_url {
            config = config.base_url(url.clone());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn breaker_config(&self) -> CircuitBreakerConfig {
        let b = &self.breaker;
        let expected = b
            .expected_response_time_ms
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(self.service.timeout_secs));
        CircuitBreakerConfig::new()
            .failure_threshold(b.failure_threshold)
            .recovery_timeout(Duration::from_secs(b.recovery_timeout_secs))
            .expected_response_time(expected)
            .monitoring_window(Duration::from_secs(b.monitoring_window_secs))
            .cancellation_counts_as_failure(b.cancellation_counts_as_failure)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .max_entries(self.cache.max_entries)
            .ttl(Duration::from_secs(self.cache.ttl_secs))
    }

    /// Built-in pricing with the `[pricing]` overrides applied.
    pub fn pricing_table(&self) -> Result<PricingTable> {
        PricingTable::default().with_overrides(self.pricing.clone())
    }

    /// A [`ClientBuilder`] preloaded with every section of these settings.
    pub fn client_builder(&self, provider: Arc<dyn ContentProvider>) -> Result<ClientBuilder> {
        Ok(ContentClient::builder(self.service_config()?, provider)
            .breaker(self.breaker_config())
            .cache(self.cache_config())
            .pricing(self.pricing_table()?)
            .batch_concurrency(self.batch.concurrency))
    }
}
