//! Per-model pricing used to cost each generation.
//!
//! Rates are USD per 1,000 tokens. The built-in table covers common
//! OpenAI, Gemini and Anthropic models; anything else is charged at the
//! default rate. Rates are data, not logic: override them from the
//! `[pricing]` section of the settings file or with
//! [`PricingTable::from_toml_str`], without touching code.
//!
//! ```rust
//! # use quillon::PricingTable;
//! let table = PricingTable::default().with_rate("my-finetune", 0.012);
//! assert!((table.calculate_cost(2_000, "gpt-4") - 0.06).abs() < 1e-12);
//! assert!((table.calculate_cost(1_000, "my-finetune") - 0.012).abs() < 1e-12);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{QuillonError, Result};

/// Rate applied to models missing from the table.
pub const DEFAULT_RATE_PER_1K: f64 = 0.002;

const BUILTIN_RATES: &[(&str, f64)] = &[
    ("gpt-4", 0.03),
    ("gpt-4-turbo", 0.01),
    ("gpt-4o", 0.005),
    ("gpt-3.5-turbo", 0.002),
    ("gemini-pro", 0.001),
    ("gemini-1.5-pro", 0.0035),
    ("gemini-1.5-flash", 0.000_35),
    ("claude-3-opus", 0.015),
    ("claude-3-sonnet", 0.003),
    ("claude-3-haiku", 0.000_25),
];

/// Partial pricing data layered over a [`PricingTable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingOverrides {
    #[serde(default)]
    pub default_rate: Option<f64>,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

/// Model → USD-per-1k-token rate table.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    rates: HashMap<String, f64>,
    default_rate: f64,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            rates: BUILTIN_RATES
                .iter()
                .map(|(model, rate)| ((*model).to_owned(), *rate))
                .collect(),
            default_rate: DEFAULT_RATE_PER_1K,
        }
    }
}

impl PricingTable {
    /// Table with the built-in rates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with no per-model rates; every model costs `default_rate`.
    pub fn flat(default_rate: f64) -> Self {
        Self {
            rates: HashMap::new(),
            default_rate,
        }
    }

    /// Set (or replace) the rate of one model.
    pub fn with_rate(mut self, model: impl Into<String>, rate_per_1k: f64) -> Self {
        self.rates.insert(model.into(), rate_per_1k);
        self
    }

    /// Set the rate for unknown models.
    pub fn with_default_rate(mut self, rate_per_1k: f64) -> Self {
        self.default_rate = rate_per_1k;
        self
    }

    /// Layer `overrides` on top of this table.
    ///
    /// Fails with `Configuration` on negative or non-finite rates.
    pub fn with_overrides(mut self, overrides: PricingOverrides) -> Result<Self> {
        if let Some(rate) = overrides.default_rate {
            check_rate("default_rate", rate)?;
            self.default_rate = rate;
        }
        for (model, rate) in overrides.rates {
            check_rate(&model, rate)?;
            self.rates.insert(model, rate);
        }
        Ok(self)
    }

    /// Built-in table overridden by a TOML document of the form
    /// `default_rate = ...` plus a `[rates]` table.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let overrides: PricingOverrides = toml::from_str(s)
            .map_err(|e| QuillonError::Configuration(format!("invalid pricing table: {e}")))?;
        Self::default().with_overrides(overrides)
    }

    /// Rate for `model`, falling back to the default rate.
    pub fn rate_for(&self, model: &str) -> f64 {
        self.rates.get(model).copied().unwrap_or(self.default_rate)
    }

    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }

    /// `tokens / 1000 * rate(model)`.
    pub fn calculate_cost(&self, tokens: u32, model: &str) -> f64 {
        f64::from(tokens) / 1000.0 * self.rate_for(model)
    }
}

fn check_rate(label: &str, rate: f64) -> Result<()> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(QuillonError::Configuration(format!(
            "rate for '{label}' must be a non-negative number, got {rate}"
        )))
    }
}
