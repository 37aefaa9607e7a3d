use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::locales::validate_locale;

/// Application configuration module
/// This module handles the pipeline configuration including loading,
/// validating and saving configuration settings.
/// Represents the pipeline configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default source locale for the shop
    pub source_locale: String,

    /// Provider config
    pub provider: ProviderConfig,

    /// Sizing and retry limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Credit accounting config
    #[serde(default)]
    pub credits: CreditConfig,

    /// Quality validation config
    #[serde(default)]
    pub quality: QualityConfig,

    /// Brand words that must never be translated (exact field values)
    #[serde(default)]
    pub brand_words: Vec<String>,

    /// Optional path to the eligibility schema catalog (JSON)
    #[serde(default)]
    pub schema_catalog_path: Option<String>,
}

/// Provider connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Model name
    #[serde(default = "String::new")]
    pub model: String,

    /// API key
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            api_key: String::new(),
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

/// Sizing and retry limits for the pipeline
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Practical size ceiling for a single provider call, in characters
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,

    /// Maximum fields accepted per eligibility batch before a warning
    #[serde(default = "default_max_batch_fields")]
    pub max_batch_fields: usize,

    /// Per-chunk retry attempts for transient provider failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled per attempt
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Maximum concurrent field translations in a batch
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            max_batch_fields: default_max_batch_fields(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            concurrent_requests: default_concurrent_requests(),
        }
    }
}

/// Credit accounting configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreditConfig {
    /// Source characters covered by one credit
    #[serde(default = "default_chars_per_credit")]
    pub chars_per_credit: usize,

    /// Seconds a pending reservation may live before expiry reclaim
    #[serde(default = "default_reservation_ttl_secs")]
    pub reservation_ttl_secs: i64,
}

impl Default for CreditConfig {
    fn default() -> Self {
        Self {
            chars_per_credit: default_chars_per_credit(),
            reservation_ttl_secs: default_reservation_ttl_secs(),
        }
    }
}

impl CreditConfig {
    /// Estimate the credit cost of a piece of source text
    ///
    /// Non-empty text always costs at least one credit.
    pub fn estimate(&self, text: &str) -> i64 {
        let chars = text.chars().count();
        if chars == 0 {
            return 0;
        }
        let per = self.chars_per_credit.max(1);
        (chars.div_ceil(per)) as i64
    }
}

/// Quality validation thresholds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QualityConfig {
    /// Whether quality validation runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum acceptable translated/original length ratio
    #[serde(default = "default_min_length_ratio")]
    pub min_length_ratio: f64,

    /// Originals shorter than this are exempt from the ratio check
    #[serde(default = "default_ratio_exempt_chars")]
    pub ratio_exempt_chars: usize,

    /// Consecutive identical words shared with the source that count
    /// as an untranslated remnant
    #[serde(default = "default_remnant_run_words")]
    pub remnant_run_words: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_length_ratio: default_min_length_ratio(),
            ratio_exempt_chars: default_ratio_exempt_chars(),
            remnant_run_words: default_remnant_run_words(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_chunk_chars() -> usize {
    4000
}

fn default_max_batch_fields() -> usize {
    200
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_chars_per_credit() -> usize {
    100
}

fn default_reservation_ttl_secs() -> i64 {
    900
}

fn default_min_length_ratio() -> f64 {
    0.3
}

fn default_ratio_exempt_chars() -> usize {
    20
}

fn default_remnant_run_words() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_locale: "en".to_string(),
            provider: ProviderConfig::default(),
            limits: LimitsConfig::default(),
            credits: CreditConfig::default(),
            quality: QualityConfig::default(),
            brand_words: Vec::new(),
            schema_catalog_path: None,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }

    /// Validate the configuration values
    pub fn validate(&self) -> Result<()> {
        validate_locale(&self.source_locale)
            .with_context(|| format!("Invalid source locale: {}", self.source_locale))?;

        if self.limits.max_chunk_chars < 100 {
            return Err(anyhow!(
                "max_chunk_chars must be at least 100, got {}",
                self.limits.max_chunk_chars
            ));
        }

        if self.limits.concurrent_requests == 0 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }

        if self.credits.chars_per_credit == 0 {
            return Err(anyhow!("chars_per_credit must be at least 1"));
        }

        if self.credits.reservation_ttl_secs <= 0 {
            return Err(anyhow!("reservation_ttl_secs must be positive"));
        }

        if self.quality.min_length_ratio <= 0.0 || self.quality.min_length_ratio >= 1.0 {
            return Err(anyhow!(
                "min_length_ratio must be between 0 and 1, got {}",
                self.quality.min_length_ratio
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shouldValidate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_shouldRejectBadLocale() {
        let config = Config {
            source_locale: "nonsense".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_shouldRejectTinyChunkCeiling() {
        let mut config = Config::default();
        config.limits.max_chunk_chars = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_creditEstimate_shouldRoundUpAndFloorAtOne() {
        let credits = CreditConfig {
            chars_per_credit: 100,
            ..Default::default()
        };
        assert_eq!(credits.estimate(""), 0);
        assert_eq!(credits.estimate("a"), 1);
        assert_eq!(credits.estimate(&"x".repeat(100)), 1);
        assert_eq!(credits.estimate(&"x".repeat(101)), 2);
    }

    #[test]
    fn test_fromFile_shouldRoundTrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.brand_words.push("Acme".to_string());
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.brand_words, vec!["Acme".to_string()]);
        assert_eq!(loaded.limits.max_chunk_chars, config.limits.max_chunk_chars);
    }
}
