/*!
 * Tests for pipeline configuration functionality
 */

use shopglot::app_config::Config;

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_locale, "en");
    assert_eq!(config.limits.max_chunk_chars, 4000);
    assert_eq!(config.limits.max_batch_fields, 200);
    assert_eq!(config.limits.retry_count, 3);
    assert_eq!(config.limits.concurrent_requests, 4);
    assert_eq!(config.credits.chars_per_credit, 100);
    assert_eq!(config.credits.reservation_ttl_secs, 900);
    assert!(config.quality.enabled);
    assert!(config.brand_words.is_empty());
    assert!(config.schema_catalog_path.is_none());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Invalid source locale
    config.source_locale = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_locale = "en".to_string();

    // Chunk ceiling below the floor
    config.limits.max_chunk_chars = 50;
    assert!(config.validate().is_err());
    config.limits.max_chunk_chars = 4000;

    // Zero concurrency
    config.limits.concurrent_requests = 0;
    assert!(config.validate().is_err());
    config.limits.concurrent_requests = 4;

    // Degenerate credit model
    config.credits.chars_per_credit = 0;
    assert!(config.validate().is_err());
    config.credits.chars_per_credit = 100;

    config.credits.reservation_ttl_secs = 0;
    assert!(config.validate().is_err());
}

/// Test save and reload round trip
#[test]
fn test_config_saveAndLoad_shouldRoundTrip() {
    let dir = common::create_temp_dir().expect("Failed to create temp dir");
    let path = dir.path().join("config.json");

    let mut config = Config::default();
    config.brand_words = vec!["Acme".to_string(), "ShopGlot".to_string()];
    config.credits.chars_per_credit = 80;
    config.save_to_file(&path).expect("Failed to save config");

    let loaded = Config::from_file(&path).expect("Failed to load config");

    assert_eq!(loaded.brand_words, config.brand_words);
    assert_eq!(loaded.credits.chars_per_credit, 80);
    assert_eq!(loaded.source_locale, "en");
}

/// Test loading a partial file fills defaults
#[test]
fn test_config_fromPartialFile_shouldFillDefaults() {
    let dir = common::create_temp_dir().expect("Failed to create temp dir");
    let path = dir.path().to_path_buf();
    let file = common::create_test_file(
        &path,
        "partial.json",
        r#"{"source_locale": "de", "provider": {"model": "gpt-4o-mini"}}"#,
    )
    .expect("Failed to write config");

    let loaded = Config::from_file(&file).expect("Failed to load config");

    assert_eq!(loaded.source_locale, "de");
    assert_eq!(loaded.provider.model, "gpt-4o-mini");
    assert_eq!(loaded.limits.max_chunk_chars, 4000);
    assert_eq!(loaded.credits.chars_per_credit, 100);
}

/// Test credit estimation
#[test]
fn test_creditEstimate_withVariousLengths_shouldRoundUp() {
    let config = Config::default();

    assert_eq!(config.credits.estimate(""), 0);
    assert_eq!(config.credits.estimate("x"), 1);
    assert_eq!(config.credits.estimate(&"a".repeat(100)), 1);
    assert_eq!(config.credits.estimate(&"a".repeat(101)), 2);
    assert_eq!(config.credits.estimate(&"a".repeat(250)), 3);
}
