/*!
 * Common test utilities for the shopglot test suite
 */

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

use shopglot::app_config::Config;
use shopglot::ledger::LedgerStore;
use shopglot::request::TranslationRequest;

static INIT_LOGGING: Once = Once::new();

/// Initializes logging once for the whole suite; RUST_LOG controls verbosity
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &PathBuf, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    std::fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Configuration used across the suite: fast retries, default thresholds
pub fn test_config() -> Config {
    init_logging();
    let mut config = Config::default();
    config.limits.retry_backoff_ms = 1;
    config.brand_words = vec!["Acme".to_string()];
    config
}

/// In-memory ledger seeded with one shop balance
pub async fn ledger_with_balance(shop_id: &str, credits: i64) -> LedgerStore {
    init_logging();
    let store = LedgerStore::new_in_memory(900).expect("Failed to create ledger");
    store
        .set_balance(shop_id, credits)
        .await
        .expect("Failed to seed balance");
    store
}

/// A field request against the given shop, en -> fr
pub fn field_request(shop_id: &str, field_path: &str, text: &str) -> TranslationRequest {
    TranslationRequest::new(shop_id, field_path, text, "en", "fr")
}
