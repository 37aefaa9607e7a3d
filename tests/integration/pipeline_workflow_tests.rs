/*!
 * End-to-end field translation tests
 *
 * These run the full pipeline against mock providers: eligibility,
 * protection, chunking, execution, validation, restoration, and ledger
 * confirmation.
 */

use std::sync::Arc;

use shopglot::eligibility::SkipReason;
use shopglot::pipeline::TranslationPipeline;
use shopglot::providers::mock::MockProvider;
use shopglot::reporting::CollectingReporter;
use shopglot::strategy::FallbackKind;

use crate::common;

async fn pipeline(
    provider: MockProvider,
    balance: i64,
) -> (
    TranslationPipeline,
    shopglot::ledger::LedgerStore,
    Arc<CollectingReporter>,
) {
    let ledger = common::ledger_with_balance("shop-1", balance).await;
    let reporter = CollectingReporter::shared();
    let pipeline = TranslationPipeline::new(
        common::test_config(),
        Arc::new(provider),
        ledger.clone(),
        reporter.clone(),
    );
    (pipeline, ledger, reporter)
}

/// Test a full translation with embedded script markup
#[tokio::test]
async fn test_translateField_withScriptMarkup_shouldPreserveScriptVerbatim() {
    let (pipeline, ledger, _) = pipeline(MockProvider::working(), 100).await;
    let source = "<p>Welcome to our store</p><script>trackVisit();</script>";
    let request = common::field_request("shop-1", "sections.hero.content", source);

    let result = pipeline.translate_field(&request).await;

    assert!(result.success);
    assert!(!result.is_original);
    // The script block survived untranslated, byte for byte
    assert!(result.text.contains("<script>trackVisit();</script>"));
    // The prose went through the provider
    assert!(result.text.starts_with("[fr] "));
    // No protection token leaked into the output
    assert!(!result.text.contains("[[TOK"));
    assert!(result.credits_used > 0);
    assert!(ledger.balance("shop-1").await.unwrap() < 100);
}

/// Test template placeholders survive translation untouched
#[tokio::test]
async fn test_translateField_withLiquidPlaceholder_shouldPreservePlaceholder() {
    let (pipeline, _, _) = pipeline(MockProvider::working(), 100).await;
    let request = common::field_request(
        "shop-1",
        "product.price_note",
        "Price: {{ product.price }} USD",
    );

    let result = pipeline.translate_field(&request).await;

    assert!(result.success);
    assert!(result.text.contains("{{ product.price }}"));
}

/// Test a token-echoing provider degrades to the original text
#[tokio::test]
async fn test_translateField_withTokenEcho_shouldFallBackToSource() {
    let (pipeline, _, reporter) = pipeline(MockProvider::echo_token(), 100).await;
    let source = "Grab yours today!<style>.sale { color: red; }</style>";
    let request = common::field_request("shop-1", "sections.banner.text", source);

    let result = pipeline.translate_field(&request).await;

    assert!(result.success);
    assert!(result.is_original);
    assert_eq!(result.text, source);
    assert_eq!(result.fallback, FallbackKind::PlaceholderError);
    assert_eq!(reporter.with_code("placeholder_corruption").len(), 1);
}

/// Test ineligible fields never reach the provider or the ledger
#[tokio::test]
async fn test_translateField_withUrlField_shouldSkipEverything() {
    let provider = MockProvider::working();
    let counter = provider.call_counter();
    let (pipeline, ledger, _) = pipeline(provider, 100).await;
    let request = common::field_request("shop-1", "sections.hero.button_url", "/collections/all");

    let result = pipeline.translate_field(&request).await;

    assert!(result.success);
    assert_eq!(result.skip_reason, Some(SkipReason::UrlField));
    assert_eq!(result.credits_used, 0);
    assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(ledger.available_credits("shop-1").await.unwrap(), 100);
}

/// Test a long document chunks, translates, and reassembles in order
#[tokio::test]
async fn test_translateField_withLongText_shouldChunkAndReassemble() {
    let mut config = common::test_config();
    config.limits.max_chunk_chars = 120;
    let ledger = common::ledger_with_balance("shop-1", 100).await;
    let pipeline = TranslationPipeline::new(
        config,
        Arc::new(MockProvider::working()),
        ledger.clone(),
        CollectingReporter::shared(),
    );

    let source = "The first paragraph describes our materials in detail. \
                  The second paragraph covers sizing and fit guidance. \
                  The third paragraph explains our return policy terms. \
                  The fourth paragraph lists care instructions for wool.";
    let request = common::field_request("shop-1", "product.description", source);

    let result = pipeline.translate_field(&request).await;

    assert!(result.success);
    // Each chunk got the pseudo-translation prefix, so more than one
    // prefix proves multi-chunk execution
    assert!(result.text.matches("[fr] ").count() > 1);
    // Order preserved across reassembly
    let first = result.text.find("first paragraph").unwrap();
    let fourth = result.text.find("fourth paragraph").unwrap();
    assert!(first < fourth);
}

/// Test batch results come back in request order with per-request admission
#[tokio::test]
async fn test_translateFields_batch_shouldKeepOrderAndAdmitPerRequest() {
    let (pipeline, _, _) = pipeline(MockProvider::working(), 2).await;
    let requests = vec![
        common::field_request("shop-1", "product.title", "Wool sweater"),
        common::field_request("shop-1", "product.subtitle", "Hand knitted"),
        common::field_request("shop-1", "product.badge", "Limited edition"),
    ];

    let results = pipeline.translate_fields(requests).await;

    assert_eq!(results.len(), 3);
    // Results stay aligned with their requests
    for (result, word) in results.iter().zip(["Wool", "Hand", "Limited"]) {
        assert!(result.text.contains(word));
    }
    // A balance of 2 admits exactly two one-credit fields
    let admitted = results.iter().filter(|r| r.success).count();
    assert_eq!(admitted, 2);
    let rejected: Vec<_> = results.iter().filter(|r| !r.success).collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].failure.as_deref(), Some("insufficient_credits"));
}

/// Test provider outage returns originals without touching the balance
#[tokio::test]
async fn test_translateFields_providerOutage_shouldChargeNothing() {
    let (pipeline, ledger, _) = pipeline(MockProvider::failing(), 100).await;
    let requests = vec![
        common::field_request("shop-1", "product.title", "A perfectly fine title"),
        common::field_request("shop-1", "product.body", "A perfectly fine body"),
    ];

    let results = pipeline.translate_fields(requests).await;

    assert!(results.iter().all(|r| r.success && r.is_original));
    assert!(results.iter().all(|r| r.credits_used == 0));
    assert_eq!(ledger.balance("shop-1").await.unwrap(), 100);
    assert_eq!(ledger.available_credits("shop-1").await.unwrap(), 100);
}
