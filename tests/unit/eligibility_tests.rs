/*!
 * Tests for field eligibility filtering
 */

use serde_json::json;
use std::sync::Arc;

use shopglot::eligibility::{EligibilityFilter, SchemaAction, SchemaCatalog, SkipReason};
use shopglot::request::ResourceContext;

fn filter() -> EligibilityFilter {
    EligibilityFilter::new(vec!["Acme".to_string()], 200)
}

fn context(section: &str) -> ResourceContext {
    ResourceContext {
        section_type: Some(section.to_string()),
        ..ResourceContext::default()
    }
}

/// Test URL-shaped keys are skipped regardless of value
#[test]
fn test_evaluate_urlKey_shouldSkipAnyValue() {
    let filter = filter();
    let ctx = ResourceContext::default();

    for value in [json!("/collections/all"), json!("Click here"), json!("x")] {
        let verdict = filter.evaluate("sections.hero.button_url", &value, &ctx);
        assert!(!verdict.should_translate);
        assert_eq!(verdict.reason, Some(SkipReason::UrlField));
    }
}

/// Test plain prose is translatable
#[test]
fn test_evaluate_proseValue_shouldTranslate() {
    let verdict = filter().evaluate(
        "heading",
        &json!("Welcome to our store"),
        &ResourceContext::default(),
    );

    assert!(verdict.should_translate);
    assert_eq!(verdict.reason, None);
}

/// Test technical values are skipped
#[test]
fn test_evaluate_technicalValues_shouldSkip() {
    let filter = filter();
    let ctx = ResourceContext::default();

    let handle = filter.evaluate("title", &json!("summer-sale-2026"), &ctx);
    assert_eq!(handle.reason, Some(SkipReason::TechnicalField));

    let color = filter.evaluate("accent", &json!("#ff8800"), &ctx);
    assert_eq!(color.reason, Some(SkipReason::NumericOrColor));

    let number = filter.evaluate("width", &json!("240px"), &ctx);
    assert_eq!(number.reason, Some(SkipReason::NumericOrColor));
}

/// Test template-only values are skipped, mixed prose is not
#[test]
fn test_evaluate_templateSyntax_shouldSkipOnlyPureTemplates() {
    let filter = filter();
    let ctx = ResourceContext::default();

    let pure = filter.evaluate("price", &json!("{{ product.price }}"), &ctx);
    assert_eq!(pure.reason, Some(SkipReason::TemplateSyntax));

    let mixed = filter.evaluate("price", &json!("Price: {{ product.price }} USD"), &ctx);
    assert!(mixed.should_translate);
}

/// Test brand words and empty values are skipped
#[test]
fn test_evaluate_brandAndEmpty_shouldSkip() {
    let filter = filter();
    let ctx = ResourceContext::default();

    let brand = filter.evaluate("vendor", &json!("acme"), &ctx);
    assert_eq!(brand.reason, Some(SkipReason::BrandName));

    let empty = filter.evaluate("note", &json!("   "), &ctx);
    assert_eq!(empty.reason, Some(SkipReason::EmptyOrNonText));

    let non_string = filter.evaluate("count", &json!(42), &ctx);
    assert_eq!(non_string.reason, Some(SkipReason::EmptyOrNonText));
}

/// Test schema verdict wins over pattern heuristics
#[test]
fn test_evaluate_schemaCatalog_shouldOverridePatterns() {
    let catalog = SchemaCatalog::from_rules(vec![
        (
            "hero".to_string(),
            "button_url".to_string(),
            SchemaAction::ForceInclude,
        ),
        (
            "hero".to_string(),
            "heading".to_string(),
            SchemaAction::ForceExclude,
        ),
    ]);
    let filter = filter().with_catalog(Arc::new(catalog));

    // URL-shaped key, but the schema forces it in
    let included = filter.evaluate("button_url", &json!("/x"), &context("hero"));
    assert!(included.should_translate);

    // Plain prose, but the schema forces it out
    let excluded = filter.evaluate("heading", &json!("Hello there"), &context("hero"));
    assert_eq!(excluded.reason, Some(SkipReason::SchemaFlagged));

    // Other sections fall back to patterns
    let other = filter.evaluate("button_url", &json!("/x"), &context("footer"));
    assert_eq!(other.reason, Some(SkipReason::UrlField));
}

/// Test batch evaluation degrades per field
#[test]
fn test_evaluateBatch_withFailingDerivation_shouldDegradeThatFieldOnly() {
    let filter = filter();
    let fields = vec![
        ("heading".to_string(), json!("Welcome friends")),
        ("broken".to_string(), json!("Also fine text")),
    ];

    let results = filter.evaluate_batch(&fields, |key| {
        if key == "broken" {
            anyhow::bail!("no context for this one")
        }
        Ok(ResourceContext::default())
    });

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(_, v)| v.should_translate));
}
