/*!
 * Field eligibility filtering.
 *
 * Decides, per field, whether translation should even be attempted. The
 * schema catalog verdict wins when the field is schema-addressable; the
 * pattern heuristics in `rules` cover everything else. Evaluation is pure
 * and request-local apart from the process-wide catalog cache.
 */

use anyhow::Result;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::request::ResourceContext;

pub mod rules;
pub mod schema;

pub use schema::{SchemaAction, SchemaCatalog};

/// Why a field was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Key or value is URL-shaped
    UrlField,
    /// Key or value is a technical identifier
    TechnicalField,
    /// Value is entirely template syntax
    TemplateSyntax,
    /// Value is a number, measurement, or color token
    NumericOrColor,
    /// Value is a configured brand literal
    BrandName,
    /// Schema catalog excluded the field
    SchemaFlagged,
    /// Value is empty or not a string
    EmptyOrNonText,
    /// Value carries no translatable text pattern
    PatternMismatch,
    /// Source and target locales are the same language
    SameLocale,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UrlField => write!(f, "url_field"),
            SkipReason::TechnicalField => write!(f, "technical_field"),
            SkipReason::TemplateSyntax => write!(f, "template_syntax"),
            SkipReason::NumericOrColor => write!(f, "numeric_or_color"),
            SkipReason::BrandName => write!(f, "brand_name"),
            SkipReason::SchemaFlagged => write!(f, "schema_flagged"),
            SkipReason::EmptyOrNonText => write!(f, "empty_or_non_text"),
            SkipReason::PatternMismatch => write!(f, "pattern_mismatch"),
            SkipReason::SameLocale => write!(f, "same_locale"),
        }
    }
}

/// Per-field eligibility decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityVerdict {
    /// Whether the field should be translated
    pub should_translate: bool,
    /// Skip reason when `should_translate` is false
    pub reason: Option<SkipReason>,
}

impl EligibilityVerdict {
    /// A translate verdict
    pub fn translate() -> Self {
        Self {
            should_translate: true,
            reason: None,
        }
    }

    /// A skip verdict with its reason
    pub fn skip(reason: SkipReason) -> Self {
        Self {
            should_translate: false,
            reason: Some(reason),
        }
    }
}

/// Field eligibility filter combining schema and pattern rules
#[derive(Debug, Clone, Default)]
pub struct EligibilityFilter {
    /// Optional schema catalog; absent means pattern-only evaluation
    catalog: Option<Arc<SchemaCatalog>>,
    /// Brand literals that must never be translated
    brand_words: Vec<String>,
    /// Soft cap on batch size before a warning is logged
    max_batch_fields: usize,
}

impl EligibilityFilter {
    /// Create a filter with pattern rules only
    pub fn new(brand_words: Vec<String>, max_batch_fields: usize) -> Self {
        Self {
            catalog: None,
            brand_words,
            max_batch_fields,
        }
    }

    /// Attach a schema catalog
    pub fn with_catalog(mut self, catalog: Arc<SchemaCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Evaluate one field
    pub fn evaluate(
        &self,
        field_key: &str,
        field_value: &Value,
        context: &ResourceContext,
    ) -> EligibilityVerdict {
        let value = match field_value {
            Value::String(s) if !s.trim().is_empty() => s.as_str(),
            _ => return EligibilityVerdict::skip(SkipReason::EmptyOrNonText),
        };

        let key = field_key.rsplit('.').next().unwrap_or(field_key);

        // Schema verdict wins over every pattern rule
        if let (Some(catalog), Some(section)) = (&self.catalog, &context.section_type) {
            match catalog.lookup(section, key) {
                Some(SchemaAction::ForceInclude) => return EligibilityVerdict::translate(),
                Some(SchemaAction::ForceExclude) => {
                    return EligibilityVerdict::skip(SkipReason::SchemaFlagged);
                }
                None => {}
            }
        }

        if rules::is_url_key(key) || rules::is_url_value(value) {
            return EligibilityVerdict::skip(SkipReason::UrlField);
        }

        if rules::is_technical_key(key) || rules::is_technical_value(value) {
            return EligibilityVerdict::skip(SkipReason::TechnicalField);
        }

        if rules::is_numeric_or_color(value) {
            return EligibilityVerdict::skip(SkipReason::NumericOrColor);
        }

        if rules::is_template_only(value) {
            return EligibilityVerdict::skip(SkipReason::TemplateSyntax);
        }

        if self.is_brand_word(value) {
            return EligibilityVerdict::skip(SkipReason::BrandName);
        }

        if !rules::has_letters(value) {
            return EligibilityVerdict::skip(SkipReason::PatternMismatch);
        }

        EligibilityVerdict::translate()
    }

    /// Evaluate many fields sharing one derived context
    ///
    /// The `derive` callback refines the base context per field; when it
    /// fails for one field that field degrades to an empty context and
    /// evaluation of its siblings continues. Batches over the configured
    /// cap are still fully processed, with a warning.
    pub fn evaluate_batch<F>(
        &self,
        fields: &[(String, Value)],
        derive: F,
    ) -> Vec<(String, EligibilityVerdict)>
    where
        F: Fn(&str) -> Result<ResourceContext>,
    {
        if self.max_batch_fields > 0 && fields.len() > self.max_batch_fields {
            warn!(
                "Eligibility batch of {} fields exceeds cap of {}; processing anyway",
                fields.len(),
                self.max_batch_fields
            );
        }

        fields
            .iter()
            .map(|(key, value)| {
                let context = match derive(key) {
                    Ok(context) => context,
                    Err(e) => {
                        warn!(
                            "Context derivation failed for field {}, degrading to empty context: {:#}",
                            key, e
                        );
                        ResourceContext::default()
                    }
                };
                let verdict = self.evaluate(key, value, &context);
                debug!("eligibility {} -> {:?}", key, verdict);
                (key.clone(), verdict)
            })
            .collect()
    }

    fn is_brand_word(&self, value: &str) -> bool {
        let value = value.trim();
        self.brand_words.iter().any(|b| b.eq_ignore_ascii_case(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use serde_json::json;

    fn filter() -> EligibilityFilter {
        EligibilityFilter::new(vec!["Acme".to_string()], 10)
    }

    #[test]
    fn test_evaluate_urlKey_shouldSkipRegardlessOfValue() {
        let verdict = filter().evaluate(
            "sections.hero.button_url",
            &json!("Click here"),
            &ResourceContext::default(),
        );

        assert!(!verdict.should_translate);
        assert_eq!(verdict.reason, Some(SkipReason::UrlField));
    }

    #[test]
    fn test_evaluate_nonString_shouldSkipAsNonText() {
        let ctx = ResourceContext::default();
        assert_eq!(
            filter().evaluate("title", &json!(42), &ctx).reason,
            Some(SkipReason::EmptyOrNonText)
        );
        assert_eq!(
            filter().evaluate("title", &json!(null), &ctx).reason,
            Some(SkipReason::EmptyOrNonText)
        );
        assert_eq!(
            filter().evaluate("title", &json!("   "), &ctx).reason,
            Some(SkipReason::EmptyOrNonText)
        );
    }

    #[test]
    fn test_evaluate_patternRules_shouldClassifyValues() {
        let ctx = ResourceContext::default();
        let f = filter();

        assert_eq!(
            f.evaluate("color", &json!("#ff0000"), &ctx).reason,
            Some(SkipReason::NumericOrColor)
        );
        assert_eq!(
            f.evaluate("caption", &json!("{{ product.title }}"), &ctx).reason,
            Some(SkipReason::TemplateSyntax)
        );
        assert_eq!(
            f.evaluate("product_id", &json!("gid-1234"), &ctx).reason,
            Some(SkipReason::TechnicalField)
        );
        assert_eq!(
            f.evaluate("vendor", &json!("acme"), &ctx).reason,
            Some(SkipReason::BrandName)
        );
        assert_eq!(
            f.evaluate("divider", &json!("***"), &ctx).reason,
            Some(SkipReason::PatternMismatch)
        );
        assert!(f.evaluate("heading", &json!("Welcome!"), &ctx).should_translate);
    }

    #[test]
    fn test_evaluate_schemaVerdict_shouldWinOverPatterns() {
        let catalog = Arc::new(SchemaCatalog::from_rules(vec![
            (
                "hero".to_string(),
                "badge_url".to_string(),
                SchemaAction::ForceInclude,
            ),
            (
                "hero".to_string(),
                "heading".to_string(),
                SchemaAction::ForceExclude,
            ),
        ]));
        let f = filter().with_catalog(catalog);
        let ctx = ResourceContext {
            section_type: Some("hero".to_string()),
            ..Default::default()
        };

        // Force-include beats the URL key rule
        let included = f.evaluate("badge_url", &json!("Shop now"), &ctx);
        assert!(included.should_translate);

        // Force-exclude beats plain-text eligibility
        let excluded = f.evaluate("heading", &json!("Welcome"), &ctx);
        assert_eq!(excluded.reason, Some(SkipReason::SchemaFlagged));
    }

    #[test]
    fn test_evaluate_withoutSectionType_shouldFallBackToPatterns() {
        let catalog = Arc::new(SchemaCatalog::from_rules(vec![(
            "hero".to_string(),
            "heading".to_string(),
            SchemaAction::ForceExclude,
        )]));
        let f = filter().with_catalog(catalog);

        let verdict = f.evaluate("heading", &json!("Welcome"), &ResourceContext::default());
        assert!(verdict.should_translate);
    }

    #[test]
    fn test_evaluateBatch_derivationFailure_shouldDegradeOnlyThatField() {
        let f = filter();
        let fields = vec![
            ("heading".to_string(), json!("Welcome")),
            ("broken".to_string(), json!("Still evaluated")),
            ("button_url".to_string(), json!("/collections/all")),
        ];

        let verdicts = f.evaluate_batch(&fields, |key| {
            if key == "broken" {
                Err(anyhow!("no section metadata"))
            } else {
                Ok(ResourceContext::default())
            }
        });

        assert_eq!(verdicts.len(), 3);
        assert!(verdicts[0].1.should_translate);
        assert!(verdicts[1].1.should_translate);
        assert_eq!(verdicts[2].1.reason, Some(SkipReason::UrlField));
    }

    #[test]
    fn test_evaluateBatch_oversized_shouldStillProcessAll() {
        let f = EligibilityFilter::new(vec![], 2);
        let fields: Vec<(String, Value)> = (0..5)
            .map(|i| (format!("field_{}", i), json!("Some words")))
            .collect();

        let verdicts = f.evaluate_batch(&fields, |_| Ok(ResourceContext::default()));
        assert_eq!(verdicts.len(), 5);
        assert!(verdicts.iter().all(|(_, v)| v.should_translate));
    }
}
