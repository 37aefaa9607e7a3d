/*!
 * Field-level translation request model.
 *
 * A `TranslationRequest` is immutable once created and lives for the
 * duration of one pipeline run. The surrounding resource is described by a
 * fixed-shape `ResourceContext` rather than an open map.
 */

use serde::{Deserialize, Serialize};

/// Context about the resource a field belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceContext {
    /// Theme section type, e.g. "hero" or "featured-collection"
    #[serde(default)]
    pub section_type: Option<String>,

    /// Field type hint, e.g. "richtext" or "inline_richtext"
    #[serde(default)]
    pub field_type: Option<String>,

    /// Identifier of the owning resource, for usage records
    #[serde(default)]
    pub resource_id: Option<String>,

    /// Kind of the owning resource, e.g. "product" or "theme_setting"
    #[serde(default)]
    pub resource_type: Option<String>,
}

impl ResourceContext {
    /// Whether the context carries anything worth feeding into a prompt
    pub fn is_meaningful(&self) -> bool {
        self.section_type.as_deref().is_some_and(|s| !s.is_empty())
            || self.field_type.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// One field-level translation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    /// Shop whose quota backs this request
    pub shop_id: String,

    /// Dotted path of the field, e.g. "sections.hero.heading"
    pub field_path: String,

    /// Source text to translate
    pub source_text: String,

    /// Locale of the source text
    pub source_locale: String,

    /// Locale to translate into
    pub target_locale: String,

    /// Context about the owning resource
    #[serde(default)]
    pub resource_context: ResourceContext,

    /// Who asked for this translation (user id, job id)
    #[serde(default)]
    pub requested_by: Option<String>,
}

impl TranslationRequest {
    /// Create a request with an empty resource context
    pub fn new(
        shop_id: impl Into<String>,
        field_path: impl Into<String>,
        source_text: impl Into<String>,
        source_locale: impl Into<String>,
        target_locale: impl Into<String>,
    ) -> Self {
        Self {
            shop_id: shop_id.into(),
            field_path: field_path.into(),
            source_text: source_text.into(),
            source_locale: source_locale.into(),
            target_locale: target_locale.into(),
            resource_context: ResourceContext::default(),
            requested_by: None,
        }
    }

    /// Attach a resource context
    pub fn with_context(mut self, context: ResourceContext) -> Self {
        self.resource_context = context;
        self
    }

    /// Last segment of the field path, used for key-based eligibility rules
    pub fn field_key(&self) -> &str {
        self.field_path.rsplit('.').next().unwrap_or(&self.field_path)
    }
}
