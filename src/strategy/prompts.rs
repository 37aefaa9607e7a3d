/*!
 * Prompt templates for the translation strategies.
 *
 * Three builders map onto the strategy variants: a minimal prompt for
 * short standalone chunks, a context-enhanced prompt carrying section and
 * field hints, and a long-text prompt that keeps terminology stable across
 * sequential chunks. A simplified variant exists for the placeholder
 * corruption fallback retry.
 */

use crate::locales::display_name;
use crate::providers::PromptContext;
use crate::request::ResourceContext;

/// Shared instruction protecting placeholders and tokens
const PRESERVATION_RULES: &str = "Keep every {{ ... }} and {% ... %} template expression and every \
     [[TOK...]] placeholder exactly as written. Preserve all HTML tags, \
     attributes, line breaks, and whitespace. Only respond with the \
     translated text, without any explanations or notes.";

/// Builds prompt contexts for one field translation
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    /// Source language display name
    source: String,
    /// Target language display name
    target: String,
}

impl PromptBuilder {
    /// Create a builder for a locale pair
    pub fn new(source_locale: &str, target_locale: &str) -> Self {
        Self {
            source: display_name(source_locale),
            target: display_name(target_locale),
        }
    }

    /// Minimal prompt for a short standalone chunk
    pub fn simple(&self) -> PromptContext {
        PromptContext::new(format!(
            "You are a professional translator for e-commerce store content. \
             Translate the following text from {} to {}. {}",
            self.source, self.target, PRESERVATION_RULES
        ))
    }

    /// Context-enhanced prompt carrying section and field hints
    pub fn enhanced(&self, context: &ResourceContext) -> PromptContext {
        let mut hints = Vec::new();
        if let Some(section) = context.section_type.as_deref().filter(|s| !s.is_empty()) {
            hints.push(format!("a \"{}\" storefront section", section));
        }
        if let Some(field) = context.field_type.as_deref().filter(|s| !s.is_empty()) {
            hints.push(format!("a \"{}\" field", field));
        }

        let placement = if hints.is_empty() {
            String::new()
        } else {
            format!(" The text belongs to {}.", hints.join(" in "))
        };

        PromptContext::new(format!(
            "You are a professional translator for e-commerce store content. \
             Translate the following text from {} to {}.{} Match the tone and \
             terminology a shopper would expect in that placement. {}",
            self.source, self.target, placement, PRESERVATION_RULES
        ))
    }

    /// Long-text prompt for one chunk of a multi-chunk document
    pub fn long_text(&self, chunk_index: usize, chunk_total: usize) -> PromptContext {
        PromptContext::new(format!(
            "You are a professional translator for e-commerce store content. \
             You are translating part {} of {} of a longer document from {} to {}. \
             Keep terminology and tone consistent with the other parts. {}",
            chunk_index + 1,
            chunk_total,
            self.source,
            self.target,
            PRESERVATION_RULES
        ))
    }

    /// Simplified fallback prompt used after placeholder corruption
    pub fn simplified(&self) -> PromptContext {
        PromptContext::new(format!(
            "Translate this text to {}. Do not modify anything that looks like \
             a code placeholder. Respond with the translation only.",
            self.target
        ))
        .simplified()
    }
}
