/*!
 * Pattern heuristics for field eligibility.
 *
 * These rules decide, from the field key and value alone, whether a value
 * is linguistic content worth sending to the provider. They are the
 * fallback layer; a schema catalog verdict always wins over them.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Absolute URLs, protocol-relative URLs, and mail/tel links
static URL_VALUE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:https?://|//|mailto:|tel:)\S+$").unwrap());

/// Root-relative store paths like /collections/all
static PATH_VALUE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/[\w\-./%?=&#]*$").unwrap());

/// Hex digests (md5 through sha256) and uuids
static CHECKSUM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[0-9a-f]{32}|[0-9a-f]{40}|[0-9a-f]{64}|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$").unwrap()
});

/// Lowercase-dash resource handles like "summer-collection-2024"
static HANDLE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)+$").unwrap());

/// Hex colors and css color functions
static COLOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:#[0-9a-f]{3,8}|rgba?\([\d\s.,%]+\)|hsla?\([\d\s.,%]+\))$").unwrap()
});

/// Bare numbers, optionally signed, optionally with a css unit
static NUMERIC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^-?\d+(?:\.\d+)?(?:px|em|rem|%|vw|vh|pt|s|ms)?$").unwrap());

/// Double-brace and percent-brace template expressions
static TEMPLATE_EXPR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{.*?\}\}|\{%.*?%\}").unwrap());

/// Key suffixes that mark URL-bearing fields
const URL_KEY_SUFFIXES: &[&str] = &["url", "link", "href"];

/// Exact keys and key suffixes that mark technical identifiers
const TECHNICAL_KEYS: &[&str] = &[
    "id", "handle", "sku", "barcode", "checksum", "digest", "hash", "uuid", "guid", "token",
    "api_key", "css_class", "class_name", "template", "liquid",
];

/// Whether the field key names a URL field
pub fn is_url_key(key: &str) -> bool {
    let key = key.to_lowercase();
    URL_KEY_SUFFIXES
        .iter()
        .any(|s| key == *s || key.ends_with(&format!("_{}", s)))
}

/// Whether the value itself is URL-shaped
pub fn is_url_value(value: &str) -> bool {
    let value = value.trim();
    URL_VALUE_REGEX.is_match(value) || PATH_VALUE_REGEX.is_match(value)
}

/// Whether the field key names a technical identifier
pub fn is_technical_key(key: &str) -> bool {
    let key = key.to_lowercase();
    TECHNICAL_KEYS
        .iter()
        .any(|s| key == *s || key.ends_with(&format!("_{}", s)))
}

/// Whether the value looks like a checksum, uuid, or resource handle
pub fn is_technical_value(value: &str) -> bool {
    let value = value.trim();
    CHECKSUM_REGEX.is_match(value) || HANDLE_REGEX.is_match(value)
}

/// Whether the value is a pure number, measurement, or color token
pub fn is_numeric_or_color(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && (COLOR_REGEX.is_match(value) || NUMERIC_REGEX.is_match(value))
}

/// Whether the value is entirely template syntax with no literal prose
pub fn is_template_only(value: &str) -> bool {
    if !TEMPLATE_EXPR_REGEX.is_match(value) {
        return false;
    }
    let stripped = TEMPLATE_EXPR_REGEX.replace_all(value, "");
    !stripped.chars().any(|c| c.is_alphabetic())
}

/// Whether the value contains any letters at all
pub fn has_letters(value: &str) -> bool {
    value.chars().any(|c| c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isUrlKey_shouldMatchSuffixes() {
        assert!(is_url_key("button_url"));
        assert!(is_url_key("URL"));
        assert!(is_url_key("social_link"));
        assert!(is_url_key("href"));
        assert!(!is_url_key("curl_instructions"));
        assert!(!is_url_key("heading"));
    }

    #[test]
    fn test_isUrlValue_shouldMatchSchemesAndPaths() {
        assert!(is_url_value("https://example.com/page"));
        assert!(is_url_value("//cdn.example.com/a.js"));
        assert!(is_url_value("mailto:help@example.com"));
        assert!(is_url_value("/collections/all"));
        assert!(!is_url_value("Visit https://example.com today"));
        assert!(!is_url_value("plain words"));
    }

    #[test]
    fn test_isTechnicalKey_shouldMatchIdsAndHandles() {
        assert!(is_technical_key("id"));
        assert!(is_technical_key("product_id"));
        assert!(is_technical_key("collection_handle"));
        assert!(is_technical_key("api_key"));
        assert!(!is_technical_key("title"));
        assert!(!is_technical_key("identity_statement"));
    }

    #[test]
    fn test_isTechnicalValue_shouldMatchDigestsAndHandles() {
        assert!(is_technical_value("d41d8cd98f00b204e9800998ecf8427e"));
        assert!(is_technical_value("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_technical_value("summer-collection-2024"));
        assert!(!is_technical_value("Summer Collection"));
        assert!(!is_technical_value("hello"));
    }

    #[test]
    fn test_isNumericOrColor_shouldMatchTokens() {
        assert!(is_numeric_or_color("#fff"));
        assert!(is_numeric_or_color("#A1B2C3"));
        assert!(is_numeric_or_color("rgb(255, 0, 0)"));
        assert!(is_numeric_or_color("rgba(0,0,0,0.5)"));
        assert!(is_numeric_or_color("42"));
        assert!(is_numeric_or_color("-3.5"));
        assert!(is_numeric_or_color("16px"));
        assert!(is_numeric_or_color("1.5rem"));
        assert!(!is_numeric_or_color("42 items"));
        assert!(!is_numeric_or_color("red"));
    }

    #[test]
    fn test_isTemplateOnly_shouldRequireNoLiteralProse() {
        assert!(is_template_only("{{ product.title }}"));
        assert!(is_template_only("{% if sale %}{{ price }}{% endif %}"));
        assert!(is_template_only("{{ a }} - {{ b }}"));
        assert!(!is_template_only("Price: {{ product.price }}"));
        assert!(!is_template_only("no templates here"));
    }
}
