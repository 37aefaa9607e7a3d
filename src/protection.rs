/*!
 * Markup protection for translatable text.
 *
 * Before text leaves for the provider, non-linguistic fragments are masked
 * behind unique placeholder tokens: script and style blocks, HTML comments,
 * and self-closing media elements with their attributes. Double-brace and
 * percent-brace template placeholders are deliberately left inline; they
 * contain no translatable prose and survive translation as literal
 * substrings.
 *
 * The mask round-trips byte-for-byte: `restore(protect(x).text, &map) == x`.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use uuid::Uuid;

/// Fragments that must never reach the translation provider
///
/// One alternation so masking is a single left-to-right pass and token
/// ordinals follow document order.
static MASKABLE_FRAGMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<!--.*?-->|<(?:img|source|embed|track)\b[^>]*/?>",
    )
    .unwrap()
});

/// Text with masked fragments and the map needed to restore them
///
/// Owned exclusively by one pipeline run; never shared across requests.
#[derive(Debug, Clone, Default)]
pub struct MaskedText {
    /// The visible text with tokens in place of masked fragments
    pub text: String,
    /// Token -> original fragment
    pub token_map: HashMap<String, String>,
}

impl MaskedText {
    /// Whether any fragment was masked
    pub fn has_tokens(&self) -> bool {
        !self.token_map.is_empty()
    }
}

/// Markup protector that masks and restores non-linguistic fragments
#[derive(Debug, Default)]
pub struct MarkupProtector;

impl MarkupProtector {
    /// Mask non-linguistic fragments behind unique tokens
    ///
    /// When no maskable content exists the input is returned unchanged with
    /// an empty token map.
    pub fn protect(text: &str) -> MaskedText {
        if !MASKABLE_FRAGMENT_REGEX.is_match(text) {
            return MaskedText {
                text: text.to_string(),
                token_map: HashMap::new(),
            };
        }

        let prefix = token_prefix(text);
        let mut token_map = HashMap::new();
        let mut ordinal = 0usize;

        let masked = MASKABLE_FRAGMENT_REGEX
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let token = format!("{}x{}]]", prefix, ordinal);
                ordinal += 1;
                token_map.insert(token.clone(), caps[0].to_string());
                token
            })
            .into_owned();

        MaskedText {
            text: masked,
            token_map,
        }
    }

    /// Replace tokens with their original fragments
    ///
    /// Token keys are unique so replacement order does not matter. With an
    /// empty map this is a no-op, which makes restoring already-restored
    /// text safe.
    pub fn restore(text: &str, token_map: &HashMap<String, String>) -> String {
        let mut result = text.to_string();
        for (token, fragment) in token_map {
            result = result.replace(token, fragment);
        }
        result
    }
}

/// Unique token prefix for one protection pass
///
/// Tokens look like `[[TOKa1b2c3d4x0]]`: no whitespace, no sentence
/// punctuation, no tag characters, so chunk boundary scans can never land
/// inside one. The nonce is re-rolled in the unlikely case the input
/// already contains it.
fn token_prefix(input: &str) -> String {
    loop {
        let nonce = Uuid::new_v4().simple().to_string();
        let prefix = format!("[[TOK{}", &nonce[..8]);
        if !input.contains(&prefix) {
            return prefix;
        }
    }
}
