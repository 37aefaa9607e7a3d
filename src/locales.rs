/*!
 * Locale code utilities.
 *
 * Shop locales arrive as BCP 47-ish tags ("en", "fr", "pt-BR", "zh-CN").
 * This module validates and normalizes the language part against ISO 639
 * and exposes display names for prompt construction.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// Extract the primary language subtag from a locale tag
///
/// "pt-BR" -> "pt", "zh_CN" -> "zh", "en" -> "en".
pub fn language_subtag(locale: &str) -> String {
    locale
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Validate that a locale tag carries a real ISO 639-1 or 639-3 language
pub fn validate_locale(locale: &str) -> Result<()> {
    let subtag = language_subtag(locale);

    let known = match subtag.len() {
        2 => Language::from_639_1(&subtag).is_some(),
        3 => Language::from_639_3(&subtag).is_some(),
        _ => false,
    };

    if known {
        Ok(())
    } else {
        Err(anyhow!("Invalid locale: {}", locale))
    }
}

/// Whether two locale tags refer to the same language
///
/// Region subtags are ignored: "pt" matches "pt-BR".
pub fn locales_match(a: &str, b: &str) -> bool {
    let a = language_subtag(a);
    let b = language_subtag(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    resolve(&a)
        .zip(resolve(&b))
        .map(|(la, lb)| la == lb)
        .unwrap_or(a == b)
}

/// English display name for a locale ("fr" -> "French")
///
/// Falls back to the raw tag when the language is unknown, so prompt
/// construction never fails on an exotic locale.
pub fn display_name(locale: &str) -> String {
    let subtag = language_subtag(locale);
    resolve(&subtag)
        .map(|lang| lang.to_name().to_string())
        .unwrap_or_else(|| locale.trim().to_string())
}

fn resolve(subtag: &str) -> Option<Language> {
    match subtag.len() {
        2 => Language::from_639_1(subtag),
        3 => Language::from_639_3(subtag),
        _ => None,
    }
}
