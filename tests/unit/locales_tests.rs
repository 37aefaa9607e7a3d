/*!
 * Tests for locale utilities
 */

use shopglot::locales::{display_name, language_subtag, locales_match, validate_locale};

/// Test subtag extraction from region-qualified locales
#[test]
fn test_languageSubtag_withRegionQualifiers_shouldStripRegion() {
    assert_eq!(language_subtag("en"), "en");
    assert_eq!(language_subtag("en-US"), "en");
    assert_eq!(language_subtag("pt_BR"), "pt");
    assert_eq!(language_subtag("  fr-CA  "), "fr");
}

/// Test validation of known and unknown codes
#[test]
fn test_validateLocale_withVariousCodes_shouldAcceptOnlyKnown() {
    assert!(validate_locale("en").is_ok());
    assert!(validate_locale("fr-FR").is_ok());
    assert!(validate_locale("deu").is_ok());

    assert!(validate_locale("xx").is_err());
    assert!(validate_locale("").is_err());
    assert!(validate_locale("123").is_err());
}

/// Test locale matching across code forms
#[test]
fn test_localesMatch_withEquivalentCodes_shouldMatch() {
    assert!(locales_match("en", "en-US"));
    assert!(locales_match("pt_BR", "pt-PT"));
    assert!(!locales_match("en", "fr"));
    assert!(!locales_match("", "en"));
}

/// Test display names used in prompts
#[test]
fn test_displayName_withKnownCode_shouldReturnEnglishName() {
    assert_eq!(display_name("en"), "English");
    assert_eq!(display_name("fr-CA"), "French");
    // Unknown codes fall back to the input
    assert_eq!(display_name("zz"), "zz");
}
