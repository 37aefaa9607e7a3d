/*!
 * Quality and completeness validation of translated output.
 *
 * The validator scores a translation against its source after token
 * restoration. It never blocks a result: the orchestrator consults the
 * verdict to decide on a single retry, then records remaining issues as
 * quality incidents.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::app_config::QualityConfig;
use crate::reporting::IncidentCategory;

/// HTML tag names, opening or closing
static TAG_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?([a-zA-Z][a-zA-Z0-9]*)\b").unwrap());

/// Liquid-style template placeholders
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{.*?\}\}|\{%.*?%\}").unwrap());

/// A single flagged defect in translated output
#[derive(Debug, Clone)]
pub struct QualityRecord {
    /// Issue classification
    pub category: IncidentCategory,
    /// Stable machine-readable code
    pub code: &'static str,
    /// Human-readable description
    pub message: String,
    /// 1 = cosmetic, 2 = degraded, 3 = broken
    pub severity: u8,
    /// Whether a retry could plausibly fix it
    pub retryable: bool,
    /// Structured details for audit
    pub context: HashMap<String, String>,
}

/// Outcome of assessing one translation
#[derive(Debug, Clone, Default)]
pub struct QualityVerdict {
    /// No record reached degraded severity
    pub is_valid: bool,
    /// All flagged issues, may be non-empty even when valid
    pub records: Vec<QualityRecord>,
}

impl QualityVerdict {
    /// A verdict with no issues
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            records: Vec::new(),
        }
    }

    /// Whether any flagged issue is worth a retry
    pub fn should_retry(&self) -> bool {
        !self.is_valid && self.records.iter().any(|r| r.retryable)
    }
}

/// Scores translated output against its source
pub struct QualityValidator {
    config: QualityConfig,
}

impl QualityValidator {
    /// Create a validator with the given thresholds
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Assess a restored translation against the original field value
    pub fn assess(&self, original: &str, translated: &str, target_locale: &str) -> QualityVerdict {
        if !self.config.enabled {
            return QualityVerdict::valid();
        }

        let mut records = Vec::new();

        self.check_emptiness(original, translated, target_locale, &mut records);
        self.check_length_ratio(original, translated, target_locale, &mut records);
        self.check_structural_markers(original, translated, target_locale, &mut records);
        self.check_untranslated_remnants(original, translated, target_locale, &mut records);
        self.check_duplication(original, translated, target_locale, &mut records);

        let is_valid = !records.iter().any(|r| r.severity >= 2);
        if !records.is_empty() {
            debug!(
                "quality assessment flagged {} issue(s), valid={}",
                records.len(),
                is_valid
            );
        }

        QualityVerdict { is_valid, records }
    }

    fn check_emptiness(
        &self,
        original: &str,
        translated: &str,
        target_locale: &str,
        records: &mut Vec<QualityRecord>,
    ) {
        if !original.trim().is_empty() && translated.trim().is_empty() {
            records.push(record(
                IncidentCategory::Completeness,
                "empty_output",
                "translation is empty for a non-empty source".to_string(),
                3,
                true,
                target_locale,
            ));
        }
    }

    /// Output markedly shorter than the source suggests truncation
    fn check_length_ratio(
        &self,
        original: &str,
        translated: &str,
        target_locale: &str,
        records: &mut Vec<QualityRecord>,
    ) {
        let original_len = original.chars().count();
        if original_len <= self.config.ratio_exempt_chars || translated.trim().is_empty() {
            return;
        }

        let ratio = translated.chars().count() as f64 / original_len as f64;
        if ratio < self.config.min_length_ratio {
            records.push(record(
                IncidentCategory::Quality,
                "length_ratio",
                format!(
                    "translation length ratio {:.2} below minimum {:.2}",
                    ratio, self.config.min_length_ratio
                ),
                2,
                true,
                target_locale,
            ));
        }
    }

    /// Tags and template placeholders in the source must survive
    fn check_structural_markers(
        &self,
        original: &str,
        translated: &str,
        target_locale: &str,
        records: &mut Vec<QualityRecord>,
    ) {
        let source_tags = tag_counts(original);
        let target_tags = tag_counts(translated);
        let missing: Vec<&str> = source_tags
            .iter()
            .filter(|(name, count)| target_tags.get(*name).copied().unwrap_or(0) < **count)
            .map(|(name, _)| name.as_str())
            .collect();

        if !missing.is_empty() {
            records.push(record(
                IncidentCategory::Completeness,
                "missing_markup",
                format!("tags lost in translation: {}", missing.join(", ")),
                3,
                true,
                target_locale,
            ));
        }

        let source_placeholders: HashSet<&str> = PLACEHOLDER_REGEX
            .find_iter(original)
            .map(|m| m.as_str())
            .collect();
        let lost: Vec<&str> = source_placeholders
            .into_iter()
            .filter(|p| !translated.contains(p))
            .collect();

        if !lost.is_empty() {
            records.push(record(
                IncidentCategory::Completeness,
                "missing_placeholder",
                format!("template placeholders lost: {}", lost.join(", ")),
                3,
                true,
                target_locale,
            ));
        }
    }

    /// Consecutive word runs shared verbatim with the source indicate
    /// untranslated fragments
    fn check_untranslated_remnants(
        &self,
        original: &str,
        translated: &str,
        target_locale: &str,
        records: &mut Vec<QualityRecord>,
    ) {
        let run = self.config.remnant_run_words;
        if run == 0 {
            return;
        }

        let source_words = prose_words(original);
        let target_words = prose_words(translated);
        if source_words.len() < run || target_words.len() < run {
            return;
        }

        let source_runs: HashSet<&[String]> = source_words.windows(run).collect();
        let remnant = target_words
            .windows(run)
            .find(|w| source_runs.contains(*w));

        if let Some(words) = remnant {
            records.push(record(
                IncidentCategory::Quality,
                "untranslated_remnant",
                format!("source-language fragment survived: \"{}\"", words.join(" ")),
                2,
                true,
                target_locale,
            ));
        }
    }

    /// Repeated consecutive sentences absent from the source point at
    /// degenerate model output
    fn check_duplication(
        &self,
        original: &str,
        translated: &str,
        target_locale: &str,
        records: &mut Vec<QualityRecord>,
    ) {
        if let Some(dup) = consecutive_duplicate(translated) {
            if consecutive_duplicate(original).as_deref() != Some(dup.as_str()) {
                records.push(record(
                    IncidentCategory::Validation,
                    "duplicated_content",
                    format!("repeated segment in output: \"{}\"", truncate(&dup, 60)),
                    1,
                    false,
                    target_locale,
                ));
            }
        }
    }
}

fn record(
    category: IncidentCategory,
    code: &'static str,
    message: String,
    severity: u8,
    retryable: bool,
    target_locale: &str,
) -> QualityRecord {
    let mut context = HashMap::new();
    context.insert("target_locale".to_string(), target_locale.to_string());
    QualityRecord {
        category,
        code,
        message,
        severity,
        retryable,
        context,
    }
}

fn tag_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for cap in TAG_NAME_REGEX.captures_iter(text) {
        *counts.entry(cap[1].to_lowercase()).or_insert(0) += 1;
    }
    counts
}

/// Lowercased alphabetic words, markup and placeholders stripped
fn prose_words(text: &str) -> Vec<String> {
    let without_placeholders = PLACEHOLDER_REGEX.replace_all(text, " ");
    without_placeholders
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| w.chars().count() > 1)
        .map(|w| w.to_lowercase())
        .collect()
}

/// First sentence that immediately repeats itself, if any
fn consecutive_duplicate(text: &str) -> Option<String> {
    let sentences: Vec<&str> = text
        .split(|c| c == '.' || c == '!' || c == '?' || c == '\n')
        .map(str::trim)
        .filter(|s| s.chars().filter(|c| c.is_alphabetic()).count() >= 10)
        .collect();

    sentences
        .windows(2)
        .find(|w| w[0].eq_ignore_ascii_case(w[1]))
        .map(|w| w[0].to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}
