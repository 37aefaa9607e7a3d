/*!
 * Translation strategy selection and execution.
 *
 * The selector picks one of three strategies per field: SIMPLE for a short
 * standalone chunk, ENHANCED when the resource context is worth feeding
 * into the prompt, and LONG_TEXT for multi-chunk documents translated
 * sequentially with shared terminology context. The executor in
 * `executor` drives the provider calls with bounded retries and the
 * placeholder-corruption fallback.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chunker::Chunk;
use crate::request::ResourceContext;

pub mod executor;
pub mod prompts;

pub use executor::{ExecutionOutcome, ExecutorConfig, StrategyExecutor};
pub use prompts::PromptBuilder;

/// Translation strategy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStrategy {
    /// Minimal prompt, lowest latency
    Simple,
    /// Richer prompt built from the resource context
    Enhanced,
    /// Sequential per-chunk translation with shared terminology context
    LongText,
}

impl fmt::Display for TranslationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationStrategy::Simple => write!(f, "simple"),
            TranslationStrategy::Enhanced => write!(f, "enhanced"),
            TranslationStrategy::LongText => write!(f, "long_text"),
        }
    }
}

/// How a translation attempt fell back, if it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    /// No fallback; the attempt translated normally
    #[default]
    None,
    /// Provider echoed a protected token; original text was returned
    PlaceholderError,
    /// Field value is a brand word; translation was skipped
    BrandSkip,
}

impl fmt::Display for FallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackKind::None => write!(f, "none"),
            FallbackKind::PlaceholderError => write!(f, "placeholder_error"),
            FallbackKind::BrandSkip => write!(f, "brand_skip"),
        }
    }
}

/// Record of one chunk-level translation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationAttempt {
    /// Strategy that drove the attempt
    pub strategy: TranslationStrategy,
    /// Whether the provider produced usable output
    pub success: bool,
    /// Final text for the chunk (original text on fallback)
    pub text: String,
    /// Wall-clock duration of the attempt
    pub duration_ms: u64,
    /// Fallback classification
    pub fallback: FallbackKind,
}

/// Pick a strategy for a chunked field
pub fn select_strategy(chunks: &[Chunk], context: &ResourceContext) -> TranslationStrategy {
    if chunks.len() > 1 {
        TranslationStrategy::LongText
    } else if context.is_meaningful() {
        TranslationStrategy::Enhanced
    } else {
        TranslationStrategy::Simple
    }
}
