/*!
 * Strategy executor driving provider calls.
 *
 * Each chunk is translated inside a bounded retry loop: transient provider
 * failures back off exponentially with jitter, placeholder corruption gets
 * exactly one simplified-prompt retry, and exhausted retries degrade to
 * the original chunk text. Provider-level failures never escape as errors;
 * the outcome is always success-typed.
 */

use log::{debug, warn};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::chunker::Chunk;
use crate::errors::ProviderError;
use crate::providers::{PromptContext, TranslationProvider};
use crate::request::ResourceContext;

use super::prompts::PromptBuilder;
use super::{FallbackKind, TranslationAttempt, TranslationStrategy, select_strategy};

/// Retry behavior for the executor
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Retry attempts per chunk for transient provider failures
    pub retry_count: u32,
    /// Base backoff in milliseconds, doubled per attempt
    pub retry_backoff_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_backoff_ms: 500,
        }
    }
}

/// Field-level result of strategy execution
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Reassembled (still masked) text for the whole field
    pub text: String,
    /// One record per chunk
    pub attempts: Vec<TranslationAttempt>,
    /// Field-level fallback classification
    pub fallback: FallbackKind,
    /// Whether the final text is the untranslated input
    pub is_original: bool,
}

/// Resolution of a single chunk inside the retry loop
enum ChunkResolution {
    /// Provider produced usable output
    Translated(String),
    /// Corruption persisted after the simplified retry
    PlaceholderFallback,
    /// Transient failures exhausted the retry budget
    ProviderExhausted(ProviderError),
}

/// Drives provider calls for one field's chunks
pub struct StrategyExecutor {
    provider: Arc<dyn TranslationProvider>,
    config: ExecutorConfig,
    brand_words: Vec<String>,
}

impl StrategyExecutor {
    /// Create an executor over a provider
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        config: ExecutorConfig,
        brand_words: Vec<String>,
    ) -> Self {
        Self {
            provider,
            config,
            brand_words,
        }
    }

    /// Translate all chunks of one field
    ///
    /// `source_text` is the original field value, used only for the
    /// brand-word short circuit. Chunks are masked text; `token_map` is
    /// consulted for corruption detection.
    pub async fn execute(
        &self,
        source_text: &str,
        chunks: &[Chunk],
        token_map: &HashMap<String, String>,
        source_locale: &str,
        target_locale: &str,
        context: &ResourceContext,
    ) -> ExecutionOutcome {
        if self.is_brand_word(source_text) {
            debug!("brand word detected, skipping translation");
            return ExecutionOutcome {
                text: chunks.iter().map(|c| c.text.as_str()).collect(),
                attempts: vec![TranslationAttempt {
                    strategy: TranslationStrategy::Simple,
                    success: true,
                    text: source_text.to_string(),
                    duration_ms: 0,
                    fallback: FallbackKind::BrandSkip,
                }],
                fallback: FallbackKind::BrandSkip,
                is_original: true,
            };
        }

        let strategy = select_strategy(chunks, context);
        let builder = PromptBuilder::new(source_locale, target_locale);
        let chunk_total = chunks.len();

        let mut attempts = Vec::with_capacity(chunk_total);
        let mut pieces = Vec::with_capacity(chunk_total);
        let mut field_fallback = FallbackKind::None;

        for chunk in chunks {
            let prompt = match strategy {
                TranslationStrategy::Simple => builder.simple(),
                TranslationStrategy::Enhanced => builder.enhanced(context),
                TranslationStrategy::LongText => builder.long_text(chunk.index, chunk_total),
            };

            let start = Instant::now();
            let resolution = self
                .translate_chunk(chunk, token_map, target_locale, prompt, &builder)
                .await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let attempt = match resolution {
                ChunkResolution::Translated(text) => TranslationAttempt {
                    strategy,
                    success: true,
                    text,
                    duration_ms,
                    fallback: FallbackKind::None,
                },
                ChunkResolution::PlaceholderFallback => {
                    field_fallback = FallbackKind::PlaceholderError;
                    TranslationAttempt {
                        strategy,
                        success: true,
                        text: chunk.text.clone(),
                        duration_ms,
                        fallback: FallbackKind::PlaceholderError,
                    }
                }
                ChunkResolution::ProviderExhausted(e) => {
                    warn!(
                        "chunk {} degraded to original text after retries: {}",
                        chunk.index, e
                    );
                    TranslationAttempt {
                        strategy,
                        success: false,
                        text: chunk.text.clone(),
                        duration_ms,
                        fallback: FallbackKind::None,
                    }
                }
            };

            pieces.push(attempt.text.clone());
            attempts.push(attempt);
        }

        let text: String = pieces.concat();
        let original: String = chunks.iter().map(|c| c.text.as_str()).collect();
        let is_original = text == original;

        ExecutionOutcome {
            text,
            attempts,
            fallback: field_fallback,
            is_original,
        }
    }

    /// Bounded retry loop for one chunk
    ///
    /// The loop is driven by an explicit resolution enum: transient errors
    /// consume the retry budget with backoff, corruption switches to the
    /// simplified prompt exactly once, and everything else resolves.
    async fn translate_chunk(
        &self,
        chunk: &Chunk,
        token_map: &HashMap<String, String>,
        target_locale: &str,
        prompt: PromptContext,
        builder: &PromptBuilder,
    ) -> ChunkResolution {
        let mut transient_attempts = 0u32;
        let mut current_prompt = prompt;
        let mut tried_simplified = false;

        loop {
            let result = self
                .provider
                .invoke(&chunk.text, target_locale, &current_prompt)
                .await;

            match result {
                Ok(response) => {
                    if is_token_echo(&chunk.text, &response, token_map) {
                        if tried_simplified {
                            return ChunkResolution::PlaceholderFallback;
                        }
                        debug!(
                            "placeholder corruption on chunk {}, retrying with simplified prompt",
                            chunk.index
                        );
                        tried_simplified = true;
                        current_prompt = builder.simplified();
                        continue;
                    }
                    return ChunkResolution::Translated(response);
                }
                Err(e) if e.is_transient() && transient_attempts < self.config.retry_count => {
                    transient_attempts += 1;
                    let delay = self.backoff_delay(transient_attempts);
                    debug!(
                        "transient provider failure on chunk {} (attempt {}), backing off {:?}: {}",
                        chunk.index, transient_attempts, delay, e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return ChunkResolution::ProviderExhausted(e),
            }
        }
    }

    /// Exponential backoff with jitter, capped at ten seconds
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self.config.retry_backoff_ms.max(1);
        let exp = base.saturating_mul(1u64 << (attempt - 1).min(16));
        let jitter = if base >= 2 {
            rand::rng().random_range(0..base / 2)
        } else {
            0
        };
        Duration::from_millis(exp.saturating_add(jitter).min(10_000))
    }

    fn is_brand_word(&self, value: &str) -> bool {
        let value = value.trim();
        self.brand_words.iter().any(|b| b.eq_ignore_ascii_case(value))
    }
}

/// Whether the provider echoed protected tokens instead of translating
///
/// Corruption means the response reduces to nothing but tokens and
/// whitespace while the chunk actually carried prose around its tokens.
fn is_token_echo(chunk_text: &str, response: &str, token_map: &HashMap<String, String>) -> bool {
    if token_map.is_empty() {
        return false;
    }

    let strip = |text: &str| {
        let mut remainder = text.to_string();
        for token in token_map.keys() {
            remainder = remainder.replace(token, "");
        }
        remainder.trim().to_string()
    };

    strip(response).is_empty() && !strip(chunk_text).is_empty()
}
