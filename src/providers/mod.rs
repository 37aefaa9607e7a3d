/*!
 * Translation provider implementations.
 *
 * This module contains the provider seam the strategy executor drives:
 * - `TranslationProvider`: common async trait for all providers
 * - `http`: JSON-over-HTTP client for remote completion APIs
 * - `mock`: configurable mock provider for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Prompt material accompanying one provider call
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// System prompt guiding the translation
    pub system: String,
    /// Whether this is the simplified fallback prompt
    pub simplified: bool,
}

impl PromptContext {
    /// Create a prompt context from a system prompt
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            simplified: false,
        }
    }

    /// Mark this context as the simplified fallback variant
    pub fn simplified(mut self) -> Self {
        self.simplified = true;
        self
    }
}

/// Common trait for all translation providers
///
/// The provider is a black box `text, target locale -> text`; it is assumed
/// to be a remote call with variable latency and occasionally garbled
/// output. Everything above this seam treats it interchangeably.
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Translate one piece of text into the target locale
    async fn invoke(
        &self,
        text: &str,
        target_locale: &str,
        prompt: &PromptContext,
    ) -> Result<String, ProviderError>;
}

pub mod http;
pub mod mock;
