/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds with pseudo-translated text
 * - `MockProvider::echo_token()` - Echoes a protected token back (placeholder corruption)
 * - `MockProvider::failing()` - Always fails with a transient error
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{PromptContext, TranslationProvider};

/// Protection token shape, for simulating placeholder corruption
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[TOK[0-9a-f]{8}x\d+\]\]").unwrap());

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a pseudo-translation prefixed by the locale
    Working,
    /// Returns the input unchanged, as a lazy model would
    Identity,
    /// Echoes a protected token from the input instead of translating
    EchoToken,
    /// Fails intermittently (every Nth request)
    Intermittent {
        /// Fail when the call count is a multiple of this
        fail_every: usize,
    },
    /// Always fails with a transient error
    Failing,
    /// Returns an empty response
    Empty,
    /// Simulates slow responses (for timeout and cancellation testing)
    Slow {
        /// Delay before responding
        delay_ms: u64,
    },
}

/// Mock provider for testing executor and pipeline behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Number of invocations so far
    call_count: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that returns input unchanged
    pub fn identity() -> Self {
        Self::new(MockBehavior::Identity)
    }

    /// Create a mock that echoes protected tokens back
    pub fn echo_token() -> Self {
        Self::new(MockBehavior::EchoToken)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a slow mock provider
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Number of invoke calls made so far
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Shared handle to the call counter
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.call_count.clone()
    }

    /// Deterministic pseudo-translation used by the Working behavior
    pub fn pseudo_translate(text: &str, target_locale: &str) -> String {
        format!("[{}] {}", target_locale, text)
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn invoke(
        &self,
        text: &str,
        target_locale: &str,
        _prompt: &PromptContext,
    ) -> Result<String, ProviderError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;

        match self.behavior {
            MockBehavior::Working => Ok(Self::pseudo_translate(text, target_locale)),
            MockBehavior::Identity => Ok(text.to_string()),
            MockBehavior::EchoToken => {
                let echoed = TOKEN_REGEX
                    .find(text)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_else(|| text.to_string());
                Ok(echoed)
            }
            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && call % fail_every == 0 {
                    Err(ProviderError::ConnectionError(format!(
                        "simulated failure on call {}",
                        call
                    )))
                } else {
                    Ok(Self::pseudo_translate(text, target_locale))
                }
            }
            MockBehavior::Failing => Err(ProviderError::ConnectionError(
                "simulated permanent failure".to_string(),
            )),
            MockBehavior::Empty => Ok(String::new()),
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(Self::pseudo_translate(text, target_locale))
            }
        }
    }
}
