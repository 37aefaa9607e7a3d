/*!
 * HTTP translation provider.
 *
 * JSON client for chat-completion style APIs. The executor owns retries;
 * this client does one request per invoke and maps transport, status, and
 * parse failures onto the provider error taxonomy.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;

use super::{PromptContext, TranslationProvider};

/// HTTP client for a remote completion API
#[derive(Debug)]
pub struct HttpProvider {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Completion endpoint URL
    endpoint: String,
    /// Model name sent with each request
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// Chat message in a completion request
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    /// Role of the message sender (system, user)
    role: String,
    /// Content of the message
    content: String,
}

/// Completion request body
#[derive(Debug, Serialize)]
struct CompletionRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<ChatMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// One completion choice in the response
#[derive(Debug, Deserialize)]
struct CompletionChoice {
    /// The message produced by the model
    message: ChatMessage,
}

/// Completion response body
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    /// The choices returned by the API
    choices: Vec<CompletionChoice>,
}

impl HttpProvider {
    /// Create a new HTTP provider
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        temperature: f32,
    ) -> Result<Self, ProviderError> {
        let endpoint = endpoint.into();

        Url::parse(&endpoint)
            .map_err(|e| ProviderError::ConnectionError(format!("invalid endpoint {}: {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint,
            model: model.into(),
            temperature,
        })
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Provider API error {}: {}", status, message);

            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationError(message),
                429 => ProviderError::RateLimitExceeded(message),
                code => ProviderError::ApiError {
                    status_code: code,
                    message,
                },
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(text)
    }
}

#[async_trait]
impl TranslationProvider for HttpProvider {
    async fn invoke(
        &self,
        text: &str,
        target_locale: &str,
        prompt: &PromptContext,
    ) -> Result<String, ProviderError> {
        debug!(
            "provider call: model={} target={} simplified={} chars={}",
            self.model,
            target_locale,
            prompt.simplified,
            text.chars().count()
        );

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: Some(self.temperature),
        };

        self.complete(request).await
    }
}
