//! Anthropic Provider Implementation
//!
//! Talks to the Anthropic messages API. Retries transient failures (transport
//! errors, 429, 5xx) with exponential backoff; authentication and request
//! errors fail immediately.

use crate::ollama::{build_client, build_runtime};
use crate::LlmError;
use cityvoice_domain::traits::LlmProvider as LlmProviderTrait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API provider
///
/// Like [`crate::OllamaProvider`], this owns a single-threaded runtime and
/// blocks on it, so it must not be called from inside another runtime.
pub struct AnthropicProvider {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    runtime: Runtime,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [WireMessage<'a>; 1],
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AnthropicProvider {
    /// Create a provider with the default model and endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            client: build_client(crate::ollama::DEFAULT_TIMEOUT_SECS)?,
            max_retries: crate::ollama::DEFAULT_MAX_RETRIES,
            runtime: build_runtime()?,
        })
    }

    /// Use a different model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different base URL (e.g. a proxy)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the maximum number of attempts per request
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Result<Self, LlmError> {
        self.client = build_client(timeout_secs)?;
        Ok(self)
    }

    fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|_| LlmError::MissingCredential(format!("{} is not a valid header value", API_KEY_ENV)))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Send one prompt as a single user message and return the text blocks
    pub async fn generate_async(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: [WireMessage {
                role: "user",
                content: prompt,
            }],
        };
        let headers = self.headers()?;

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            debug!(model = %self.model, attempt = attempts + 1, "Anthropic messages request");

            match self
                .client
                .post(&url)
                .headers(headers.clone())
                .json(&request)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.json::<MessagesResponse>().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        return Ok(collect_text(body));
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(LlmError::RateLimitExceeded);
                    } else if status == StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    } else if status.is_server_error() {
                        last_error = Some(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    } else {
                        return Err(LlmError::Communication(format!(
                            "HTTP {}: {}",
                            status, error_text
                        )));
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

fn collect_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

impl LlmProviderTrait for AnthropicProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, Self::Error> {
        self.runtime.block_on(self.generate_async(prompt, max_tokens))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
