//! Local completions through an Ollama server
//!
//! No credentials are needed, which makes this the backend for offline runs.
//! Requests are retried with exponential backoff and bounded by a per-request
//! timeout.
//!
//! # Examples
//!
//! ```no_run
//! use cityvoice_llm::OllamaProvider;
//! use cityvoice_domain::traits::LlmProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1").unwrap();
//! let text = provider.generate("Say hello", 32).unwrap();
//! ```

use crate::LlmError;
use cityvoice_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

/// Where a stock Ollama install listens
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default local model
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Attempts per completion before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Completion provider backed by `/api/generate`
///
/// The provider owns a single-threaded Tokio runtime and blocks on it in
/// [`LlmProviderTrait::generate`]; do not call it from inside another runtime.
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    runtime: Runtime,
}

/// `/api/generate` request, non-streaming
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn build_runtime() -> Result<Runtime, LlmError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))
}

impl OllamaProvider {
    /// Provider for `model` served at `endpoint`
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
            max_retries: DEFAULT_MAX_RETRIES,
            runtime: build_runtime()?,
        })
    }

    /// Create a new Ollama provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Attempts per completion, at least one
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Result<Self, LlmError> {
        self.client = build_client(timeout_secs)?;
        Ok(self)
    }

    /// One completion, retried on transport errors and non-404 failures
    ///
    /// A 404 means the model is not pulled and is returned immediately.
    pub async fn generate_async(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint.trim_end_matches('/'));

        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                num_predict: max_tokens,
            },
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        return response
                            .json::<OllamaGenerateResponse>()
                            .await
                            .map(|r| r.response)
                            .map_err(|e| {
                                LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                            });
                    } else if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    } else {
                        let status = response.status();
                        let error_text = response.text().await.unwrap_or_default();
                        last_error = Some(LlmError::Communication(format!(
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
                // 1s, 2s, 4s, ...
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                debug!(attempt = attempts, ?delay, "Retrying Ollama request");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

impl LlmProviderTrait for OllamaProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, Self::Error> {
        self.runtime.block_on(self.generate_async(prompt, max_tokens))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
