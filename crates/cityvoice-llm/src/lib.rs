//! CityVoice LLM Provider Layer
//!
//! Pluggable text-completion providers behind the `LlmProvider` trait from
//! `cityvoice-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `AnthropicProvider`: Anthropic messages API
//! - `OllamaProvider`: Local Ollama API integration
//!
//! `AnyProvider` wraps whichever backend the configuration selects so callers
//! can hold a single concrete type.
//!
//! # Examples
//!
//! ```
//! use cityvoice_llm::MockProvider;
//! use cityvoice_domain::traits::LlmProvider;
//!
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = provider.generate("test prompt", 64).unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod ollama;

use cityvoice_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Required credential is not set
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Which completion backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Anthropic messages API (needs `ANTHROPIC_API_KEY`)
    Anthropic,
    /// Local Ollama server
    Ollama,
    /// Canned responses, no network
    Mock,
}

impl Default for LlmBackend {
    fn default() -> Self {
        LlmBackend::Anthropic
    }
}

impl fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmBackend::Anthropic => write!(f, "anthropic"),
            LlmBackend::Ollama => write!(f, "ollama"),
            LlmBackend::Mock => write!(f, "mock"),
        }
    }
}

impl FromStr for LlmBackend {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmBackend::Anthropic),
            "ollama" => Ok(LlmBackend::Ollama),
            "mock" => Ok(LlmBackend::Mock),
            other => Err(LlmError::Other(format!(
                "Unsupported LLM backend '{}'. Expected anthropic, ollama or mock.",
                other
            ))),
        }
    }
}

/// Connection settings for building a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Backend to use
    #[serde(default)]
    pub backend: LlmBackend,

    /// Model name; empty means the backend default
    #[serde(default)]
    pub model: String,

    /// Endpoint override; empty means the backend default
    #[serde(default)]
    pub endpoint: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per request before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: String::new(),
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// A provider chosen at runtime from [`ProviderSettings`]
pub enum AnyProvider {
    /// Anthropic messages API
    Anthropic(AnthropicProvider),
    /// Local Ollama
    Ollama(OllamaProvider),
    /// Scripted responses
    Mock(MockProvider),
}

impl AnyProvider {
    /// Build the configured provider
    ///
    /// `api_key` is required for the Anthropic backend; its absence is
    /// reported as [`LlmError::MissingCredential`] before any request is made.
    pub fn from_settings(settings: &ProviderSettings, api_key: Option<String>) -> Result<Self, LlmError> {
        match settings.backend {
            LlmBackend::Anthropic => {
                let key = api_key
                    .filter(|k| !k.trim().is_empty())
                    .ok_or_else(|| LlmError::MissingCredential(anthropic::API_KEY_ENV.to_string()))?;
                let mut provider = AnthropicProvider::new(key)?
                    .with_timeout_secs(settings.timeout_secs)?
                    .with_max_retries(settings.max_retries);
                if !settings.model.is_empty() {
                    provider = provider.with_model(settings.model.clone());
                }
                if !settings.endpoint.is_empty() {
                    provider = provider.with_base_url(settings.endpoint.clone());
                }
                Ok(AnyProvider::Anthropic(provider))
            }
            LlmBackend::Ollama => {
                let endpoint = if settings.endpoint.is_empty() {
                    ollama::DEFAULT_ENDPOINT.to_string()
                } else {
                    settings.endpoint.clone()
                };
                let model = if settings.model.is_empty() {
                    ollama::DEFAULT_MODEL.to_string()
                } else {
                    settings.model.clone()
                };
                let provider = OllamaProvider::new(endpoint, model)?
                    .with_timeout_secs(settings.timeout_secs)?
                    .with_max_retries(settings.max_retries);
                Ok(AnyProvider::Ollama(provider))
            }
            LlmBackend::Mock => Ok(AnyProvider::Mock(MockProvider::default())),
        }
    }
}

impl LlmProviderTrait for AnyProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, Self::Error> {
        match self {
            AnyProvider::Anthropic(p) => p.generate(prompt, max_tokens),
            AnyProvider::Ollama(p) => p.generate(prompt, max_tokens),
            AnyProvider::Mock(p) => p.generate(prompt, max_tokens),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            AnyProvider::Anthropic(p) => p.model_name(),
            AnyProvider::Ollama(p) => p.model_name(),
            AnyProvider::Mock(p) => p.model_name(),
        }
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail,
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls. Rules
/// match when the prompt *contains* the registered fragment; the first
/// matching rule wins, otherwise the default response is returned.
///
/// # Examples
///
/// ```
/// use cityvoice_llm::MockProvider;
/// use cityvoice_domain::traits::LlmProvider;
///
/// // Simple fixed response
/// let provider = MockProvider::new("Fixed response");
/// assert_eq!(provider.generate("any prompt", 10).unwrap(), "Fixed response");
///
/// // Responses keyed on prompt content
/// let mut provider = MockProvider::default();
/// provider.add_response("cluster name", r#"{"name": "Bike Lanes"}"#);
/// provider.add_error("demands");
/// assert!(provider.generate("give me a cluster name", 10).unwrap().contains("Bike"));
/// assert!(provider.generate("list the demands", 10).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    rules: Arc<Mutex<Vec<(String, MockReply)>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond with `response` to prompts containing `fragment`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        lock(&self.rules).push((fragment.into(), MockReply::Text(response.into())));
    }

    /// Fail prompts containing `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>) {
        lock(&self.rules).push((fragment.into(), MockReply::Fail));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
    }

    /// Every prompt received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, Self::Error> {
        lock(&self.prompts).push(prompt.to_string());

        let rules = lock(&self.rules);
        let reply = rules
            .iter()
            .find(|(fragment, _)| prompt.contains(fragment.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
