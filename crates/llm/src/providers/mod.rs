//! Chat-completion backends the LLM oracle can talk to

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::error;

pub mod anthropic_provider;
pub mod openai_provider;

pub use anthropic_provider::AnthropicProvider;
pub use openai_provider::OpenAIProvider;

/// A single system + user exchange. The oracle renders the whole
/// negotiation into `prompt`, so no message history is carried.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub stop_reason: Option<String>,
    pub elapsed: Duration,
}

/// Token counts as reported by the backend; zero when it reported nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input + self.output
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// "anthropic", "openai" or "local"
    fn backend(&self) -> &'static str;

    fn model(&self) -> &str;

    /// Largest completion the backend accepts in one call
    fn output_limit(&self) -> u32;

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;

    fn name(&self) -> String {
        format!("{} ({})", self.backend(), self.model())
    }
}

/// Enum dispatch over the concrete providers
#[derive(Debug, Clone)]
pub enum ProviderWrapper {
    OpenAI(OpenAIProvider),
    Anthropic(AnthropicProvider),
}

#[async_trait]
impl LlmProvider for ProviderWrapper {
    fn backend(&self) -> &'static str {
        match self {
            ProviderWrapper::OpenAI(p) => p.backend(),
            ProviderWrapper::Anthropic(p) => p.backend(),
        }
    }

    fn model(&self) -> &str {
        match self {
            ProviderWrapper::OpenAI(p) => p.model(),
            ProviderWrapper::Anthropic(p) => p.model(),
        }
    }

    fn output_limit(&self) -> u32 {
        match self {
            ProviderWrapper::OpenAI(p) => p.output_limit(),
            ProviderWrapper::Anthropic(p) => p.output_limit(),
        }
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        match self {
            ProviderWrapper::OpenAI(p) => p.complete(request).await,
            ProviderWrapper::Anthropic(p) => p.complete(request).await,
        }
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))
}

/// Empty prompts are refused; oversized token requests are clamped
pub(crate) fn checked_max_tokens(provider: &dyn LlmProvider, request: &LlmRequest) -> Result<u32> {
    if request.prompt.trim().is_empty() {
        return Err(anyhow!("{} request has an empty prompt", provider.backend()));
    }
    Ok(request.max_tokens.clamp(1, provider.output_limit()))
}

/// Pass successful responses through; turn anything else into an error
/// carrying the status and body
pub(crate) async fn ensure_success(backend: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!(backend, %status, body = %body, "Completion request failed");
    Err(anyhow!("{} API error ({}): {}", backend, status, body))
}
