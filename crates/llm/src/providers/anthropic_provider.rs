use super::{
    checked_max_tokens, ensure_success, http_client, LlmProvider, LlmRequest, LlmResponse,
    TokenUsage,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const OUTPUT_LIMIT: u32 = 8192;

/// Anthropic Messages API
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(anyhow!("Anthropic API key cannot be empty"));
        }

        Ok(Self {
            api_key,
            model,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client: http_client(Duration::from_secs(90))?,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client(timeout)?;
        Ok(self)
    }

    /// Point at a different base URL (proxies, test servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn backend(&self) -> &'static str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn output_limit(&self) -> u32 {
        OUTPUT_LIMIT
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let started = Instant::now();
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: checked_max_tokens(self, &request)?,
            system: &request.system,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
        };

        info!(model = %self.model, prompt_chars = request.prompt.len(), "Calling Anthropic");

        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;
        let reply: MessagesResponse = ensure_success(self.backend(), response).await?.json().await?;

        let content: String = reply
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();
        if content.is_empty() {
            return Err(anyhow!("Anthropic returned no text blocks"));
        }

        let usage = reply
            .usage
            .map(|u| TokenUsage {
                input: u.input_tokens,
                output: u.output_tokens,
            })
            .unwrap_or_default();
        let elapsed = started.elapsed();
        debug!(
            duration_ms = elapsed.as_millis() as u64,
            tokens = usage.total(),
            "Anthropic replied"
        );

        Ok(LlmResponse {
            content,
            usage,
            stop_reason: reply.stop_reason,
            elapsed,
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}
