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

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// OpenAI chat completions, or any server speaking the same protocol
/// (LM Studio, Ollama, llama.cpp) when built with [`OpenAIProvider::local`].
#[derive(Debug, Clone)]
pub struct OpenAIProvider {
    /// `None` for keyless local servers
    api_key: Option<String>,
    model: String,
    endpoint: String,
    backend: &'static str,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(api_key: String, model: String, endpoint: Option<String>) -> Result<Self> {
        if api_key.is_empty() {
            return Err(anyhow!("OpenAI API key cannot be empty"));
        }
        let endpoint = endpoint.unwrap_or_else(|| OPENAI_ENDPOINT.to_string());
        Self::build(Some(api_key), model, &endpoint, "openai", Duration::from_secs(60))
    }

    pub fn local(endpoint: String, model: String) -> Result<Self> {
        if endpoint.trim().is_empty() {
            return Err(anyhow!("Local LLM endpoint cannot be empty"));
        }
        // Local models on a laptop are slow to produce the first token
        Self::build(None, model, &endpoint, "local", Duration::from_secs(120))
    }

    fn build(
        api_key: Option<String>,
        model: String,
        endpoint: &str,
        backend: &'static str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            api_key,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            backend,
            client: http_client(timeout)?,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = http_client(timeout)?;
        Ok(self)
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn backend(&self) -> &'static str {
        self.backend
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn output_limit(&self) -> u32 {
        16_384
    }

    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let started = Instant::now();
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            max_tokens: checked_max_tokens(self, &request)?,
            temperature: request.temperature,
        };

        info!(
            backend = self.backend,
            model = %self.model,
            prompt_chars = request.prompt.len(),
            "Calling chat completions"
        );

        let mut call = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&body);
        if let Some(api_key) = &self.api_key {
            call = call.bearer_auth(api_key);
        }
        let response = call.send().await?;
        let reply: ChatResponse = ensure_success(self.backend, response).await?.json().await?;

        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("{} returned no choices", self.backend))?;
        let usage = reply
            .usage
            .map(|u| TokenUsage {
                input: u.prompt_tokens,
                output: u.completion_tokens,
            })
            .unwrap_or_default();
        let elapsed = started.elapsed();
        debug!(
            backend = self.backend,
            duration_ms = elapsed.as_millis() as u64,
            tokens = usage.total(),
            "Chat completion received"
        );

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            stop_reason: choice.finish_reason,
            elapsed,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_local_endpoint_is_normalized() {
        let local = OpenAIProvider::local(
            "http://localhost:1234/v1/".to_string(),
            "llama-3.2-3b-instruct".to_string(),
        )
        .unwrap();
        assert_eq!(local.backend(), "local");
        assert_eq!(local.endpoint, "http://localhost:1234/v1");
        assert!(OpenAIProvider::local(" ".into(), "m".into()).is_err());
        assert!(OpenAIProvider::new(String::new(), "m".into(), None).is_err());
    }

    #[tokio::test]
    async fn test_sends_bearer_and_system_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-api-key")
            .match_body(Matcher::PartialJsonString(
                r#"{"messages": [{"role": "system", "content": "sys"}, {"role": "user", "content": "Hello"}]}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                "choices": [{
                    "message": {"role": "assistant", "content": "How long should the meeting be?"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 8}
            }"#,
            )
            .create_async()
            .await;

        let provider = OpenAIProvider::new(
            "test-api-key".to_string(),
            "gpt-4o-mini".to_string(),
            Some(server.url()),
        )
        .unwrap();
        let response = provider
            .complete(LlmRequest::new("sys", "Hello", 500))
            .await
            .unwrap();

        assert_eq!(response.content, "How long should the meeting be?");
        assert_eq!(response.usage, TokenUsage { input: 10, output: 8 });
        assert_eq!(response.stop_reason.as_deref(), Some("stop"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_local_provider_sends_no_authorization() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let provider = OpenAIProvider::local(server.url(), "llama".to_string()).unwrap();
        let response = provider
            .complete(LlmRequest::new("sys", "ping", 10))
            .await
            .unwrap();
        assert_eq!(response.content, "ok");
        assert_eq!(response.usage.total(), 0);
        mock.assert_async().await;
    }
}
