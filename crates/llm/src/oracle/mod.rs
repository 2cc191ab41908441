//! Reasoning Oracle adapters
//!
//! - [`LlmReasoningOracle`] asks a chat model for JSON and decodes it
//! - [`RuleBasedOracle`] answers offline from the busy intervals alone

pub mod parse;
pub mod prompts;
pub mod rule_based;

pub use rule_based::RuleBasedOracle;

use crate::providers::{LlmProvider, LlmRequest};
use async_trait::async_trait;
use common::OperationTimer;
use domain::{
    AlternativeRequest, InterpretRequest, Interpretation, OracleError, ReasoningOracle,
    SuggestedAlternative,
};
use parse::Headcount;
use std::sync::Arc;
use tracing::{debug, warn};

const INTERPRET_MAX_TOKENS: u32 = 2000;
const ALTERNATIVE_MAX_TOKENS: u32 = 1000;

pub struct LlmReasoningOracle {
    provider: Arc<dyn LlmProvider>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl LlmReasoningOracle {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Caps every request at `max_tokens`
    pub fn with_parameters(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    async fn ask(&self, operation: &str, prompt: String, default_tokens: u32) -> Result<String, OracleError> {
        let max_tokens = self
            .max_tokens
            .map_or(default_tokens, |cap| cap.min(default_tokens));
        let request = LlmRequest::new(prompts::SYSTEM_PROMPT, prompt, max_tokens)
            .with_temperature(self.temperature);

        let mut timer = OperationTimer::new(format!("oracle.{}", operation));
        timer.add_field("provider", self.provider.name());
        let result = self.provider.complete(request).await;
        timer.finish_with_result(&result);

        match result {
            Ok(response) => {
                debug!(operation, tokens = response.usage.total(), "Oracle answered");
                Ok(response.content)
            }
            Err(e) => {
                warn!(operation, error = %e, "Oracle transport failure");
                Err(OracleError::Transport(format!("{:#}", e)))
            }
        }
    }
}

#[async_trait]
impl ReasoningOracle for LlmReasoningOracle {
    async fn interpret(&self, request: &InterpretRequest) -> Result<Interpretation, OracleError> {
        let raw = self
            .ask("interpret", prompts::interpret_prompt(request), INTERPRET_MAX_TOKENS)
            .await?;
        parse::parse_interpretation(&raw, Headcount::of(&request.attendees)).map_err(|e| {
            warn!(error = %e, "Could not decode interpretation");
            e
        })
    }

    async fn find_alternative(
        &self,
        request: &AlternativeRequest,
    ) -> Result<SuggestedAlternative, OracleError> {
        let raw = self
            .ask("find_alternative", prompts::alternative_prompt(request), ALTERNATIVE_MAX_TOKENS)
            .await?;
        let suggestion =
            parse::parse_alternative(&raw, &request.current, Headcount::of(&request.attendees))?;
        if suggestion.proposal.day.eq_ignore_ascii_case(&request.current.day)
            && suggestion.proposal.time.eq_ignore_ascii_case(&request.current.time)
        {
            return Err(OracleError::Malformed(
                "alternative repeats the declined slot".to_string(),
            ));
        }
        Ok(suggestion)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}
