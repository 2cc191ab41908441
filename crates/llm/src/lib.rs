//! LLM providers and the Reasoning Oracle adapters built on them

use anyhow::{anyhow, Result};
use domain::ReasoningOracle;
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub mod oracle;
pub mod providers;

pub use oracle::{LlmReasoningOracle, RuleBasedOracle};
pub use providers::{
    AnthropicProvider, LlmProvider, LlmRequest, LlmResponse, OpenAIProvider, ProviderWrapper,
    TokenUsage,
};

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderSettings {
    Anthropic {
        api_key: String,
        model: String,
    },
    OpenAI {
        api_key: String,
        model: String,
    },
    Local {
        url: String,
        model: String,
    },
    /// Offline rule-based oracle, no network
    Rules,
}

/// Which reasoning backend to use and how to call it
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub provider: ProviderSettings,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl LlmSettings {
    pub fn rules() -> Self {
        Self {
            provider: ProviderSettings::Rules,
            max_tokens: 2000,
            temperature: 0.2,
            timeout: Duration::from_secs(60),
        }
    }

    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// A missing API key degrades to the rule-based oracle instead of failing
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_tokens = var("MAX_TOKENS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(2000);
        let temperature = var("TEMPERATURE")
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(0.2);
        let timeout = var("LLM_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        let provider_type = var("LLM_PROVIDER").unwrap_or_else(|| {
            if var("ANTHROPIC_API_KEY").is_some() {
                "anthropic".to_string()
            } else {
                "rules".to_string()
            }
        });

        let provider = match provider_type.to_lowercase().as_str() {
            "anthropic" => match var("ANTHROPIC_API_KEY") {
                Some(api_key) => ProviderSettings::Anthropic {
                    api_key,
                    model: var("ANTHROPIC_MODEL")
                        .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
                },
                None => {
                    warn!("ANTHROPIC_API_KEY is not set, using the rule-based oracle");
                    ProviderSettings::Rules
                }
            },
            "openai" => match var("OPENAI_API_KEY") {
                Some(api_key) => ProviderSettings::OpenAI {
                    api_key,
                    model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
                },
                None => {
                    warn!("OPENAI_API_KEY is not set, using the rule-based oracle");
                    ProviderSettings::Rules
                }
            },
            "local" => ProviderSettings::Local {
                url: var("LOCAL_LLM_URL").unwrap_or_else(|| "http://localhost:1234/v1".to_string()),
                model: var("LOCAL_LLM_MODEL")
                    .unwrap_or_else(|| "llama-3.2-3b-instruct".to_string()),
            },
            "rules" => ProviderSettings::Rules,
            other => return Err(anyhow!("Unsupported LLM_PROVIDER: {}", other)),
        };

        Ok(Self {
            provider,
            max_tokens,
            temperature,
            timeout,
        })
    }

    pub fn backend_name(&self) -> String {
        match &self.provider {
            ProviderSettings::Anthropic { model, .. } => format!("anthropic ({})", model),
            ProviderSettings::OpenAI { model, .. } => format!("openai ({})", model),
            ProviderSettings::Local { model, url } => format!("local ({} at {})", model, url),
            ProviderSettings::Rules => "rule-based".to_string(),
        }
    }
}

/// Build the oracle described by `settings`.
///
/// `default_location` is only used by the rule-based oracle.
pub fn build_oracle(
    settings: &LlmSettings,
    default_location: &str,
) -> Result<Arc<dyn ReasoningOracle>> {
    let provider = match &settings.provider {
        ProviderSettings::Rules => {
            info!("Using rule-based reasoning oracle");
            return Ok(Arc::new(RuleBasedOracle::new(default_location)));
        }
        ProviderSettings::Anthropic { api_key, model } => ProviderWrapper::Anthropic(
            AnthropicProvider::new(api_key.clone(), model.clone())?.with_timeout(settings.timeout)?,
        ),
        ProviderSettings::OpenAI { api_key, model } => ProviderWrapper::OpenAI(
            OpenAIProvider::new(api_key.clone(), model.clone(), None)?
                .with_timeout(settings.timeout)?,
        ),
        ProviderSettings::Local { url, model } => ProviderWrapper::OpenAI(
            OpenAIProvider::local(url.clone(), model.clone())?.with_timeout(settings.timeout)?,
        ),
    };

    info!(backend = %settings.backend_name(), "Using LLM reasoning oracle");
    Ok(Arc::new(
        LlmReasoningOracle::new(Arc::new(provider))
            .with_parameters(Some(settings.max_tokens), Some(settings.temperature)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<LlmSettings> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LlmSettings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_rules_without_keys() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.provider, ProviderSettings::Rules);
        assert_eq!(s.max_tokens, 2000);
    }

    #[test]
    fn test_anthropic_key_selects_anthropic() {
        let s = settings(&[("ANTHROPIC_API_KEY", "sk-test"), ("LLM_TIMEOUT_SECS", "5")]).unwrap();
        assert_eq!(
            s.provider,
            ProviderSettings::Anthropic {
                api_key: "sk-test".into(),
                model: DEFAULT_ANTHROPIC_MODEL.into(),
            }
        );
        assert_eq!(s.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_key_degrades_to_rules() {
        let s = settings(&[("LLM_PROVIDER", "openai")]).unwrap();
        assert_eq!(s.provider, ProviderSettings::Rules);
    }

    #[test]
    fn test_unknown_provider_is_error() {
        assert!(settings(&[("LLM_PROVIDER", "carrier-pigeon")]).is_err());
    }

    #[test]
    fn test_build_rules_oracle() {
        let oracle = build_oracle(&LlmSettings::rules(), "Huntsman Hall").unwrap();
        assert_eq!(oracle.name(), "rules");
    }
}
