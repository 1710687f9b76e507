//! Chooses the LLM backend named in configuration.

use std::sync::Arc;

use tracing::debug;

use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::config::RagConfig;
use crate::error::AgentError;

/// Backends [`create_provider`] knows about.
pub const PROVIDERS: [&str; 1] = ["openai"];

/// Builds the provider selected by `config.provider`.
///
/// `"openai"` covers every `OpenAI`-compatible endpoint; point
/// `base_url` at a proxy or a local server to use one.
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for any other name.
pub fn create_provider(config: &RagConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    debug!(provider = %config.provider, base_url = ?config.base_url, "creating LLM provider");
    if config.provider == "openai" {
        return Ok(Arc::new(OpenAiProvider::new(config)));
    }
    Err(AgentError::UnsupportedProvider {
        name: config.provider.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(provider: &str) -> RagConfig {
        RagConfig::builder()
            .api_key("sk-test")
            .provider(provider)
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_every_listed_provider_builds() {
        for name in PROVIDERS {
            let provider = create_provider(&config_for(name)).unwrap_or_else(|_| unreachable!());
            assert_eq!(provider.name(), name);
        }
    }

    #[test]
    fn test_unlisted_provider_rejected() {
        let err = create_provider(&config_for("ollama")).err();
        assert!(matches!(err, Some(AgentError::UnsupportedProvider { name }) if name == "ollama"));
    }
}
