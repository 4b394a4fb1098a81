//! Text-generation backends for reflections.
//!
//! Anthropic or OpenAI through rig-core, wrapped in [`RigAdapter`] so the
//! rest of the crate only sees [`LlmProvider`].

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    pub fn name(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "anthropic",
            LlmBackend::OpenAi => "openai",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "claude-sonnet-4-20250514",
            LlmBackend::OpenAi => "gpt-4o-mini",
        }
    }
}

/// Backend, key and model for the reflection provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Build the provider for the configured backend.
///
/// Clients accept any key at construction; a bad key surfaces on the first
/// reflection request.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider: Arc<dyn LlmProvider> = match config.backend {
        LlmBackend::Anthropic => {
            use rig::providers::anthropic;
            let client: rig::client::Client<anthropic::client::AnthropicExt> =
                anthropic::Client::new(config.api_key.expose_secret())
                    .map_err(|e| client_error(config.backend, e))?;
            Arc::new(RigAdapter::new(client.completion_model(&config.model), &config.model))
        }
        LlmBackend::OpenAi => {
            use rig::providers::openai;
            let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
                openai::Client::new(config.api_key.expose_secret())
                    .map_err(|e| client_error(config.backend, e))?;
            Arc::new(RigAdapter::new(client.completion_model(&config.model), &config.model))
        }
    };

    tracing::info!(backend = config.backend.name(), model = %config.model, "Reflection model ready");
    Ok(provider)
}

fn client_error(backend: LlmBackend, e: impl std::fmt::Display) -> LlmError {
    LlmError::RequestFailed {
        provider: backend.name().to_string(),
        reason: format!("client setup failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn llm_config(pairs: &'static [(&'static str, &'static str)]) -> LlmConfig {
        AppConfig::from_lookup(|key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap()
        .llm
        .unwrap()
    }

    #[test]
    fn anthropic_key_builds_default_model() {
        let config = llm_config(&[("ANTHROPIC_API_KEY", "sk-ant-test")]);
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), LlmBackend::Anthropic.default_model());
    }

    #[test]
    fn openai_key_builds_default_model() {
        let config = llm_config(&[("OPENAI_API_KEY", "sk-test")]);
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.model_name(), LlmBackend::OpenAi.default_model());
    }

    #[test]
    fn model_override_reaches_provider() {
        let config = llm_config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("DAILY_READINGS_MODEL", "gpt-4.1-mini"),
        ]);
        assert_eq!(create_provider(&config).unwrap().model_name(), "gpt-4.1-mini");
    }

    #[test]
    fn backend_names() {
        assert_eq!(LlmBackend::Anthropic.name(), "anthropic");
        assert_eq!(LlmBackend::OpenAi.name(), "openai");
    }
}
