//! Extraction client: one prompt payload → one raw model reply.
//!
//! [`ExtractionClient`] is the seam between the orchestrator and the remote
//! model. The production implementation, [`LlmExtractionClient`], wraps
//! `edgequake_llm` providers; tests substitute a scripted client.
//!
//! There are no retries here. A throttled or failed call surfaces to the
//! caller as a [`ClientError`] and the orchestrator reports it as an
//! upstream failure.

use crate::config::ExtractionConfig;
use crate::error::{ClientError, DocParseError};
use crate::pipeline::prompt::PromptPayload;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Sends a prompt payload to a named model and returns the reply text.
#[async_trait]
pub trait ExtractionClient: Send + Sync {
    async fn send(&self, payload: &PromptPayload, model: &str) -> Result<String, ClientError>;
}

/// [`ExtractionClient`] over `edgequake_llm` providers, one per model.
pub struct LlmExtractionClient {
    providers: Vec<(String, Arc<dyn LLMProvider>)>,
    temperature: f32,
    max_tokens: usize,
}

impl std::fmt::Debug for LlmExtractionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let models: Vec<&str> = self.providers.iter().map(|(m, _)| m.as_str()).collect();
        f.debug_struct("LlmExtractionClient")
            .field("models", &models)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl LlmExtractionClient {
    /// Instantiate providers for the text model and the vision model.
    ///
    /// Provider credentials (`OPENAI_API_KEY` etc.) are read from the
    /// environment by `ProviderFactory`.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, DocParseError> {
        let mut providers = vec![(
            config.model.clone(),
            create_provider(&config.provider_name, &config.model)?,
        )];
        if config.vision_model != config.model {
            providers.push((
                config.vision_model.clone(),
                create_provider(&config.provider_name, &config.vision_model)?,
            ));
        }
        Ok(Self::with_providers(providers, config))
    }

    /// Use pre-built providers, keyed by the model name they serve.
    pub fn with_providers(
        providers: Vec<(String, Arc<dyn LLMProvider>)>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            providers,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn provider_for(&self, model: &str) -> Option<&Arc<dyn LLMProvider>> {
        self.providers
            .iter()
            .find(|(name, _)| name == model)
            .map(|(_, p)| p)
    }
}

#[async_trait]
impl ExtractionClient for LlmExtractionClient {
    async fn send(&self, payload: &PromptPayload, model: &str) -> Result<String, ClientError> {
        let provider = self
            .provider_for(model)
            .ok_or_else(|| ClientError::UnknownModel(model.to_string()))?;

        let messages = vec![
            ChatMessage::system(payload.system.as_str()),
            ChatMessage::user_with_images(payload.text.as_str(), payload.images.clone()),
        ];
        let options = build_options(self.temperature, self.max_tokens);

        let start = Instant::now();
        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    model,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(response.content)
            }
            Err(e) => {
                let err = classify_llm_error(&e.to_string());
                warn!("{}: model call failed: {}", model, err);
                Err(err)
            }
        }
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, DocParseError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DocParseError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

/// Map a provider error message onto [`ClientError`].
fn classify_llm_error(msg: &str) -> ClientError {
    let lower = msg.to_lowercase();
    if lower.contains("429") || lower.contains("rate limit") || lower.contains("ratelimit") {
        ClientError::RateLimited(msg.to_string())
    } else {
        ClientError::Transport(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_uses_config_values() {
        let config = ExtractionConfig::default();
        let opts = build_options(config.temperature, config.max_tokens);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(2000));
    }

    #[test]
    fn rate_limits_detected() {
        assert!(matches!(
            classify_llm_error("HTTP 429 Too Many Requests"),
            ClientError::RateLimited(_)
        ));
        assert!(matches!(
            classify_llm_error("Rate limit reached for gpt-4o"),
            ClientError::RateLimited(_)
        ));
    }

    #[test]
    fn other_failures_are_transport() {
        assert_eq!(
            classify_llm_error("invalid api key"),
            ClientError::Transport("invalid api key".into())
        );
    }

    #[tokio::test]
    async fn unknown_model_rejected() {
        let client = LlmExtractionClient::with_providers(Vec::new(), &ExtractionConfig::default());
        let payload = PromptPayload {
            mode: crate::output::ExtractionMode::Text,
            system: "s".into(),
            text: "t".into(),
            images: Vec::new(),
        };
        let err = client.send(&payload, "gpt-4o").await.unwrap_err();
        assert_eq!(err, ClientError::UnknownModel("gpt-4o".into()));
    }
}
