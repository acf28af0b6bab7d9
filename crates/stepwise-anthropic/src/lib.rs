// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Messages API backend for Stepwise text generation.
//!
//! API key resolution order: `generation.api_key` from config, then the
//! `ANTHROPIC_API_KEY` environment variable.

pub mod client;
pub mod types;

use async_trait::async_trait;
use stepwise_config::model::GenerationConfig;
use stepwise_core::types::{GenerationRequest, GenerationResponse};
use stepwise_core::{StepwiseError, TextGeneration};
use tracing::{debug, info};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// [`TextGeneration`] over the Anthropic Messages API.
pub struct AnthropicGeneration {
    client: AnthropicClient,
    model: String,
}

impl AnthropicGeneration {
    pub fn new(config: &GenerationConfig) -> Result<Self, StepwiseError> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let client = AnthropicClient::new(
            &api_key,
            &config.api_version,
            &config.base_url,
            config.timeout(),
        )?;
        info!(model = %config.model, "Anthropic generation backend initialized");
        Ok(Self::with_client(client, config.model.clone()))
    }

    pub fn with_client(client: AnthropicClient, model: String) -> Self {
        Self { client, model }
    }

    fn to_message_request(&self, request: GenerationRequest) -> MessageRequest {
        let system = (!request.system_prompt.is_empty()).then_some(request.system_prompt);
        MessageRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: request.prompt,
            }],
            system,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl TextGeneration for AnthropicGeneration {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, StepwiseError> {
        let message_request = self.to_message_request(request);
        let response = self.client.complete_message(&message_request).await?;
        debug!(
            id = %response.id,
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "generation complete"
        );
        Ok(GenerationResponse {
            text: response.text(),
            truncated: response.truncated(),
        })
    }
}

fn resolve_api_key(config_key: Option<&str>) -> Result<String, StepwiseError> {
    if let Some(key) = config_key.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    std::env::var("ANTHROPIC_API_KEY").map_err(|_| {
        StepwiseError::Config(
            "Anthropic API key not found. Set generation.api_key in config or the ANTHROPIC_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn resolve_api_key_from_config() {
        assert_eq!(resolve_api_key(Some("sk-test-123")).unwrap(), "sk-test-123");
    }

    #[test]
    fn resolve_api_key_empty_config_falls_back_to_env() {
        // Succeeds only when the environment provides a key.
        if let Ok(key) = resolve_api_key(Some("")) {
            assert!(!key.is_empty());
        }
    }

    #[test]
    fn resolve_api_key_none_falls_back_to_env() {
        if let Err(err) = resolve_api_key(None) {
            assert!(err.to_string().contains("API key not found"), "got: {err}");
        }
    }

    #[tokio::test]
    async fn complete_maps_request_and_truncation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "model": "claude-haiku-4-5-20251001",
                "system": "Summarize.",
                "max_tokens": 32,
                "messages": [{"role": "user", "content": "transcript"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "- notes"}],
                "model": "claude-haiku-4-5-20251001",
                "stop_reason": "max_tokens",
                "usage": {"input_tokens": 10, "output_tokens": 32}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            AnthropicClient::new("k", "2023-06-01", &server.uri(), Duration::from_secs(5)).unwrap();
        let backend =
            AnthropicGeneration::with_client(client, "claude-haiku-4-5-20251001".to_string());
        let response = backend
            .complete(GenerationRequest {
                prompt: "transcript".into(),
                system_prompt: "Summarize.".into(),
                max_tokens: 32,
            })
            .await
            .unwrap();
        assert_eq!(response.text, "- notes");
        assert!(response.truncated);
    }

    #[test]
    fn empty_system_prompt_is_omitted() {
        let client = AnthropicClient::new(
            "k",
            "2023-06-01",
            "http://localhost:1",
            Duration::from_secs(1),
        )
        .unwrap();
        let backend = AnthropicGeneration::with_client(client, "m".into());
        let request = backend.to_message_request(GenerationRequest {
            prompt: "p".into(),
            system_prompt: String::new(),
            max_tokens: 1,
        });
        assert!(request.system.is_none());
    }
}
