//! Completion service client.
//!
//! The pipeline only needs "send this system prompt and user message to this
//! model, give me the content blocks back". Calls are never retried: a failed
//! call fails the pipeline stage that made it.

use async_trait::async_trait;
use reqwest::Client;
use rejuuv_core::completion::{CompletionError, CompletionResponse};
use rejuuv_core::prompts::Prompt;
use tracing::debug;

use crate::config::CompletionConfig;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        prompt: &Prompt,
    ) -> Result<CompletionResponse, CompletionError>;
}

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    http: Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn build_request_body(&self, model: &str, prompt: &Prompt) -> serde_json::Value {
        serde_json::json!({
            "model": model,
            "max_tokens": self.max_tokens,
            "system": prompt.system,
            "messages": [
                { "role": "user", "content": prompt.user }
            ],
        })
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(
        &self,
        model: &str,
        prompt: &Prompt,
    ) -> Result<CompletionResponse, CompletionError> {
        debug!(model, "complete: called");
        let url = format!("{}/v1/messages", self.base_url);

        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_request_body(model, prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Transport(format!("request timed out: {e}"))
                } else {
                    CompletionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "complete: API error");
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| CompletionError::Transport(format!("unreadable response body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn client() -> AnthropicClient {
        AnthropicClient::from_config(&CompletionConfig {
            api_key: "sk-test".to_string(),
            base_url: "http://localhost:9".to_string(),
            max_tokens: 1024,
            timeout: Duration::from_secs(1),
        })
        .expect("client should build")
    }

    #[test]
    fn request_body_carries_model_system_and_user_message() {
        let prompt = Prompt {
            system: "be brief".to_string(),
            user: "hello".to_string(),
        };
        let body = client().build_request_body("claude-haiku-4-5-20251001", &prompt);
        assert_eq!(body["model"], "claude-haiku-4-5-20251001");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hello");
    }

    #[test]
    fn provider_response_deserializes_into_content_blocks() {
        let raw = serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-haiku-4-5-20251001",
            "content": [{ "type": "text", "text": "{\"red_flag_detected\": false}" }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 10, "output_tokens": 5 }
        });
        let response: CompletionResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(response.text(), "{\"red_flag_detected\": false}");
    }
}
