use super::ProviderAdapter;
use crate::config::ProviderConfig;
use cogent_core::{CogentError, CogentResult, Completion, CompletionRequest};
use async_trait::async_trait;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic messages API adapter.
pub struct AnthropicAdapter {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl AnthropicAdapter {
    /// Creates an adapter from provider configuration.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: &CompletionRequest) -> CogentResult<Completion> {
        let url = format!("{}/v1/messages", self.config.base_url());

        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [{ "role": "user", "content": request.user_prompt }],
        });
        if let Some(sys) = &request.system_prompt {
            body["system"] = serde_json::json!(sys);
        }

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| CogentError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CogentError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(CogentError::Provider(format!(
                "Anthropic API error {status}: {resp_body}"
            )));
        }

        parse_messages_response(&resp_body)
    }
}

/// Extracts text and token usage from a messages API response.
pub fn parse_messages_response(body: &serde_json::Value) -> CogentResult<Completion> {
    let text = body["content"][0]["text"]
        .as_str()
        .ok_or_else(|| {
            CogentError::Provider(format!("Anthropic response missing text: {body}"))
        })?
        .to_string();

    let input = body["usage"]["input_tokens"].as_u64().unwrap_or(0);
    let output = body["usage"]["output_tokens"].as_u64().unwrap_or(0);

    Ok(Completion {
        text,
        tokens_used: input + output,
    })
}
