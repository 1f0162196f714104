use super::ProviderAdapter;
use crate::config::ProviderConfig;
use cogent_core::{
    CogentError, CogentResult, Completion, CompletionRequest, ContentOptions, MediaPart,
};
use async_trait::async_trait;

/// OpenAI chat completions adapter.
///
/// Also serves any OpenAI-compatible gateway via the base-URL override.
pub struct OpenAiAdapter {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl OpenAiAdapter {
    /// Creates an adapter from provider configuration.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> CogentResult<serde_json::Value> {
        let resp = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(body)
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
                "OpenAI API error {status}: {resp_body}"
            )));
        }
        Ok(resp_body)
    }

    fn chat_body(&self, messages: serde_json::Value, request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: &CompletionRequest) -> CogentResult<Completion> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let mut messages = Vec::new();
        if let Some(sys) = &request.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": sys }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": request.user_prompt }));

        let body = self.chat_body(serde_json::Value::Array(messages), request);
        let resp_body = self.post_json(&url, &body).await?;
        parse_chat_response(&resp_body)
    }

    async fn generate_image(
        &self,
        prompt: &str,
        _options: &ContentOptions,
    ) -> CogentResult<Completion> {
        let url = format!("{}/v1/images/generations", self.config.base_url());
        let body = serde_json::json!({
            "prompt": prompt,
            "n": 1,
            "response_format": "url",
        });

        let resp_body = self.post_json(&url, &body).await?;
        let image_url = resp_body["data"][0]["url"]
            .as_str()
            .ok_or_else(|| {
                CogentError::Provider(format!("OpenAI image response missing url: {resp_body}"))
            })?
            .to_string();

        // The images endpoint does not report token usage.
        Ok(Completion {
            text: image_url,
            tokens_used: 0,
        })
    }

    async fn understand_multimodal(
        &self,
        parts: &[MediaPart],
        options: &ContentOptions,
    ) -> CogentResult<Completion> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let content: Vec<serde_json::Value> = parts
            .iter()
            .map(|part| match part {
                MediaPart::Text(text) => serde_json::json!({ "type": "text", "text": text }),
                MediaPart::ImageUrl(image_url) => serde_json::json!({
                    "type": "image_url",
                    "image_url": { "url": image_url },
                }),
                MediaPart::InlineImage { mime_type, data } => serde_json::json!({
                    "type": "image_url",
                    "image_url": { "url": format!("data:{mime_type};base64,{data}") },
                }),
            })
            .collect();

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": content }],
            "temperature": options.temperature,
            "max_tokens": options.max_length,
        });

        let resp_body = self.post_json(&url, &body).await?;
        parse_chat_response(&resp_body)
    }
}

/// Extracts text and token usage from a chat completions response.
pub fn parse_chat_response(body: &serde_json::Value) -> CogentResult<Completion> {
    let text = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            CogentError::Provider(format!("OpenAI response missing content: {body}"))
        })?
        .to_string();
    let tokens_used = body["usage"]["total_tokens"].as_u64().unwrap_or(0);
    Ok(Completion { text, tokens_used })
}
