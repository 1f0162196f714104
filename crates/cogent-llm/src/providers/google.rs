use super::ProviderAdapter;
use crate::config::ProviderConfig;
use cogent_core::{
    CogentError, CogentResult, Completion, CompletionRequest, ContentOptions, MediaPart,
};
use async_trait::async_trait;

/// Google Generative Language (Gemini) adapter.
pub struct GoogleAdapter {
    config: ProviderConfig,
    http: reqwest::Client,
}

impl GoogleAdapter {
    /// Creates an adapter from provider configuration.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url(),
            self.config.model,
            self.config.api_key
        )
    }

    async fn post(&self, body: &serde_json::Value) -> CogentResult<serde_json::Value> {
        let resp = self
            .http
            .post(self.generate_url())
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
                "Google API error {status}: {resp_body}"
            )));
        }
        Ok(resp_body)
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn name(&self) -> &str {
        "google"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, request: &CompletionRequest) -> CogentResult<Completion> {
        // Gemini has no dedicated system role on this endpoint; the system
        // prompt is prepended to the user turn.
        let text = match &request.system_prompt {
            Some(sys) => format!("{sys}\n\n{}", request.user_prompt),
            None => request.user_prompt.clone(),
        };

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": text }] }],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            },
        });

        let resp_body = self.post(&body).await?;
        parse_generate_response(&resp_body)
    }

    async fn understand_multimodal(
        &self,
        parts: &[MediaPart],
        options: &ContentOptions,
    ) -> CogentResult<Completion> {
        let api_parts: Vec<serde_json::Value> = parts
            .iter()
            .map(|part| match part {
                MediaPart::Text(text) => serde_json::json!({ "text": text }),
                MediaPart::ImageUrl(url) => serde_json::json!({
                    "file_data": { "file_uri": url },
                }),
                MediaPart::InlineImage { mime_type, data } => serde_json::json!({
                    "inline_data": { "mime_type": mime_type, "data": data },
                }),
            })
            .collect();

        let body = serde_json::json!({
            "contents": [{ "parts": api_parts }],
            "generationConfig": {
                "temperature": options.temperature,
                "maxOutputTokens": options.max_length,
            },
        });

        let resp_body = self.post(&body).await?;
        parse_generate_response(&resp_body)
    }
}

/// Extracts text and token usage from a generateContent response.
pub fn parse_generate_response(body: &serde_json::Value) -> CogentResult<Completion> {
    let text = body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| CogentError::Provider(format!("Google response missing text: {body}")))?
        .to_string();
    let tokens_used = body["usageMetadata"]["totalTokenCount"].as_u64().unwrap_or(0);
    Ok(Completion { text, tokens_used })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_candidate_text_and_usage() {
        let body = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "hola" }], "role": "model" },
            }],
            "usageMetadata": { "promptTokenCount": 7, "candidatesTokenCount": 3, "totalTokenCount": 10 },
        });
        let completion = parse_generate_response(&body).unwrap();
        assert_eq!(completion.text, "hola");
        assert_eq!(completion.tokens_used, 10);
    }

    #[test]
    fn blocked_response_is_a_provider_error() {
        let body = serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" },
        });
        assert!(parse_generate_response(&body).is_err());
    }
}
