use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Caller-supplied generation knobs.
///
/// Every field participates in the cache key, so two requests that differ in
/// any option are cached independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentOptions {
    /// Desired tone of voice (e.g. "professional", "playful").
    #[serde(default)]
    pub tone: Option<String>,
    /// Output language (e.g. "en", "pl").
    #[serde(default)]
    pub language: Option<String>,
    /// Sampling temperature passed through to the provider.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum output length in tokens.
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    /// Brand voice guidelines, treated as an opaque instruction string.
    #[serde(default)]
    pub brand_voice: Option<String>,
    /// Target audience description, treated as an opaque instruction string.
    #[serde(default)]
    pub target_audience: Option<String>,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_length() -> u32 {
    1000
}

impl Default for ContentOptions {
    fn default() -> Self {
        Self {
            tone: None,
            language: None,
            temperature: default_temperature(),
            max_length: default_max_length(),
            brand_voice: None,
            target_audience: None,
        }
    }
}

/// An immutable generation request, the unit the cache key is derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The user prompt.
    pub prompt: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Generation options.
    pub options: ContentOptions,
}

impl GenerationRequest {
    /// Creates a request with no system prompt and default options.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            options: ContentOptions::default(),
        }
    }

    /// Sets the system prompt.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// Sets the generation options.
    pub fn with_options(mut self, options: ContentOptions) -> Self {
        self.options = options;
        self
    }
}

/// The provider-level request shape: a fully resolved prompt pair plus the
/// two knobs every vendor API accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// The user prompt.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum output tokens.
    pub max_tokens: u32,
}

/// The raw result of one provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text (or an opaque payload such as an image URL).
    pub text: String,
    /// Tokens consumed by the call as reported by the vendor.
    pub tokens_used: u64,
}

/// One part of a multimodal understanding request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum MediaPart {
    /// A text fragment.
    Text(String),
    /// A URL pointing at an image.
    ImageUrl(String),
    /// Base64-encoded inline image data with its MIME type.
    InlineImage {
        /// MIME type, e.g. "image/png".
        mime_type: String,
        /// Base64 payload.
        data: String,
    },
}

/// The result returned to callers of the generation API.
///
/// `cost` and `tokens_used` are authoritative accounting once a provider
/// call actually occurred; for cache hits they reflect the original call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// The generated payload, treated opaquely by this layer.
    pub content: String,
    /// Nominal confidence in the result.
    pub confidence: f32,
    /// Name of the provider that served the request.
    pub provider: String,
    /// Model that served the request.
    pub model: String,
    /// Tokens consumed.
    pub tokens_used: u64,
    /// Cost in account currency, computed from the per-model rate table.
    pub cost: f64,
    /// Whether this result was served from the cache.
    pub cached: bool,
}

/// One append-only usage record. Reporting only; never drives control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Unique identifier.
    pub id: Uuid,
    /// When the call finished.
    pub timestamp: DateTime<Utc>,
    /// Provider that served (or `"none"` when the whole chain failed).
    pub provider: String,
    /// Model that served the request.
    pub model: String,
    /// Which API surface produced this event (e.g. "generate", "generate_image").
    pub function: String,
    /// Tokens consumed.
    pub tokens_used: u64,
    /// Cost in account currency.
    pub cost: f64,
    /// Wall-clock duration of the provider call in milliseconds.
    pub duration_ms: u64,
    /// Whether the call succeeded.
    pub success: bool,
}

/// Per-provider slice of the usage aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderUsage {
    /// Number of requests served by this provider.
    pub requests: u64,
    /// Tokens consumed across those requests.
    pub tokens_used: u64,
    /// Total cost across those requests.
    pub cost: f64,
}

/// Read-only aggregate over the usage event buffer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageStats {
    /// Total recorded requests (successes and failures).
    pub total_requests: u64,
    /// Fraction of requests that succeeded, in `[0, 1]`.
    pub success_rate: f64,
    /// Mean tokens per request.
    pub average_tokens_used: f64,
    /// Cumulative cost.
    pub total_cost: f64,
    /// Breakdown keyed by provider name.
    pub provider_breakdown: HashMap<String, ProviderUsage>,
}
