/// Anthropic messages API adapter.
pub mod anthropic;
/// Google Generative Language API adapter.
pub mod google;
/// OpenAI chat completions API adapter.
pub mod openai;

use cogent_core::{CogentError, CogentResult, Completion, CompletionRequest, ContentOptions, MediaPart};
use async_trait::async_trait;

pub use anthropic::AnthropicAdapter;
pub use google::GoogleAdapter;
pub use openai::OpenAiAdapter;

/// Trait for LLM provider backends.
///
/// Each vendor implements this to handle API communication; the orchestrator
/// only ever sees the trait. Vendor errors must surface as `Err`, never as
/// partial results.
///
/// To add a new provider:
/// 1. Create a new module in `providers/`
/// 2. Implement `ProviderAdapter` for your struct
/// 3. Add the variant to `ProviderKind` in `config.rs`
/// 4. Wire it up in `GenerationOrchestrator::from_config`
///
/// The specialized variants default to an "unsupported" provider error so
/// the fallback chain skips adapters that cannot serve a modality.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Wire name used in accounting and cache-independent logs.
    fn name(&self) -> &str;

    /// Configured model id.
    fn model(&self) -> &str;

    /// Text completion.
    async fn complete(&self, request: &CompletionRequest) -> CogentResult<Completion>;

    /// Image generation. The returned `text` is an opaque payload (URL or
    /// base64) the caller interprets.
    async fn generate_image(
        &self,
        _prompt: &str,
        _options: &ContentOptions,
    ) -> CogentResult<Completion> {
        Err(CogentError::Provider(format!(
            "{}: image generation not supported",
            self.name()
        )))
    }

    /// Video generation.
    async fn generate_video(
        &self,
        _prompt: &str,
        _options: &ContentOptions,
    ) -> CogentResult<Completion> {
        Err(CogentError::Provider(format!(
            "{}: video generation not supported",
            self.name()
        )))
    }

    /// Mixed text/image understanding.
    async fn understand_multimodal(
        &self,
        _parts: &[MediaPart],
        _options: &ContentOptions,
    ) -> CogentResult<Completion> {
        Err(CogentError::Provider(format!(
            "{}: multimodal understanding not supported",
            self.name()
        )))
    }
}
