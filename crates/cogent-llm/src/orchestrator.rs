use crate::cache::CacheStore;
use crate::config::{ProviderKind, ServiceConfig};
use crate::cost::CostTable;
use crate::providers::{AnthropicAdapter, GoogleAdapter, OpenAiAdapter, ProviderAdapter};
use crate::rate_limit::RateLimiter;
use crate::usage::UsageLog;
use cogent_core::{
    CogentError, CogentResult, CompletionRequest, ContentOptions, GeneratedContent,
    GenerationRequest, MediaPart, UsageEvent, UsageStats,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Nominal confidence attached to fresh generations. The upstream vendors
/// expose no comparable signal, so this is a constant rather than an estimate.
const DEFAULT_CONFIDENCE: f32 = 0.9;

/// Which provider call a chain run performs.
enum ChainCall<'a> {
    Complete(&'a CompletionRequest),
    Image {
        prompt: &'a str,
        options: &'a ContentOptions,
    },
    Video {
        prompt: &'a str,
        options: &'a ContentOptions,
    },
    Multimodal {
        parts: &'a [MediaPart],
        options: &'a ContentOptions,
    },
}

/// The provider fallback chain with rate limiting, caching, and accounting.
///
/// Stateless from the caller's perspective and re-entrant: share one instance
/// behind an `Arc` across every concurrent caller. The rate limiter, cache,
/// and usage log are internally synchronized.
pub struct GenerationOrchestrator {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    rate_limiter: RateLimiter,
    cache: CacheStore,
    cache_enabled: bool,
    costs: CostTable,
    usage: UsageLog,
}

impl GenerationOrchestrator {
    /// Builds real vendor adapters in the configured fallback order.
    /// Unconfigured providers (empty API key) are skipped up front.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let mut providers: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
        for provider_config in &config.providers {
            if !provider_config.is_configured() {
                info!(provider = %provider_config.provider, "Provider not configured, skipping");
                continue;
            }
            let adapter: Arc<dyn ProviderAdapter> = match provider_config.provider {
                ProviderKind::OpenAi => Arc::new(OpenAiAdapter::new(provider_config.clone())),
                ProviderKind::Google => Arc::new(GoogleAdapter::new(provider_config.clone())),
                ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(provider_config.clone())),
            };
            providers.push(adapter);
        }

        Self {
            providers,
            rate_limiter: RateLimiter::new(config.rate_limits.clone()),
            cache: CacheStore::new(Duration::from_secs(config.cache.ttl_secs)),
            cache_enabled: config.cache.enabled,
            costs: CostTable::default(),
            usage: UsageLog::default(),
        }
    }

    /// Builds an orchestrator around pre-built adapters (custom providers,
    /// test doubles).
    pub fn with_providers(providers: Vec<Arc<dyn ProviderAdapter>>, config: &ServiceConfig) -> Self {
        Self {
            providers,
            rate_limiter: RateLimiter::new(config.rate_limits.clone()),
            cache: CacheStore::new(Duration::from_secs(config.cache.ttl_secs)),
            cache_enabled: config.cache.enabled,
            costs: CostTable::default(),
            usage: UsageLog::default(),
        }
    }

    /// Replaces the default cost table.
    pub fn with_cost_table(mut self, costs: CostTable) -> Self {
        self.costs = costs;
        self
    }

    /// Primary API: generate text for `prompt` under `options`.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &ContentOptions,
    ) -> CogentResult<GeneratedContent> {
        let request = GenerationRequest {
            prompt: prompt.to_string(),
            system_prompt: None,
            options: options.clone(),
        };
        self.generate_request(&request).await
    }

    /// Generate with an explicit system prompt.
    pub async fn generate_request(
        &self,
        request: &GenerationRequest,
    ) -> CogentResult<GeneratedContent> {
        let key = CacheStore::key("generate", request)?;
        let completion_request = CompletionRequest {
            system_prompt: request.system_prompt.clone(),
            user_prompt: request.prompt.clone(),
            temperature: request.options.temperature,
            max_tokens: request.options.max_length,
        };
        self.run("generate", key, ChainCall::Complete(&completion_request))
            .await
    }

    /// Multi-step reasoning over a problem statement, optionally grounded in
    /// extra context. Runs at low temperature with a reasoning system prompt.
    pub async fn complex_reasoning(
        &self,
        problem: &str,
        context: Option<&str>,
    ) -> CogentResult<GeneratedContent> {
        let key = CacheStore::key("complex_reasoning", &(problem, context))?;

        let user_prompt = match context {
            Some(ctx) => format!("{problem}\n\nContext:\n{ctx}"),
            None => problem.to_string(),
        };
        let completion_request = CompletionRequest {
            system_prompt: Some(
                "You are a careful reasoning engine. Work through the problem step by step \
                 and state your conclusion clearly."
                    .into(),
            ),
            user_prompt,
            temperature: 0.2,
            max_tokens: 2000,
        };
        self.run(
            "complex_reasoning",
            key,
            ChainCall::Complete(&completion_request),
        )
        .await
    }

    /// Image generation. The returned content is an opaque payload (URL or
    /// base64) from the serving provider.
    pub async fn generate_image(
        &self,
        prompt: &str,
        options: &ContentOptions,
    ) -> CogentResult<GeneratedContent> {
        let key = CacheStore::key("generate_image", &(prompt, options))?;
        self.run("generate_image", key, ChainCall::Image { prompt, options })
            .await
    }

    /// Video generation. None of the bundled adapters implements this yet,
    /// so the call fails with [`CogentError::AllProvidersFailed`] until a
    /// custom adapter overrides `generate_video`; the surface exists so such
    /// adapters get the same rate-limit, cache, and accounting discipline.
    pub async fn generate_video(
        &self,
        prompt: &str,
        options: &ContentOptions,
    ) -> CogentResult<GeneratedContent> {
        let key = CacheStore::key("generate_video", &(prompt, options))?;
        self.run("generate_video", key, ChainCall::Video { prompt, options })
            .await
    }

    /// Mixed text/image understanding.
    pub async fn understand_multimodal(
        &self,
        parts: &[MediaPart],
        options: &ContentOptions,
    ) -> CogentResult<GeneratedContent> {
        let key = CacheStore::key("understand_multimodal", &(parts, options))?;
        self.run(
            "understand_multimodal",
            key,
            ChainCall::Multimodal { parts, options },
        )
        .await
    }

    /// Read-only aggregate over the usage event buffer.
    pub fn usage_stats(&self) -> UsageStats {
        self.usage.stats()
    }

    /// Drops every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of configured providers in the chain.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// The rate-limit → cache → fallback discipline shared by every variant.
    async fn run(
        &self,
        function: &str,
        cache_key: String,
        call: ChainCall<'_>,
    ) -> CogentResult<GeneratedContent> {
        // Rate check happens before any cache bookkeeping: a rejected caller
        // must leave both counters and cache untouched.
        self.rate_limiter.check()?;

        if self.cache_enabled {
            if let Some(mut hit) = self.cache.get(&cache_key) {
                debug!(function, "Cache hit");
                hit.cached = true;
                return Ok(hit);
            }
        }

        let mut last_err: Option<CogentError> = None;

        for adapter in &self.providers {
            let start = Instant::now();
            let result = match &call {
                ChainCall::Complete(request) => adapter.complete(request).await,
                ChainCall::Image { prompt, options } => {
                    adapter.generate_image(prompt, options).await
                }
                ChainCall::Video { prompt, options } => {
                    adapter.generate_video(prompt, options).await
                }
                ChainCall::Multimodal { parts, options } => {
                    adapter.understand_multimodal(parts, options).await
                }
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(completion) => {
                    let cost =
                        self.costs
                            .cost(adapter.name(), adapter.model(), completion.tokens_used);

                    self.usage.record(UsageEvent {
                        id: Uuid::new_v4(),
                        timestamp: Utc::now(),
                        provider: adapter.name().to_string(),
                        model: adapter.model().to_string(),
                        function: function.to_string(),
                        tokens_used: completion.tokens_used,
                        cost,
                        duration_ms,
                        success: true,
                    });

                    let content = GeneratedContent {
                        content: completion.text,
                        confidence: DEFAULT_CONFIDENCE,
                        provider: adapter.name().to_string(),
                        model: adapter.model().to_string(),
                        tokens_used: completion.tokens_used,
                        cost,
                        cached: false,
                    };

                    if self.cache_enabled {
                        self.cache.insert(cache_key, content.clone(), None);
                    }
                    self.rate_limiter.record(cost);

                    debug!(
                        function,
                        provider = adapter.name(),
                        tokens = completion.tokens_used,
                        cost,
                        "Generation served"
                    );
                    return Ok(content);
                }
                Err(e) => {
                    // Local recovery: fall through to the next provider.
                    warn!(
                        function,
                        provider = adapter.name(),
                        error = %e,
                        "Provider failed, trying next in chain"
                    );
                    last_err = Some(e);
                }
            }
        }

        self.usage.record(UsageEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            provider: "none".to_string(),
            model: String::new(),
            function: function.to_string(),
            tokens_used: 0,
            cost: 0.0,
            duration_ms: 0,
            success: false,
        });

        Err(CogentError::AllProvidersFailed(
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no providers configured".to_string()),
        ))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, RateLimitConfig};
    use async_trait::async_trait;
    use cogent_core::Completion;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A scripted adapter: pops results front-first, counts calls.
    struct MockAdapter {
        name: &'static str,
        model: &'static str,
        results: Mutex<Vec<CogentResult<Completion>>>,
        calls: AtomicU32,
        supports_images: bool,
    }

    impl MockAdapter {
        fn new(name: &'static str, results: Vec<CogentResult<Completion>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                model: "mock-model",
                results: Mutex::new(results),
                calls: AtomicU32::new(0),
                supports_images: false,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn next_result(&self) -> CogentResult<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut results = self.results.lock();
            if results.is_empty() {
                Ok(Completion {
                    text: format!("{} default", self.name),
                    tokens_used: 100,
                })
            } else {
                results.remove(0)
            }
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockAdapter {
        fn name(&self) -> &str {
            self.name
        }

        fn model(&self) -> &str {
            self.model
        }

        async fn complete(&self, _request: &CompletionRequest) -> CogentResult<Completion> {
            self.next_result()
        }

        async fn generate_image(
            &self,
            _prompt: &str,
            _options: &ContentOptions,
        ) -> CogentResult<Completion> {
            if self.supports_images {
                self.next_result()
            } else {
                Err(CogentError::Provider(format!(
                    "{}: image generation not supported",
                    self.name
                )))
            }
        }
    }

    fn config(per_minute: u32, cache_enabled: bool, ttl_secs: u64) -> ServiceConfig {
        ServiceConfig {
            providers: Vec::new(),
            rate_limits: RateLimitConfig {
                requests_per_minute: per_minute,
                requests_per_hour: 1000,
                requests_per_day: 10_000,
                daily_cost_cap: 100.0,
            },
            cache: CacheConfig {
                enabled: cache_enabled,
                ttl_secs,
            },
        }
    }

    fn ok(text: &str, tokens: u64) -> CogentResult<Completion> {
        Ok(Completion {
            text: text.into(),
            tokens_used: tokens,
        })
    }

    fn fail(msg: &str) -> CogentResult<Completion> {
        Err(CogentError::Provider(msg.into()))
    }

    // ── Fallback short-circuit ───────────────────────────────────────────

    #[tokio::test]
    async fn first_success_short_circuits_the_chain() {
        let a = MockAdapter::new("openai", vec![ok("from a", 50)]);
        let b = MockAdapter::new("google", vec![]);
        let c = MockAdapter::new("anthropic", vec![]);

        let orchestrator = GenerationOrchestrator::with_providers(
            vec![a.clone(), b.clone(), c.clone()],
            &config(100, true, 3600),
        );

        let result = orchestrator
            .generate("hello", &ContentOptions::default())
            .await
            .unwrap();
        assert_eq!(result.content, "from a");
        assert_eq!(result.provider, "openai");
        assert!(!result.cached);

        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 0);
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test]
    async fn chain_falls_through_failed_providers() {
        let a = MockAdapter::new("openai", vec![fail("503 from a")]);
        let b = MockAdapter::new("google", vec![fail("timeout from b")]);
        let c = MockAdapter::new("anthropic", vec![ok("from c", 80)]);

        let orchestrator = GenerationOrchestrator::with_providers(
            vec![a.clone(), b.clone(), c.clone()],
            &config(100, true, 3600),
        );

        let result = orchestrator
            .generate("hello", &ContentOptions::default())
            .await
            .unwrap();
        assert_eq!(result.provider, "anthropic");
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
        assert_eq!(c.calls(), 1);
    }

    #[tokio::test]
    async fn all_failures_wrap_the_last_error() {
        let a = MockAdapter::new("openai", vec![fail("first error")]);
        let b = MockAdapter::new("google", vec![fail("last error")]);

        let orchestrator = GenerationOrchestrator::with_providers(
            vec![a, b],
            &config(100, true, 3600),
        );

        let err = orchestrator
            .generate("hello", &ContentOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CogentError::AllProvidersFailed(_)));
        assert!(err.to_string().contains("last error"));

        // One failure event with provider "none".
        let stats = orchestrator.usage_stats();
        assert_eq!(stats.total_requests, 1);
        assert_eq!(stats.success_rate, 0.0);
        assert!(stats.provider_breakdown.contains_key("none"));
    }

    // ── Cache behaviour ──────────────────────────────────────────────────

    #[tokio::test]
    async fn cache_hit_bypasses_providers() {
        let a = MockAdapter::new("openai", vec![ok("cached body", 50)]);
        let orchestrator =
            GenerationOrchestrator::with_providers(vec![a.clone()], &config(100, true, 3600));

        let first = orchestrator
            .generate("same prompt", &ContentOptions::default())
            .await
            .unwrap();
        assert!(!first.cached);

        let second = orchestrator
            .generate("same prompt", &ContentOptions::default())
            .await
            .unwrap();
        assert!(second.cached);
        assert_eq!(second.content, "cached body");

        // Provider invoked exactly once; no second usage event either.
        assert_eq!(a.calls(), 1);
        assert_eq!(orchestrator.usage_stats().total_requests, 1);
    }

    #[tokio::test]
    async fn expired_cache_entries_hit_providers_again() {
        let a = MockAdapter::new("openai", vec![ok("one", 10), ok("two", 10)]);
        // 0-second TTL: every entry is expired by the next read.
        let orchestrator =
            GenerationOrchestrator::with_providers(vec![a.clone()], &config(100, true, 0));

        let first = orchestrator
            .generate("p", &ContentOptions::default())
            .await
            .unwrap();
        let second = orchestrator
            .generate("p", &ContentOptions::default())
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(!second.cached);
        assert_eq!(a.calls(), 2);
    }

    #[tokio::test]
    async fn cache_disabled_always_invokes_providers() {
        let a = MockAdapter::new("openai", vec![]);
        let orchestrator =
            GenerationOrchestrator::with_providers(vec![a.clone()], &config(100, false, 3600));

        orchestrator
            .generate("p", &ContentOptions::default())
            .await
            .unwrap();
        orchestrator
            .generate("p", &ContentOptions::default())
            .await
            .unwrap();
        assert_eq!(a.calls(), 2);
    }

    // ── Rate limiting ────────────────────────────────────────────────────

    #[tokio::test]
    async fn rate_limit_stops_the_third_call() {
        let a = MockAdapter::new("openai", vec![]);
        // Cache disabled so each call reaches the provider.
        let orchestrator =
            GenerationOrchestrator::with_providers(vec![a.clone()], &config(2, false, 3600));

        orchestrator
            .generate("one", &ContentOptions::default())
            .await
            .unwrap();
        orchestrator
            .generate("two", &ContentOptions::default())
            .await
            .unwrap();

        let err = orchestrator
            .generate("three", &ContentOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CogentError::RateLimited(_)));
        assert_eq!(a.calls(), 2);
    }

    #[tokio::test]
    async fn rate_limited_call_never_touches_cache_or_usage() {
        let a = MockAdapter::new("openai", vec![]);
        let orchestrator =
            GenerationOrchestrator::with_providers(vec![a.clone()], &config(1, true, 3600));

        orchestrator
            .generate("only", &ContentOptions::default())
            .await
            .unwrap();
        let usage_before = orchestrator.usage_stats().total_requests;

        let err = orchestrator
            .generate("rejected", &ContentOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CogentError::RateLimited(_)));
        assert_eq!(orchestrator.usage_stats().total_requests, usage_before);
        assert_eq!(a.calls(), 1);
    }

    // ── Cost accounting ──────────────────────────────────────────────────

    #[tokio::test]
    async fn cost_accumulates_from_the_rate_table() {
        let a = MockAdapter::new("openai", vec![ok("x", 2000), ok("y", 2000)]);

        let mut costs = CostTable::new(CostTable::DEFAULT_RATE);
        costs.set_rate("openai", "mock-model", 0.03);

        let orchestrator =
            GenerationOrchestrator::with_providers(vec![a], &config(100, false, 3600))
                .with_cost_table(costs);

        let first = orchestrator
            .generate("one", &ContentOptions::default())
            .await
            .unwrap();
        assert!((first.cost - 0.06).abs() < 1e-12);

        orchestrator
            .generate("two", &ContentOptions::default())
            .await
            .unwrap();

        let stats = orchestrator.usage_stats();
        assert!((stats.total_cost - 0.12).abs() < 1e-12);
        assert_eq!(stats.average_tokens_used, 2000.0);
    }

    // ── Specialized variants ─────────────────────────────────────────────

    #[tokio::test]
    async fn unsupported_modality_falls_to_the_next_provider() {
        let text_only = MockAdapter::new("anthropic", vec![]);
        let with_images = Arc::new(MockAdapter {
            name: "openai",
            model: "mock-model",
            results: Mutex::new(vec![ok("https://img.example/1.png", 0)]),
            calls: AtomicU32::new(0),
            supports_images: true,
        });

        let orchestrator = GenerationOrchestrator::with_providers(
            vec![text_only.clone(), with_images.clone()],
            &config(100, true, 3600),
        );

        let result = orchestrator
            .generate_image("a crab", &ContentOptions::default())
            .await
            .unwrap();
        assert_eq!(result.provider, "openai");
        assert_eq!(result.content, "https://img.example/1.png");
        assert_eq!(with_images.calls(), 1);
    }

    #[tokio::test]
    async fn video_fails_chain_wide_until_an_adapter_implements_it() {
        // No bundled adapter overrides generate_video; a healthy text chain
        // still exhausts with the default unsupported error.
        let a = MockAdapter::new("openai", vec![]);
        let b = MockAdapter::new("anthropic", vec![]);
        let orchestrator = GenerationOrchestrator::with_providers(
            vec![a.clone(), b.clone()],
            &config(100, true, 3600),
        );

        let err = orchestrator
            .generate_video("a crab walking", &ContentOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CogentError::AllProvidersFailed(_)));
        assert!(err.to_string().contains("video generation not supported"));
        // The default stubs never reach the scripted completion path.
        assert_eq!(a.calls(), 0);
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn reasoning_and_generate_cache_independently() {
        let a = MockAdapter::new("openai", vec![ok("gen", 10), ok("reason", 10)]);
        let orchestrator =
            GenerationOrchestrator::with_providers(vec![a.clone()], &config(100, true, 3600));

        orchestrator
            .generate("same text", &ContentOptions::default())
            .await
            .unwrap();
        let reasoned = orchestrator
            .complex_reasoning("same text", None)
            .await
            .unwrap();

        // Different function kind means a different cache key.
        assert!(!reasoned.cached);
        assert_eq!(a.calls(), 2);
    }
}
