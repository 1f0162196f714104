//! Provider orchestration: rate limiting, caching, cost accounting, and the
//! provider fallback chain.
//!
//! This crate turns a set of unreliable, rate-limited, metered LLM backends
//! into a single dependable generation capability. Callers go through
//! [`GenerationOrchestrator`], which enforces rate ceilings before any work,
//! serves cache hits without touching a provider, and otherwise walks the
//! configured provider chain until one succeeds.
//!
//! # Main types
//!
//! - [`GenerationOrchestrator`] — The `generate()` entry point and its
//!   specialized variants.
//! - [`ProviderAdapter`] — Uniform trait each vendor backend implements.
//! - [`RateLimiter`] — Sliding minute/hour/day windows plus a daily cost cap.
//! - [`CacheStore`] — TTL-keyed memoization of generation results.
//! - [`CostTable`] — Per-provider/per-model token pricing.
//! - [`ServiceConfig`] — Configuration surface (TOML or environment).

/// TTL-keyed result cache.
pub mod cache;
/// Configuration types and loading.
pub mod config;
/// Per-model token pricing.
pub mod cost;
/// The fallback-chain orchestrator.
pub mod orchestrator;
/// Vendor provider adapters.
pub mod providers;
/// Request-volume and spend ceilings.
pub mod rate_limit;
/// Bounded usage-event log and reporting.
pub mod usage;

pub use cache::CacheStore;
pub use config::{CacheConfig, ProviderConfig, ProviderKind, RateLimitConfig, ServiceConfig};
pub use cost::CostTable;
pub use orchestrator::GenerationOrchestrator;
pub use providers::{
    AnthropicAdapter, GoogleAdapter, OpenAiAdapter, ProviderAdapter,
};
pub use rate_limit::RateLimiter;
pub use usage::UsageLog;
