//! Core types and error definitions for the Cogent orchestration layer.
//!
//! This crate provides the foundational types shared across all Cogent
//! crates: the unified error taxonomy, generation request/response types,
//! usage accounting records, and the event bus that replaces ad-hoc
//! emitter-style pub/sub with an explicit, injectable abstraction.
//!
//! # Main types
//!
//! - [`CogentError`] — Unified error enum for all Cogent subsystems.
//! - [`CogentResult`] — Convenience alias for `Result<T, CogentError>`.
//! - [`GenerationRequest`] / [`GeneratedContent`] — The generation API surface.
//! - [`ContentOptions`] — Caller-supplied generation knobs.
//! - [`UsageEvent`] / [`UsageStats`] — Append-only usage accounting.
//! - [`Event`] / [`EventBus`] — Broadcast lifecycle events.

/// Generation request/response and usage accounting types.
pub mod content;
/// Lifecycle events and the broadcast event bus.
pub mod events;

pub use content::{
    Completion, CompletionRequest, ContentOptions, GeneratedContent, GenerationRequest, MediaPart,
    ProviderUsage, UsageEvent, UsageStats,
};
pub use events::{Event, EventBus};

/// Top-level error type for the Cogent orchestration layer.
///
/// The first seven variants form the caller-visible taxonomy; the rest are
/// ambient plumbing errors (configuration, transport, serialization).
#[derive(Debug, thiserror::Error)]
pub enum CogentError {
    /// A rate-limit ceiling was breached. The message names the breached
    /// dimension (minute/hour/day request count, or daily cost cap).
    /// Recoverable by caller backoff.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// A single provider adapter failed. Recovered locally by falling
    /// through the chain; never surfaced to the orchestrator's caller.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Every configured provider in the fallback chain failed. Wraps the
    /// last underlying provider error.
    #[error("All providers failed: {0}")]
    AllProvidersFailed(String),

    /// The reasoning call returned a malformed or unusable plan.
    /// Terminal for the task.
    #[error("Planning failure: {0}")]
    Planning(String),

    /// A step's declared dependency never completed. Terminal for the task.
    #[error("Dependency unmet: {0}")]
    DependencyUnmet(String),

    /// A step references a tool that is not registered. Terminal for the task.
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// No registered agent was eligible for the task at assignment time.
    #[error("No suitable agent: {0}")]
    NoSuitableAgent(String),

    /// An error originating from agent task execution.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from an outbound HTTP request (e.g. a provider API call).
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`CogentError`].
pub type CogentResult<T> = Result<T, CogentError>;
