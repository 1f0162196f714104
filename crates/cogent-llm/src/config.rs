use cogent_core::{CogentError, CogentResult};
use serde::{Deserialize, Serialize};

/// Supported provider backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions API.
    OpenAi,
    /// Google Generative Language API (Gemini).
    Google,
    /// Anthropic messages API.
    Anthropic,
}

impl ProviderKind {
    /// Wire name used in accounting, cache keys, and logs.
    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Google => "google",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// Default API base URL for the provider.
    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Google => "https://generativelanguage.googleapis.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Configuration for one provider in the fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Which vendor this entry targets.
    pub provider: ProviderKind,
    /// Model id to request (e.g. "gpt-4", "gemini-pro", "claude-3-sonnet").
    pub model: String,
    /// API key. An empty key marks the provider as unconfigured; the chain
    /// skips it.
    pub api_key: String,
    /// Base URL override (self-hosted gateways, test servers).
    #[serde(default)]
    pub api_base_url: Option<String>,
}

impl ProviderConfig {
    /// Effective base URL: the override when present, the vendor default
    /// otherwise.
    pub fn base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    /// Whether this provider has a usable key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Request-volume and spend ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per sliding minute.
    #[serde(default = "default_per_minute")]
    pub requests_per_minute: u32,
    /// Maximum requests per sliding hour.
    #[serde(default = "default_per_hour")]
    pub requests_per_hour: u32,
    /// Maximum requests per sliding day.
    #[serde(default = "default_per_day")]
    pub requests_per_day: u32,
    /// Maximum cumulative spend per rolling 24h, in account currency.
    #[serde(default = "default_cost_cap")]
    pub daily_cost_cap: f64,
}

fn default_per_minute() -> u32 {
    60
}

fn default_per_hour() -> u32 {
    1000
}

fn default_per_day() -> u32 {
    10_000
}

fn default_cost_cap() -> f64 {
    50.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_per_minute(),
            requests_per_hour: default_per_hour(),
            requests_per_day: default_per_day(),
            daily_cost_cap: default_cost_cap(),
        }
    }
}

/// Result-cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether generation results are memoized at all.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Default entry time-to-live in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

/// Top-level service configuration.
///
/// The provider list order is the fallback order: the orchestrator tries
/// providers front to back and stops at the first success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Providers in fallback order.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Rate ceilings.
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
    /// Cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl ServiceConfig {
    /// Parses a TOML configuration document.
    pub fn from_toml(raw: &str) -> CogentResult<Self> {
        toml::from_str(raw).map_err(|e| CogentError::Config(e.to_string()))
    }

    /// Builds a configuration from environment variables.
    ///
    /// Reads `OPENAI_API_KEY`, `GOOGLE_API_KEY`, and `ANTHROPIC_API_KEY`;
    /// providers without a key are omitted. Model ids come from
    /// `OPENAI_MODEL` / `GOOGLE_MODEL` / `ANTHROPIC_MODEL` with sensible
    /// defaults. The fallback order is fixed: openai, google, anthropic.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// The environment-building logic behind [`ServiceConfig::from_env`],
    /// over an arbitrary variable lookup so it can be tested without
    /// mutating process state.
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut providers = Vec::new();

        if let Some(key) = var("OPENAI_API_KEY") {
            providers.push(ProviderConfig {
                provider: ProviderKind::OpenAi,
                model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4".into()),
                api_key: key,
                api_base_url: None,
            });
        }
        if let Some(key) = var("GOOGLE_API_KEY") {
            providers.push(ProviderConfig {
                provider: ProviderKind::Google,
                model: var("GOOGLE_MODEL").unwrap_or_else(|| "gemini-pro".into()),
                api_key: key,
                api_base_url: None,
            });
        }
        if let Some(key) = var("ANTHROPIC_API_KEY") {
            providers.push(ProviderConfig {
                provider: ProviderKind::Anthropic,
                model: var("ANTHROPIC_MODEL").unwrap_or_else(|| "claude-3-sonnet".into()),
                api_key: key,
                api_base_url: None,
            });
        }

        let rate_limits = RateLimitConfig {
            requests_per_minute: parse_or(
                var("COGENT_REQUESTS_PER_MINUTE"),
                default_per_minute(),
            ),
            requests_per_hour: parse_or(var("COGENT_REQUESTS_PER_HOUR"), default_per_hour()),
            requests_per_day: parse_or(var("COGENT_REQUESTS_PER_DAY"), default_per_day()),
            daily_cost_cap: parse_or(var("COGENT_DAILY_COST_CAP"), default_cost_cap()),
        };

        let cache = CacheConfig {
            enabled: var("COGENT_CACHE_ENABLED")
                .map(|v| v != "0" && v.to_lowercase() != "false")
                .unwrap_or_else(default_cache_enabled),
            ttl_secs: parse_or(var("COGENT_CACHE_TTL_SECS"), default_cache_ttl()),
        };

        Self {
            providers,
            rate_limits,
            cache,
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_toml_with_defaults() {
        let raw = r#"
            [[providers]]
            provider = "openai"
            model = "gpt-4"
            api_key = "sk-test"

            [[providers]]
            provider = "anthropic"
            model = "claude-3-sonnet"
            api_key = ""

            [rate_limits]
            requests_per_minute = 5
        "#;

        let config = ServiceConfig::from_toml(raw).unwrap();
        assert_eq!(config.providers.len(), 2);
        assert!(config.providers[0].is_configured());
        assert!(!config.providers[1].is_configured());
        assert_eq!(config.rate_limits.requests_per_minute, 5);
        // Unspecified ceilings fall back to defaults.
        assert_eq!(config.rate_limits.requests_per_day, 10_000);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 3600);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = ServiceConfig::from_toml("providers = 3").unwrap_err();
        assert!(err.to_string().starts_with("Config error:"));
    }

    #[test]
    fn base_url_override_wins() {
        let config = ProviderConfig {
            provider: ProviderKind::OpenAi,
            model: "gpt-4".into(),
            api_key: "k".into(),
            api_base_url: Some("http://localhost:9000".into()),
        };
        assert_eq!(config.base_url(), "http://localhost:9000");

        let config = ProviderConfig {
            api_base_url: None,
            ..config
        };
        assert_eq!(config.base_url(), "https://api.openai.com");
    }

    #[test]
    fn provider_kind_names() {
        assert_eq!(ProviderKind::OpenAi.name(), "openai");
        assert_eq!(ProviderKind::Google.to_string(), "google");
        assert_eq!(ProviderKind::Anthropic.name(), "anthropic");
    }

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn env_lookup_keeps_the_fixed_fallback_order() {
        // Anthropic listed first in the environment, but the chain order is
        // openai → google → anthropic regardless; google has no key and is
        // omitted.
        let config = ServiceConfig::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("OPENAI_API_KEY", "sk-oai"),
            ("OPENAI_MODEL", "gpt-4-turbo"),
        ]));

        assert_eq!(config.providers.len(), 2);
        assert_eq!(config.providers[0].provider, ProviderKind::OpenAi);
        assert_eq!(config.providers[0].model, "gpt-4-turbo");
        assert_eq!(config.providers[0].api_key, "sk-oai");
        assert_eq!(config.providers[1].provider, ProviderKind::Anthropic);
        // Unset model falls back to the vendor default.
        assert_eq!(config.providers[1].model, "claude-3-sonnet");
    }

    #[test]
    fn env_lookup_overrides_ceilings_and_cache() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("COGENT_REQUESTS_PER_MINUTE", "7"),
            ("COGENT_DAILY_COST_CAP", "12.5"),
            ("COGENT_CACHE_ENABLED", "false"),
            ("COGENT_CACHE_TTL_SECS", "60"),
        ]));

        assert!(config.providers.is_empty());
        assert_eq!(config.rate_limits.requests_per_minute, 7);
        // Untouched ceilings keep their defaults.
        assert_eq!(config.rate_limits.requests_per_hour, 1000);
        assert_eq!(config.rate_limits.requests_per_day, 10_000);
        assert!((config.rate_limits.daily_cost_cap - 12.5).abs() < f64::EPSILON);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 60);
    }

    #[test]
    fn env_lookup_ignores_unparseable_numbers() {
        let config =
            ServiceConfig::from_lookup(lookup(&[("COGENT_REQUESTS_PER_MINUTE", "plenty")]));
        assert_eq!(config.rate_limits.requests_per_minute, 60);
    }
}
