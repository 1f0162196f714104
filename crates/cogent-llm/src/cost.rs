use std::collections::HashMap;

/// Per-provider, per-model token pricing.
///
/// Rates are account currency per 1000 tokens. A model missing from the
/// table falls back to a conservative flat rate instead of failing, so a
/// newly released model never breaks accounting.
pub struct CostTable {
    rates: HashMap<(String, String), f64>,
    default_rate: f64,
}

impl CostTable {
    /// Fallback per-1K rate for unknown models.
    pub const DEFAULT_RATE: f64 = 0.01;

    /// Creates an empty table with the given fallback rate.
    pub fn new(default_rate: f64) -> Self {
        Self {
            rates: HashMap::new(),
            default_rate,
        }
    }

    /// Sets the per-1K rate for one provider/model pair.
    pub fn set_rate(&mut self, provider: impl Into<String>, model: impl Into<String>, rate: f64) {
        self.rates.insert((provider.into(), model.into()), rate);
    }

    /// Per-1K rate for the pair, or the fallback when unknown.
    pub fn rate(&self, provider: &str, model: &str) -> f64 {
        self.rates
            .get(&(provider.to_string(), model.to_string()))
            .copied()
            .unwrap_or(self.default_rate)
    }

    /// Cost of a call: `(tokens / 1000) × rate`.
    pub fn cost(&self, provider: &str, model: &str, tokens_used: u64) -> f64 {
        (tokens_used as f64 / 1000.0) * self.rate(provider, model)
    }
}

impl Default for CostTable {
    /// Seeds the published per-1K rates for the common models of each vendor.
    fn default() -> Self {
        let mut table = Self::new(Self::DEFAULT_RATE);

        table.set_rate("openai", "gpt-4", 0.03);
        table.set_rate("openai", "gpt-4-turbo", 0.01);
        table.set_rate("openai", "gpt-3.5-turbo", 0.002);

        table.set_rate("google", "gemini-pro", 0.000_25);
        table.set_rate("google", "gemini-1.5-pro", 0.003_5);

        table.set_rate("anthropic", "claude-3-opus", 0.015);
        table.set_rate("anthropic", "claude-3-sonnet", 0.003);
        table.set_rate("anthropic", "claude-3-haiku", 0.000_25);

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_uses_table_rate() {
        let table = CostTable::default();
        // 2000 tokens at 0.03/1K.
        assert!((table.cost("openai", "gpt-4", 2000) - 0.06).abs() < 1e-12);
    }

    #[test]
    fn unknown_model_uses_flat_default() {
        let table = CostTable::default();
        assert_eq!(table.rate("openai", "gpt-99-nano"), CostTable::DEFAULT_RATE);
        assert!((table.cost("openai", "gpt-99-nano", 1000) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn zero_tokens_cost_nothing() {
        let table = CostTable::default();
        assert_eq!(table.cost("anthropic", "claude-3-opus", 0), 0.0);
    }

    #[test]
    fn custom_rates_override() {
        let mut table = CostTable::default();
        table.set_rate("openai", "gpt-4", 0.05);
        assert!((table.cost("openai", "gpt-4", 1000) - 0.05).abs() < 1e-12);
    }
}
