use cogent_core::{ProviderUsage, UsageEvent, UsageStats};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Bounded append-only log of [`UsageEvent`]s.
///
/// Reporting only: nothing in the orchestrator reads this buffer to make
/// decisions. When full, the oldest events fall off.
pub struct UsageLog {
    events: Mutex<VecDeque<UsageEvent>>,
    capacity: usize,
}

impl UsageLog {
    /// Default retained event count.
    pub const DEFAULT_CAPACITY: usize = 1000;

    /// Creates a log retaining at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
        }
    }

    /// Appends one event, evicting the oldest when at capacity.
    pub fn record(&self, event: UsageEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether the log holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Computes the read-only aggregate over the retained events.
    pub fn stats(&self) -> UsageStats {
        let events = self.events.lock();
        let total = events.len() as u64;
        if total == 0 {
            return UsageStats::default();
        }

        let successes = events.iter().filter(|e| e.success).count() as u64;
        let total_tokens: u64 = events.iter().map(|e| e.tokens_used).sum();
        let total_cost: f64 = events.iter().map(|e| e.cost).sum();

        let mut provider_breakdown: std::collections::HashMap<String, ProviderUsage> =
            std::collections::HashMap::new();
        for event in events.iter() {
            let slot = provider_breakdown.entry(event.provider.clone()).or_default();
            slot.requests += 1;
            slot.tokens_used += event.tokens_used;
            slot.cost += event.cost;
        }

        UsageStats {
            total_requests: total,
            success_rate: successes as f64 / total as f64,
            average_tokens_used: total_tokens as f64 / total as f64,
            total_cost,
            provider_breakdown,
        }
    }
}

impl Default for UsageLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
