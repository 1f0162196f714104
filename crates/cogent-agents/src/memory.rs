use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Maximum retained episodic records per agent. The source system only
/// capped its global usage buffer; per-agent episodic memory grew without
/// bound, so this port bounds it the same way.
pub const EPISODIC_CAPACITY: usize = 1000;

/// Aggregated outcome statistics for one (tool, task type) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPattern {
    /// Successful executions.
    pub successes: u64,
    /// Failed executions.
    pub failures: u64,
    /// Running mean duration over all executions.
    pub avg_duration_ms: f64,
    /// When the pair was last executed.
    pub last_used: DateTime<Utc>,
}

impl ToolPattern {
    /// Total executions recorded.
    pub fn executions(&self) -> u64 {
        self.successes + self.failures
    }
}

/// One episodic record: a single step outcome in chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodicRecord {
    /// Event label, e.g. "step_completed".
    pub event: String,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Arbitrary context captured at the time.
    pub context: serde_json::Value,
    /// "success" or "failure".
    pub outcome: String,
}

/// Per-agent memory: short-term scratch for the current task, long-term
/// pattern statistics, and a bounded episodic log.
///
/// Owned by exactly one agent; persists across that agent's tasks. The
/// long-term statistics feed only the manager's experience bonus — they
/// never block or retry anything automatically.
#[derive(Debug, Default)]
pub struct AgentMemory {
    short_term: HashMap<String, serde_json::Value>,
    long_term: HashMap<String, ToolPattern>,
    episodic: VecDeque<EpisodicRecord>,
}

impl AgentMemory {
    /// Creates an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a short-term scratch value for the current task.
    pub fn remember(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.short_term.insert(key.into(), value);
    }

    /// Reads a short-term scratch value.
    pub fn recall(&self, key: &str) -> Option<&serde_json::Value> {
        self.short_term.get(key)
    }

    /// Drops all short-term state; called at task start.
    pub fn clear_short_term(&mut self) {
        self.short_term.clear();
    }

    /// Records one step outcome: appends an episodic record and folds the
    /// duration into the (tool, task type) pattern's running mean.
    pub fn record_step_outcome(
        &mut self,
        tool: &str,
        task_type: &str,
        success: bool,
        duration_ms: u64,
        context: serde_json::Value,
    ) {
        let now = Utc::now();

        if self.episodic.len() == EPISODIC_CAPACITY {
            self.episodic.pop_front();
        }
        self.episodic.push_back(EpisodicRecord {
            event: if success {
                "step_completed".to_string()
            } else {
                "step_failed".to_string()
            },
            timestamp: now,
            context,
            outcome: if success { "success" } else { "failure" }.to_string(),
        });

        let key = format!("{tool}_{task_type}");
        let pattern = self.long_term.entry(key).or_insert(ToolPattern {
            successes: 0,
            failures: 0,
            avg_duration_ms: 0.0,
            last_used: now,
        });

        if success {
            pattern.successes += 1;
        } else {
            pattern.failures += 1;
        }
        let n = pattern.executions() as f64;
        pattern.avg_duration_ms =
            (pattern.avg_duration_ms * (n - 1.0) + duration_ms as f64) / n;
        pattern.last_used = now;
    }

    /// Pattern statistics for a (tool, task type) pair.
    pub fn pattern(&self, tool: &str, task_type: &str) -> Option<&ToolPattern> {
        self.long_term.get(&format!("{tool}_{task_type}"))
    }

    /// Number of retained episodic records.
    pub fn episodic_len(&self) -> usize {
        self.episodic.len()
    }

    /// Chronological iterator over the episodic log.
    pub fn episodic(&self) -> impl Iterator<Item = &EpisodicRecord> {
        self.episodic.iter()
    }
}
