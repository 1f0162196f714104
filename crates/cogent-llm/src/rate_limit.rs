use crate::config::RateLimitConfig;
use cogent_core::{CogentError, CogentResult};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(86_400);

struct Windows {
    minute: Vec<Instant>,
    hour: Vec<Instant>,
    day: Vec<Instant>,
    daily_cost: f64,
    /// Anchor of the rolling 24h cost window. Set at first use, advanced by
    /// 24h whenever it falls that far behind; not wall-clock midnight.
    cost_anchor: Instant,
}

impl Windows {
    fn prune(&mut self, now: Instant) {
        self.minute.retain(|t| now.duration_since(*t) < MINUTE);
        self.hour.retain(|t| now.duration_since(*t) < HOUR);
        self.day.retain(|t| now.duration_since(*t) < DAY);
        if now.duration_since(self.cost_anchor) >= DAY {
            self.daily_cost = 0.0;
            self.cost_anchor = now;
        }
    }
}

/// Sliding-window request limiter with a rolling daily cost cap.
///
/// `check()` only discards expired timestamps; it never consumes quota, so a
/// rejected call leaves the counters exactly as they were. [`RateLimiter::record`]
/// is the sole mutator and must be called exactly once per provider call that
/// actually happened.
pub struct RateLimiter {
    limits: RateLimitConfig,
    state: Mutex<Windows>,
}

impl RateLimiter {
    /// Creates a limiter with the given ceilings.
    pub fn new(limits: RateLimitConfig) -> Self {
        Self {
            limits,
            state: Mutex::new(Windows {
                minute: Vec::new(),
                hour: Vec::new(),
                day: Vec::new(),
                daily_cost: 0.0,
                cost_anchor: Instant::now(),
            }),
        }
    }

    /// Verifies all four ceilings, in the fixed order minute → hour → day →
    /// cost, so a given violation always yields the same message.
    pub fn check(&self) -> CogentResult<()> {
        let mut state = self.state.lock();
        let now = Instant::now();
        state.prune(now);

        if state.minute.len() >= self.limits.requests_per_minute as usize {
            return Err(CogentError::RateLimited(format!(
                "minute request limit reached ({}/min)",
                self.limits.requests_per_minute
            )));
        }
        if state.hour.len() >= self.limits.requests_per_hour as usize {
            return Err(CogentError::RateLimited(format!(
                "hour request limit reached ({}/hour)",
                self.limits.requests_per_hour
            )));
        }
        if state.day.len() >= self.limits.requests_per_day as usize {
            return Err(CogentError::RateLimited(format!(
                "day request limit reached ({}/day)",
                self.limits.requests_per_day
            )));
        }
        if state.daily_cost >= self.limits.daily_cost_cap {
            return Err(CogentError::RateLimited(format!(
                "daily cost cap reached ({:.2})",
                self.limits.daily_cost_cap
            )));
        }
        Ok(())
    }

    /// Records one performed provider call: increments all three windows and
    /// adds `cost` to the rolling daily total.
    pub fn record(&self, cost: f64) {
        let mut state = self.state.lock();
        let now = Instant::now();
        state.prune(now);
        state.minute.push(now);
        state.hour.push(now);
        state.day.push(now);
        state.daily_cost += cost;
    }

    /// Current rolling-day spend.
    pub fn daily_cost(&self) -> f64 {
        let mut state = self.state.lock();
        state.prune(Instant::now());
        state.daily_cost
    }

    /// Requests currently counted in the sliding minute window.
    pub fn requests_this_minute(&self) -> usize {
        let mut state = self.state.lock();
        state.prune(Instant::now());
        state.minute.len()
    }
}
