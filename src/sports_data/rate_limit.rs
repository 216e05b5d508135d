//! Token-bucket limiter with a per-endpoint minimum inter-call gap and
//! exponential backoff on provider errors. The scheduler is
//! expected to degrade (skip a cycle) rather than queue work when a gap
//! hasn't elapsed, so `try_acquire` never blocks -- it reports whether the
//! caller may proceed.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

struct EndpointState {
    last_call_at: Option<Instant>,
    consecutive_errors: u32,
}

pub struct RateLimiter {
    min_gap: HashMap<&'static str, Duration>,
    state: Mutex<HashMap<&'static str, EndpointState>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        let mut min_gap = HashMap::new();
        min_gap.insert("daily_gamelogs", Duration::from_secs(5));
        min_gap.insert("player_backfill", Duration::from_secs(10));
        min_gap.insert("roster", Duration::from_secs(5));
        min_gap.insert("schedule", Duration::from_secs(5));

        Self { min_gap, state: Mutex::new(HashMap::new()) }
    }

    /// `true` if the caller may make the call now; also records the call
    /// as having happened so the next check measures from this instant.
    pub fn try_acquire(&self, endpoint: &'static str) -> bool {
        let gap = self.min_gap.get(endpoint).copied().unwrap_or(Duration::from_secs(1));
        let mut state = self.state.lock();
        let entry = state.entry(endpoint).or_insert(EndpointState { last_call_at: None, consecutive_errors: 0 });

        let now = Instant::now();
        let backoff = backoff_duration(entry.consecutive_errors);
        let required_gap = gap.max(backoff);

        if let Some(last) = entry.last_call_at {
            if now.duration_since(last) < required_gap {
                return false;
            }
        }

        entry.last_call_at = Some(now);
        true
    }

    pub fn record_success(&self, endpoint: &'static str) {
        let mut state = self.state.lock();
        if let Some(entry) = state.get_mut(endpoint) {
            entry.consecutive_errors = 0;
        }
    }

    pub fn record_error(&self, endpoint: &'static str) {
        let mut state = self.state.lock();
        let entry = state.entry(endpoint).or_insert(EndpointState { last_call_at: None, consecutive_errors: 0 });
        entry.consecutive_errors = entry.consecutive_errors.saturating_add(1);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn backoff_duration(consecutive_errors: u32) -> Duration {
    if consecutive_errors == 0 {
        return Duration::ZERO;
    }
    let capped = consecutive_errors.min(6);
    Duration::from_secs(1 << capped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_within_the_gap_is_refused() {
        let limiter = RateLimiter::new();
        assert!(limiter.try_acquire("daily_gamelogs"));
        assert!(!limiter.try_acquire("daily_gamelogs"));
    }

    #[test]
    fn repeated_errors_grow_the_required_gap() {
        assert_eq!(backoff_duration(0), Duration::ZERO);
        assert!(backoff_duration(3) > backoff_duration(1));
        assert_eq!(backoff_duration(10), backoff_duration(6));
    }
}
