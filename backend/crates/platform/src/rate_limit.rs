//! Rate Limiting Infrastructure
//!
//! Sliding-window quota keyed by an arbitrary string (a principal ID in
//! practice). Each key keeps the instants of its admitted attempts; entries
//! that fall out of the trailing window are pruned on the next check.
//!
//! State lives in process memory only and is lost on restart.

use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum admitted attempts in the window
    pub max_requests: u32,
    /// Trailing window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Attempts still available in the current window
    pub remaining: u32,
    /// When the oldest counted attempt leaves the window
    pub reset_at_ms: i64,
}

/// Trait for rate limit storage backends
#[trait_variant::make(RateLimitStore: Send)]
pub trait LocalRateLimitStore {
    /// Check the quota for `key` and record the attempt if admitted.
    ///
    /// Check and record happen as one step: two concurrent calls for the same
    /// key can never both take the last free slot.
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>>;
}

/// In-memory sliding-window limiter.
///
/// Construct once per process and share behind an `Arc`.
#[derive(Debug, Default)]
pub struct SlidingWindowRateLimiter {
    windows: DashMap<String, Vec<i64>>,
}

impl SlidingWindowRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and record at the current wall-clock time.
    pub fn check_and_record(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        self.check_and_record_at(key, config, Utc::now().timestamp_millis())
    }

    /// Check and record at an explicit instant (milliseconds since epoch).
    pub fn check_and_record_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now_ms: i64,
    ) -> RateLimitResult {
        let window_ms = config.window_ms();
        let max = config.max_requests as usize;

        // The entry guard holds the shard lock until the end of this function.
        let mut entry = self.windows.entry(key.to_owned()).or_default();
        let timestamps = entry.value_mut();

        timestamps.retain(|&t| now_ms - t < window_ms);

        if timestamps.len() >= max {
            let reset_at_ms = timestamps.first().map_or(now_ms, |&t| t + window_ms);
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_at_ms,
            };
        }

        // Keep the sequence sorted even if the wall clock steps backwards.
        let at = timestamps.last().map_or(now_ms, |&last| last.max(now_ms));
        timestamps.push(at);

        RateLimitResult {
            allowed: true,
            remaining: (max - timestamps.len()) as u32,
            reset_at_ms: timestamps[0] + window_ms,
        }
    }

    /// Drop keys with no attempt inside the window. Returns how many were removed.
    pub fn evict_idle(&self, config: &RateLimitConfig) -> usize {
        self.evict_idle_at(config, Utc::now().timestamp_millis())
    }

    pub fn evict_idle_at(&self, config: &RateLimitConfig, now_ms: i64) -> usize {
        let window_ms = config.window_ms();
        let before = self.windows.len();
        self.windows
            .retain(|_, timestamps| timestamps.last().is_some_and(|&t| now_ms - t < window_ms));
        let evicted = before.saturating_sub(self.windows.len());
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.windows.len(), "Evicted idle rate limit keys");
        }
        evicted
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

impl RateLimitStore for SlidingWindowRateLimiter {
    async fn check_and_increment(
        &self,
        key: &str,
        config: &RateLimitConfig,
    ) -> Result<RateLimitResult, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.check_and_record(key, config))
    }
}
