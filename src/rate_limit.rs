//! Sliding-window rate limiting
//!
//! A [`RateLimiter`] is an ordinary value owned by whoever injects it (the
//! ticket store takes one through [`TicketStore::with_rate_limiter`]). It keeps
//! the request timestamps of at most `capacity` keys; keys whose window has
//! fully elapsed are evicted, and when the map is still full the least
//! recently active key is dropped.
//!
//! [`TicketStore::with_rate_limiter`]: crate::store::TicketStore::with_rate_limiter

use crate::error::{Result, TicketDeskError};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Limits applied by a [`RateLimiter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum requests allowed per key inside one window
    pub max_requests: usize,
    /// Length of the sliding window
    pub window: Duration,
    /// Maximum number of keys tracked at once
    pub capacity: usize,
}

impl RateLimitPolicy {
    pub const fn per_minute(max_requests: usize) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(60),
            capacity: 10_000,
        }
    }
}

/// Per-key sliding-window request counter
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub const fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Record a request for `key` now
    pub fn check(&self, key: &str) -> Result<()> {
        self.check_at(key, Instant::now())
    }

    /// Record a request for `key` at `now`, rejecting it if the window is full
    pub fn check_at(&self, key: &str, now: Instant) -> Result<()> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| TicketDeskError::Storage("rate limiter lock poisoned".to_string()))?;

        if !windows.contains_key(key) && windows.len() >= self.policy.capacity {
            Self::evict(&mut windows, self.policy.window, now);
            if windows.len() >= self.policy.capacity {
                Self::evict_least_recent(&mut windows);
            }
        }

        let window = windows.entry(key.to_string()).or_default();
        while window
            .front()
            .is_some_and(|&t| now.saturating_duration_since(t) >= self.policy.window)
        {
            window.pop_front();
        }

        if window.len() >= self.policy.max_requests {
            let oldest = window.front().copied().unwrap_or(now);
            let retry_after = self
                .policy
                .window
                .saturating_sub(now.saturating_duration_since(oldest));
            tracing::warn!("Rate limit exceeded for {key}");
            return Err(TicketDeskError::RateLimited {
                key: key.to_string(),
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }

        window.push_back(now);
        Ok(())
    }

    /// Drop every key whose window has fully elapsed
    pub fn evict_expired(&self, now: Instant) -> usize {
        match self.windows.lock() {
            Ok(mut windows) => Self::evict(&mut windows, self.policy.window, now),
            Err(_) => 0,
        }
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }

    fn evict(windows: &mut HashMap<String, VecDeque<Instant>>, ttl: Duration, now: Instant) -> usize {
        let before = windows.len();
        windows.retain(|_, w| {
            w.back()
                .is_some_and(|&last| now.saturating_duration_since(last) < ttl)
        });
        before - windows.len()
    }

    fn evict_least_recent(windows: &mut HashMap<String, VecDeque<Instant>>) {
        let victim = windows
            .iter()
            .min_by_key(|(_, w)| w.back().copied())
            .map(|(k, _)| k.clone());
        if let Some(key) = victim {
            windows.remove(&key);
        }
    }
}
