//! Sliding-window rate limiter
//!
//! Keys are free-form strings: client IPs for lead submissions, lowercased
//! usernames for failed logins. State is process-local, so limits are per
//! instance. The number of tracked keys is capped; stale keys are pruned
//! when a new key would exceed the cap.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

const DEFAULT_MAX_KEYS: usize = 10_000;

type Attempts = HashMap<String, Vec<DateTime<Utc>>>;

pub struct RateLimiter {
    max: usize,
    window: Duration,
    max_keys: usize,
    attempts: RwLock<Attempts>,
}

impl RateLimiter {
    /// Allow at most `max` attempts per key within `window`
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            max_keys: DEFAULT_MAX_KEYS,
            attempts: RwLock::new(HashMap::new()),
        }
    }

    /// Cap the number of distinct keys tracked at once
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Lead submissions: 5 per minute per client IP
    pub fn for_leads() -> Self {
        Self::new(5, Duration::minutes(1))
    }

    /// Failed logins: 5 per 15 minutes per username
    pub fn for_logins() -> Self {
        Self::new(5, Duration::minutes(15))
    }

    pub async fn is_limited(&self, key: &str) -> bool {
        let cutoff = Utc::now() - self.window;
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(key) {
            Some(times) => {
                times.retain(|time| *time > cutoff);
                times.len() >= self.max
            }
            None => false,
        }
    }

    pub async fn record(&self, key: &str) {
        let now = Utc::now();
        let mut attempts = self.attempts.write().await;
        if !self.make_room(&mut attempts, key, now - self.window) {
            tracing::warn!("Rate limiter full, not tracking '{}'", key);
            return;
        }
        attempts.entry(key.to_string()).or_default().push(now);
    }

    /// Record an attempt unless the key is already limited.
    ///
    /// Returns `false` (and records nothing) when the limit is reached, or
    /// when the key is new and the limiter is full of live keys. The check
    /// and the insert happen under one lock.
    pub async fn check_and_record(&self, key: &str) -> bool {
        let now = Utc::now();
        let cutoff = now - self.window;
        let mut attempts = self.attempts.write().await;
        if !self.make_room(&mut attempts, key, cutoff) {
            tracing::warn!("Rate limiter full, refusing new key '{}'", key);
            return false;
        }
        let times = attempts.entry(key.to_string()).or_default();
        times.retain(|time| *time > cutoff);
        if times.len() >= self.max {
            return false;
        }
        times.push(now);
        true
    }

    pub async fn clear(&self, key: &str) {
        self.attempts.write().await.remove(key);
    }

    /// Drop attempts older than the window and empty keys
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        prune(&mut *self.attempts.write().await, cutoff);
    }

    /// Whether `key` may be tracked, pruning stale keys when at the cap
    fn make_room(&self, attempts: &mut Attempts, key: &str, cutoff: DateTime<Utc>) -> bool {
        if attempts.len() < self.max_keys || attempts.contains_key(key) {
            return true;
        }
        prune(attempts, cutoff);
        attempts.len() < self.max_keys
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.attempts.read().await.len()
    }
}

fn prune(attempts: &mut Attempts, cutoff: DateTime<Utc>) {
    attempts.retain(|_, times| {
        times.retain(|time| *time > cutoff);
        !times.is_empty()
    });
}
