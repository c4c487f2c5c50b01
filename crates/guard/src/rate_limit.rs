//! Sliding-window rate limiting
//!
//! Per-identifier timestamp lists, pruned on every access so no identifier
//! holds more than `max_requests` entries. Best-effort and single-process:
//! callers needing cross-process guarantees must externalize this state.

use dashmap::DashMap;
use std::time::{Duration, Instant};

pub struct SlidingWindowLimiter {
    windows: DashMap<String, Vec<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Admission check: prune entries older than `now - window`, then admit
    /// if the remainder is under `max_requests`, recording the new timestamp
    /// only on admission.
    pub fn allow(&self, identifier: &str, max_requests: u32, window: Duration) -> bool {
        self.check(identifier, max_requests, window, Instant::now())
    }

    fn check(&self, identifier: &str, max_requests: u32, window: Duration, now: Instant) -> bool {
        let mut timestamps = self.windows.entry(identifier.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < window);

        if (timestamps.len() as u32) < max_requests {
            timestamps.push(now);
            true
        } else {
            tracing::warn!(identifier, "rate limit exceeded");
            false
        }
    }

    /// Seconds until the oldest recorded request leaves the window. Zero if
    /// the identifier has no recorded requests.
    pub fn retry_after(&self, identifier: &str, window: Duration) -> u64 {
        let Some(timestamps) = self.windows.get(identifier) else {
            return 0;
        };
        let Some(oldest) = timestamps.iter().min() else {
            return 0;
        };
        window
            .saturating_sub(oldest.elapsed())
            .as_secs()
            .max(1)
    }
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Coarse client fingerprint: network address plus a hash of the declared
/// agent string. Not cryptographically strong; abuse mitigation only.
pub fn client_key(addr: &str, agent: &str) -> String {
    format!("{addr}:{:x}", fnv1a(agent.as_bytes()))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourth_call_in_window_rejected() {
        let limiter = SlidingWindowLimiter::new();
        let window = Duration::from_secs(60);
        let now = Instant::now();

        assert!(limiter.check("client", 3, window, now));
        assert!(limiter.check("client", 3, window, now));
        assert!(limiter.check("client", 3, window, now));
        assert!(!limiter.check("client", 3, window, now));
    }

    #[test]
    fn test_admitted_after_window_elapses() {
        let limiter = SlidingWindowLimiter::new();
        let window = Duration::from_secs(60);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check("client", 3, window, start));
        }
        assert!(!limiter.check("client", 3, window, start));

        let later = start + Duration::from_secs(61);
        assert!(limiter.check("client", 3, window, later));
    }

    #[test]
    fn test_identifiers_are_independent() {
        let limiter = SlidingWindowLimiter::new();
        let window = Duration::from_secs(60);
        let now = Instant::now();

        assert!(limiter.check("a", 1, window, now));
        assert!(!limiter.check("a", 1, window, now));
        assert!(limiter.check("b", 1, window, now));
    }

    #[test]
    fn test_pruning_bounds_memory() {
        let limiter = SlidingWindowLimiter::new();
        let window = Duration::from_secs(10);
        let start = Instant::now();

        // Spread many requests over a long period; the stored list never
        // exceeds max_requests
        for i in 0..100u64 {
            let t = start + Duration::from_secs(i * 20);
            limiter.check("client", 3, window, t);
        }
        let stored = limiter.windows.get("client").expect("entry").len();
        assert!(stored <= 3);
    }

    #[test]
    fn test_client_key_is_stable() {
        let a = client_key("10.0.0.1", "mozilla/5.0");
        let b = client_key("10.0.0.1", "mozilla/5.0");
        let c = client_key("10.0.0.1", "curl/8.0");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
