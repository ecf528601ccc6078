//! Rate limiter
//!
//! Sliding one-minute window admission control, independent per backend.
//! Denial is not an error; the provider chain treats it as a signal to
//! fall through to the next stage.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);

/// Per-backend sliding-window rate limiter
#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    /// Create a new limiter with no recorded requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to admit one request for `backend` under a `max_per_window`
    /// ceiling. Timestamps older than the window are dropped on every
    /// check; an admitted request is recorded immediately.
    pub fn admit(&self, backend: &str, max_per_window: usize) -> bool {
        let now = Instant::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let window = windows.entry(backend.to_string()).or_default();

        window.retain(|stamp| now.duration_since(*stamp) < WINDOW);

        if window.len() >= max_per_window {
            tracing::warn!(backend = backend, "Rate limit exceeded");
            return false;
        }

        window.push(now);
        true
    }

    /// Requests currently inside the window for a backend
    pub fn in_window(&self, backend: &str) -> usize {
        let now = Instant::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match windows.get_mut(backend) {
            Some(window) => {
                window.retain(|stamp| now.duration_since(*stamp) < WINDOW);
                window.len()
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_ceiling() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.admit("openai-gpt4", 5));
        }
        assert!(!limiter.admit("openai-gpt4", 5));
        assert_eq!(limiter.in_window("openai-gpt4"), 5);
    }

    #[test]
    fn test_backends_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.admit("openai-gpt4", 3));
        }
        assert!(!limiter.admit("openai-gpt4", 3));
        assert!(limiter.admit("groq-llama3", 3));
    }

    #[test]
    fn test_denial_does_not_record() {
        let limiter = RateLimiter::new();
        assert!(limiter.admit("openai-gpt4", 1));
        assert!(!limiter.admit("openai-gpt4", 1));
        assert!(!limiter.admit("openai-gpt4", 1));
        assert_eq!(limiter.in_window("openai-gpt4"), 1);
    }

    #[test]
    fn test_unknown_backend_has_empty_window() {
        let limiter = RateLimiter::new();
        assert_eq!(limiter.in_window("nothing"), 0);
    }
}
