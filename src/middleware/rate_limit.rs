///! In-memory sliding-window rate limiter for credential endpoints.
///! Single-process only; put a shared store in front of it when scaling out.
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<RwLock<HashMap<String, VecDeque<Instant>>>>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window_secs: u64) -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Record an attempt for the identifier (client IP) and report whether
    /// it stays within the window limit.
    pub async fn check(&self, identifier: &str) -> bool {
        let now = Instant::now();
        let mut attempts = self.attempts.write().await;

        let history = attempts.entry(identifier.to_string()).or_default();
        while let Some(&oldest) = history.front() {
            if now.duration_since(oldest) >= self.window {
                history.pop_front();
            } else {
                break;
            }
        }

        if history.len() < self.max_attempts {
            history.push_back(now);
            true
        } else {
            false
        }
    }

    /// Drop identifiers whose whole history has aged out.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut attempts = self.attempts.write().await;

        attempts.retain(|_, history| {
            history.retain(|&at| now.duration_since(at) < self.window);
            !history.is_empty()
        });

        tracing::debug!("rate limiter cleanup: {} active identifiers", attempts.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_burst_and_isolates_identifiers() {
        let limiter = RateLimiter::new(3, 60);

        assert!(limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.1").await);
        assert!(!limiter.check("10.0.0.1").await);

        assert!(limiter.check("10.0.0.2").await);
    }

    #[tokio::test]
    async fn recovers_once_the_window_passes() {
        let limiter = RateLimiter::new(1, 1);

        assert!(limiter.check("10.0.0.1").await);
        assert!(!limiter.check("10.0.0.1").await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(limiter.check("10.0.0.1").await);
    }

    #[tokio::test]
    async fn cleanup_removes_aged_out_identifiers() {
        let limiter = RateLimiter::new(5, 1);

        limiter.check("10.0.0.1").await;
        limiter.check("10.0.0.2").await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        limiter.cleanup().await;

        assert_eq!(limiter.attempts.read().await.len(), 0);
    }
}
