use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Sliding-window rate limiter for the anonymous endpoints. Keys are
/// whatever the caller identifies a client by (IP here). In-memory only;
/// a multi-instance deployment would need a shared backend instead.
#[derive(Clone)]
pub struct RateLimiter {
    hits: Arc<RwLock<HashMap<String, VecDeque<Instant>>>>,
    max_hits: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_hits: usize, window_secs: u64) -> Self {
        Self {
            hits: Arc::new(RwLock::new(HashMap::new())),
            max_hits,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Record an attempt for `identifier`; false when the window is full.
    pub async fn check(&self, identifier: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.write().await;
        let history = hits.entry(identifier.to_string()).or_default();

        while history
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            history.pop_front();
        }

        if history.len() < self.max_hits {
            history.push_back(now);
            true
        } else {
            false
        }
    }

    /// Drop identifiers whose whole history has aged out. Run periodically
    /// so idle clients do not accumulate.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut hits = self.hits.write().await;
        hits.retain(|_, history| {
            history.retain(|&t| now.duration_since(t) < self.window);
            !history.is_empty()
        });
        tracing::debug!("rate limiter cleanup: {} active identifiers", hits.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_limit_per_identifier() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.check("1.2.3.4").await);
        assert!(limiter.check("1.2.3.4").await);
        assert!(!limiter.check("1.2.3.4").await);
        assert!(limiter.check("5.6.7.8").await);
    }

    #[tokio::test]
    async fn cleanup_drops_expired_histories() {
        let limiter = RateLimiter::new(5, 1);
        limiter.check("a").await;
        limiter.check("b").await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        limiter.cleanup().await;
        let hits = limiter.hits.read().await;
        assert!(hits.is_empty());
    }
}
