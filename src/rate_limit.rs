use std::sync::Arc;

use log::{debug, warn};
use store::Store;

use crate::config::{RateLimitConfig, UnconfiguredPolicy};

const KEY_PREFIX: &str = "rate_limit_helius:";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not count request")]
    Store(#[from] store::Error),
}

/// Fixed window request counter per client address.
///
/// The first request of a window creates the counter and sets its expiry,
/// later requests only increment it. The window resets when the key expires.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn Store>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn Store>, config: RateLimitConfig) -> Self {
        Self { store, config }
    }

    pub async fn allow(&self, ip: &str) -> Result<bool, Error> {
        let key = format!("{KEY_PREFIX}{ip}");

        let count = match self.store.incr(&key).await {
            Ok(count) => count,
            Err(store::Error::Unconfigured) => {
                return Ok(self.config.unconfigured == UnconfiguredPolicy::Bypass)
            }
            Err(err) => return Err(err.into()),
        };

        if count == 1 {
            self.store.expire(&key, self.config.window_seconds).await?;
        }

        debug!("{ip} made {count} requests this window");

        if count > self.config.max_requests {
            warn!("Rate limiting {ip} after {count} requests");
            return Ok(false);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use store::{ManualClock, MemoryStore, UnconfiguredStore};

    use super::*;

    fn limiter() -> (Arc<ManualClock>, RateLimiter) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        (clock, RateLimiter::new(store, RateLimitConfig::default()))
    }

    #[tokio::test]
    async fn eleventh_request_in_a_window_is_refused() {
        let (clock, limiter) = limiter();

        for _ in 0..10 {
            assert!(limiter.allow("203.0.113.7").await.unwrap());
            clock.advance(Duration::seconds(5));
        }

        assert!(!limiter.allow("203.0.113.7").await.unwrap());
    }

    #[tokio::test]
    async fn window_resets_after_expiry() {
        let (clock, limiter) = limiter();

        for _ in 0..11 {
            limiter.allow("203.0.113.7").await.unwrap();
        }
        assert!(!limiter.allow("203.0.113.7").await.unwrap());

        clock.advance(Duration::seconds(60));
        assert!(limiter.allow("203.0.113.7").await.unwrap());
    }

    #[tokio::test]
    async fn later_requests_do_not_extend_the_window() {
        let (clock, limiter) = limiter();

        limiter.allow("203.0.113.7").await.unwrap();
        clock.advance(Duration::seconds(59));
        for _ in 0..9 {
            limiter.allow("203.0.113.7").await.unwrap();
        }
        assert!(!limiter.allow("203.0.113.7").await.unwrap());

        clock.advance(Duration::seconds(1));
        assert!(limiter.allow("203.0.113.7").await.unwrap());
    }

    #[tokio::test]
    async fn addresses_are_counted_separately() {
        let (_, limiter) = limiter();

        for _ in 0..10 {
            limiter.allow("203.0.113.7").await.unwrap();
        }
        assert!(!limiter.allow("203.0.113.7").await.unwrap());
        assert!(limiter.allow("198.51.100.1").await.unwrap());
    }

    #[tokio::test]
    async fn unconfigured_store_follows_policy() {
        let bypass = RateLimiter::new(Arc::new(UnconfiguredStore), RateLimitConfig::default());
        assert!(bypass.allow("203.0.113.7").await.unwrap());

        let deny = RateLimiter::new(
            Arc::new(UnconfiguredStore),
            RateLimitConfig {
                unconfigured: UnconfiguredPolicy::Deny,
                ..Default::default()
            },
        );
        assert!(!deny.allow("203.0.113.7").await.unwrap());
    }
}
