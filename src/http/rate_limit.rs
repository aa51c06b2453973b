//! Rate limiting implementation
//!
//! Uses the governor crate with a burst of one, which enforces a minimum
//! interval of `1 / requests_per_second` between request starts.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for rate limiting
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second (fractional values allowed)
    pub requests_per_second: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5.0,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: f64) -> Self {
        Self {
            requests_per_second,
        }
    }

    /// Minimum interval between two request starts, if throttling is enabled
    ///
    /// Rates too small for the interval to fit a `Duration` disable
    /// throttling.
    pub fn min_interval(&self) -> Option<Duration> {
        if self.requests_per_second > 0.0 && self.requests_per_second.is_finite() {
            Duration::try_from_secs_f64(1.0 / self.requests_per_second).ok()
        } else {
            None
        }
    }
}

/// Minimum-interval rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
    interval: Duration,
}

impl RateLimiter {
    /// Create a rate limiter; `None` when the config disables throttling
    pub fn new(config: &RateLimiterConfig) -> Option<Self> {
        let interval = config.min_interval()?;
        let quota = Quota::with_period(interval)?.allow_burst(NonZeroU32::MIN);

        Some(Self {
            limiter: Arc::new(Governor::direct(quota)),
            interval,
        })
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// The enforced minimum interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("interval", &self.interval)
            .finish()
    }
}
