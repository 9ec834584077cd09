//! Per-domain politeness delay
//!
//! The limiter remembers, per domain, when the last request was allowed to
//! go out. A caller reserves the next free slot for its domain under a single
//! lock and then sleeps until that slot outside the lock. Two workers on the
//! same domain therefore always receive distinct slots at least `delay`
//! apart, while workers on other domains never wait on each other.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum delay between requests to the same domain
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    /// Creates a limiter spacing same-domain requests by `delay`
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until a request to `domain` may be issued
    ///
    /// Returns immediately for the first request to a domain and whenever the
    /// delay has already elapsed.
    pub async fn acquire(&self, domain: &str) {
        let now = Instant::now();
        let slot = self.reserve(domain, now);
        if slot > now {
            tracing::trace!(domain, wait_ms = (slot - now).as_millis() as u64, "rate limited");
            tokio::time::sleep_until(slot).await;
        }
    }

    /// Claims the next request slot for `domain` as seen at `now`
    ///
    /// The returned instant is recorded as the domain's last request time in
    /// the same critical section that computed it.
    fn reserve(&self, domain: &str, now: Instant) -> Instant {
        let mut last_request = self.last_request.lock();

        let slot = match last_request.get(domain) {
            Some(last) => std::cmp::max(now, *last + self.delay),
            None => now,
        };

        last_request.insert(domain.to_string(), slot);
        slot
    }
}
