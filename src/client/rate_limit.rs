// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Token bucket rate limiting for node requests.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Limits how fast requests leave the client.
///
/// Tokens are replenished at a fixed rate and each request consumes one. When
/// the bucket is empty, [`acquire`](Self::acquire) sleeps until a token is
/// available. Clones share the same bucket.
///
/// # Example
///
/// ```rust
/// use chaincache::RateLimiter;
/// use std::time::Duration;
///
/// // Allow 10 requests per second
/// let limiter = RateLimiter::new(10, Duration::from_secs(1));
///
/// // Allow 100 requests per minute
/// let limiter = RateLimiter::new(100, Duration::from_secs(60));
/// ```
#[derive(Clone, Debug)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimitState>>,
}

impl RateLimiter {
    /// Allow `requests` requests per `period`, with bursts up to `requests`.
    pub fn new(requests: u32, period: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(RateLimitState::new(requests, period))),
        }
    }

    /// Convenience constructor for a per-second budget.
    ///
    /// ```rust
    /// use chaincache::RateLimiter;
    ///
    /// let limiter = RateLimiter::per_second(25);
    /// ```
    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut state = self.state.lock().await;
                state.try_acquire()
            };

            match wait_time {
                None => break,
                Some(duration) => tokio::time::sleep(duration).await,
            }
        }
    }
}

#[derive(Debug)]
struct RateLimitState {
    capacity: u32,
    tokens: f64,
    /// Tokens per nanosecond
    refill_rate: f64,
    last_refill: Instant,
}

impl RateLimitState {
    fn new(requests: u32, period: Duration) -> Self {
        let requests = requests.max(1);
        let period_nanos = period.as_nanos().max(1) as f64;
        Self {
            capacity: requests,
            tokens: requests as f64,
            refill_rate: requests as f64 / period_nanos,
            last_refill: Instant::now(),
        }
    }

    /// Take a token, or report how long until one is available.
    fn try_acquire(&mut self) -> Option<Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            let needed = 1.0 - self.tokens;
            let wait_nanos = (needed / self.refill_rate).ceil();
            Some(Duration::from_nanos(wait_nanos as u64))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        let new_tokens = elapsed.as_nanos() as f64 * self.refill_rate;

        self.tokens = (self.tokens + new_tokens).min(self.capacity as f64);
        self.last_refill = now;
    }
}
