//! Token bucket throttles.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crate::config::ThrottleConfig;
use crate::pipeline::admission::{Decision, Policy, RequestAttributes};

/// A simple token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Which request attribute a throttle buckets on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleKey {
    ClientIp,
    Topic,
}

/// One token bucket per key value.
#[derive(Debug)]
pub struct TokenBucketLimiter {
    key: ThrottleKey,
    buckets: Mutex<HashMap<String, TokenBucket>>,
    rps: f64,
    burst: f64,
}

impl TokenBucketLimiter {
    pub fn new(key: ThrottleKey, requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            key,
            buckets: Mutex::new(HashMap::new()),
            rps: f64::from(requests_per_second),
            burst: f64::from(burst_size),
        }
    }

    pub fn from_config(key: ThrottleKey, config: &ThrottleConfig) -> Self {
        Self::new(key, config.requests_per_second, config.burst_size)
    }

    fn check(&self, key: String) -> bool {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets
            .entry(key)
            .or_insert_with(|| TokenBucket::new(self.burst));

        bucket.try_acquire(self.burst, self.rps)
    }
}

impl Policy for TokenBucketLimiter {
    fn name(&self) -> &'static str {
        match self.key {
            ThrottleKey::ClientIp => "ip_throttle",
            ThrottleKey::Topic => "topic_throttle",
        }
    }

    fn evaluate(&self, attrs: &RequestAttributes<'_>) -> Decision {
        let key = match self.key {
            ThrottleKey::ClientIp => attrs.client_ip.to_string(),
            ThrottleKey::Topic => attrs.topic.to_string(),
        };

        let allowed = self.check(key);
        if !allowed {
            tracing::warn!(
                policy = self.name(),
                client = %attrs.client_ip,
                topic = %attrs.topic,
                "Rate limit exceeded"
            );
        }
        Decision::from_bool(allowed)
    }
}
