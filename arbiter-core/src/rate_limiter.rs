//! # Rate Limiter
//!
//! Per-key request pacing, used with keys `Provider:<id>` (the execution
//! core) and `Context:<tenant,user,project>` (the arbitration core's
//! pre-flight gate). The contract is deliberately narrow — `allow`/
//! `reset_time` — so a token bucket, a leaky bucket, or a distributed
//! sliding-window counter can all sit behind it; [`TokenBucketRateLimiter`]
//! is the in-process reference implementation, keyed the same way
//! [`crate::cache::InMemoryCache`] keys its entries.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Any implementation satisfying per-key fairness and a monotone
/// non-negative token count is acceptable.
#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    /// Attempt to consume `n` units from `key`'s budget. Returns `true` if
    /// allowed.
    async fn allow(&self, key: &str, n: u32) -> bool;
    /// When `key`'s bucket is next expected to have capacity.
    async fn reset_time(&self, key: &str) -> DateTime<Utc>;
}

struct Bucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: DateTime<Utc>,
}

impl Bucket {
    fn new(capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec,
            last_refill: Utc::now(),
        }
    }

    fn refill(&mut self, now: DateTime<Utc>) {
        let elapsed = (now - self.last_refill).num_milliseconds().max(0) as f64 / 1000.0;
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            self.last_refill = now;
        }
    }

    fn try_consume(&mut self, n: f64, now: DateTime<Utc>) -> bool {
        self.refill(now);
        if self.tokens >= n {
            self.tokens -= n;
            true
        } else {
            false
        }
    }
}

/// Token-bucket rate limiter keyed per `Provider:<id>` / `Context:<...>`
/// string. Buckets are created lazily on first use with the limiter's
/// configured `requests_per_minute`.
pub struct TokenBucketRateLimiter {
    requests_per_minute: u32,
    buckets: DashMap<String, Bucket>,
}

impl TokenBucketRateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            buckets: DashMap::new(),
        }
    }

    pub fn shared(requests_per_minute: u32) -> Arc<Self> {
        Arc::new(Self::new(requests_per_minute))
    }
}

#[async_trait::async_trait]
impl RateLimiter for TokenBucketRateLimiter {
    async fn allow(&self, key: &str, n: u32) -> bool {
        let now = Utc::now();
        let refill_per_sec = self.requests_per_minute as f64 / 60.0;
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(self.requests_per_minute as f64, refill_per_sec));
        bucket.try_consume(n as f64, now)
    }

    async fn reset_time(&self, key: &str) -> DateTime<Utc> {
        let now = Utc::now();
        match self.buckets.get(key) {
            Some(bucket) if bucket.tokens < 1.0 && bucket.refill_per_sec > 0.0 => {
                let seconds_needed = (1.0 - bucket.tokens) / bucket.refill_per_sec;
                now + chrono::Duration::milliseconds((seconds_needed * 1000.0) as i64)
            }
            _ => now,
        }
    }
}
