// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for contact submissions.
//!
//! Each client IP gets `max_submissions` admissions per window. The window
//! opens on the first submission and a fresh record replaces the old one once
//! the clock passes its reset time. Expired records are dropped either on the
//! next read for that IP or by [`RateLimitStore::sweep_expired`], which the
//! service runs on an interval.
//!
//! The in-memory store is per process. Behind a load balancer each instance
//! enforces its own limit; a shared backend can implement
//! [`RateLimitStore`] when that matters.

use crate::clock::Clock;
use crate::config::{RateLimitConfig, MAX_WINDOW_SECS};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Submission is admitted
    Allowed {
        /// Submissions left in the current window
        remaining: u32,
        /// When the current window closes
        reset_at: DateTime<Utc>,
    },
    /// Submission is refused until `reset_at`
    Denied {
        reset_at: DateTime<Utc>,
        /// Whole seconds until the window closes, at least one
        retry_after: Duration,
    },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Submission counter for one client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitRecord {
    fn expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_at
    }
}

/// Storage capability for per-client submission counters.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count a submission from `client` and decide whether it is admitted.
    async fn check_and_increment(&self, client: &str) -> RateLimitDecision;

    /// Drop records whose window has closed. Returns how many were removed.
    async fn sweep_expired(&self) -> usize;
}

/// Thread-safe in-process rate limiter.
pub struct InMemoryRateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    records: RwLock<HashMap<String, RateLimitRecord>>,
}

impl InMemoryRateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Current record for a client, if any. Does not count as a submission.
    pub async fn record(&self, client: &str) -> Option<RateLimitRecord> {
        self.records.read().await.get(client).cloned()
    }

    /// Number of tracked clients.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Window length in seconds, kept within 1..=[`MAX_WINDOW_SECS`].
    fn window_secs(&self) -> u64 {
        self.config.window_secs.clamp(1, MAX_WINDOW_SECS)
    }

    /// When a window opened at `now` closes.
    fn window_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.window_secs())
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|window| now.checked_add_signed(window))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    fn retry_after(&self, now: DateTime<Utc>, reset_at: DateTime<Utc>) -> Duration {
        let millis = (reset_at - now).num_milliseconds().max(0) as u64;
        let secs = millis.div_ceil(1000).clamp(1, self.window_secs());
        Duration::from_secs(secs)
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimiter {
    async fn check_and_increment(&self, client: &str) -> RateLimitDecision {
        let now = self.clock.now();
        let max = self.config.max_submissions;

        // Read-modify-write under one write guard so concurrent submissions
        // from the same IP cannot both see a stale count.
        let mut records = self.records.write().await;

        match records.get_mut(client) {
            Some(record) if !record.expired_at(now) => {
                if record.count < max {
                    record.count += 1;
                    RateLimitDecision::Allowed {
                        remaining: max - record.count,
                        reset_at: record.reset_at,
                    }
                } else {
                    let retry_after = self.retry_after(now, record.reset_at);
                    debug!(client, ?retry_after, "Submission limit reached");
                    RateLimitDecision::Denied {
                        reset_at: record.reset_at,
                        retry_after,
                    }
                }
            }
            _ => {
                let record = RateLimitRecord {
                    count: 1,
                    reset_at: self.window_end(now),
                };
                let reset_at = record.reset_at;
                records.insert(client.to_string(), record);
                RateLimitDecision::Allowed {
                    remaining: max.saturating_sub(1),
                    reset_at,
                }
            }
        }
    }

    async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.expired_at(now));
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, remaining = records.len(), "Swept expired rate limit records");
        }
        removed
    }
}
