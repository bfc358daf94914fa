//! Per-client fixed-window rate limiting for the recommendation proxy
//!
//! The proxy only sees the [`RateLimiter`] trait, so the process-local
//! counter table can be swapped for a shared store without touching callers.
use chrono::{DateTime, Utc};

use crate::error::AppResult;

pub mod memory;
pub mod redis;

pub use memory::{InMemoryRateLimiter, WindowSnapshot};
pub use redis::RedisRateLimiter;

/// Requests allowed per client per window
pub const DEFAULT_MAX_REQUESTS: u32 = 10;

/// Window length in seconds
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Keyed request counter
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    /// Returns whether the request is allowed, counting it only if it is
    async fn check_and_increment(&self, client_id: &str, now: DateTime<Utc>) -> AppResult<bool>;

    /// Window length, reported to rejected clients as Retry-After
    fn window_secs(&self) -> u64;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}
