use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use super::{RateLimiter, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS};
use crate::error::{AppError, AppResult};

/// How often expired windows are dropped from the table
const SWEEP_INTERVAL_SECS: i64 = 300;

/// Counter state for one client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub count: u32,
    pub reset_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Table {
    windows: HashMap<String, WindowSnapshot>,
    last_sweep: Option<DateTime<Utc>>,
}

/// Process-local fixed-window limiter
///
/// State is lost on restart and is not shared between instances.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    table: Mutex<Table>,
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_SECS)
    }
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: i64::try_from(window_secs)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
            table: Mutex::new(Table {
                windows: HashMap::new(),
                last_sweep: None,
            }),
        }
    }

    /// Current counter for a client, if it has one
    pub fn snapshot(&self, client_id: &str) -> Option<WindowSnapshot> {
        self.table
            .lock()
            .ok()
            .and_then(|table| table.windows.get(client_id).copied())
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.table.lock().map(|t| t.windows.len()).unwrap_or(0)
    }

    fn check(&self, client_id: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let mut table = self
            .table
            .lock()
            .map_err(|_| AppError::Internal("rate limit table poisoned".to_string()))?;

        let due = table
            .last_sweep
            .map_or(true, |last| now - last >= Duration::seconds(SWEEP_INTERVAL_SECS));
        if due {
            let before = table.windows.len();
            table.windows.retain(|_, window| now <= window.reset_at);
            table.last_sweep = Some(now);
            if before != table.windows.len() {
                tracing::debug!(
                    removed = before - table.windows.len(),
                    "Swept expired rate limit windows"
                );
            }
        }

        let reset_at = now
            .checked_add_signed(self.window)
            .ok_or_else(|| AppError::Internal("rate limit window out of range".to_string()))?;

        let window = table
            .windows
            .entry(client_id.to_string())
            .or_insert(WindowSnapshot { count: 0, reset_at });

        if now > window.reset_at {
            window.count = 0;
            window.reset_at = reset_at;
        }

        if window.count >= self.max_requests {
            return Ok(false);
        }

        window.count += 1;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_and_increment(&self, client_id: &str, now: DateTime<Utc>) -> AppResult<bool> {
        self.check(client_id, now)
    }

    fn window_secs(&self) -> u64 {
        u64::try_from(self.window.num_seconds()).unwrap_or(0)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
