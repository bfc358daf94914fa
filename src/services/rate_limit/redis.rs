use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{Client, Script};

use super::RateLimiter;
use crate::error::AppResult;

/// Check-then-increment in one round trip. The window starts at the first
/// accepted request and is enforced by the key's TTL.
const CHECK_AND_INCREMENT: &str = r#"
local count = tonumber(redis.call('GET', KEYS[1]) or '0')
if count >= tonumber(ARGV[1]) then
    return 0
end
count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[2])
end
return 1
"#;

/// Fixed-window limiter backed by Redis, shared across instances
#[derive(Clone)]
pub struct RedisRateLimiter {
    connection: ConnectionManager,
    script: Script,
    max_requests: u32,
    window_secs: u64,
}

impl RedisRateLimiter {
    pub async fn new(client: Client, max_requests: u32, window_secs: u64) -> AppResult<Self> {
        let connection = ConnectionManager::new(client).await?;
        Ok(Self {
            connection,
            script: Script::new(CHECK_AND_INCREMENT),
            max_requests,
            window_secs,
        })
    }

    fn key(client_id: &str) -> String {
        format!("rate:{}", client_id)
    }
}

#[async_trait::async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check_and_increment(&self, client_id: &str, _now: DateTime<Utc>) -> AppResult<bool> {
        // Redis expiry owns the clock here
        let mut connection = self.connection.clone();
        let allowed: i32 = self
            .script
            .key(Self::key(client_id))
            .arg(self.max_requests)
            .arg(self.window_secs)
            .invoke_async(&mut connection)
            .await?;
        Ok(allowed == 1)
    }

    fn window_secs(&self) -> u64 {
        self.window_secs
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
