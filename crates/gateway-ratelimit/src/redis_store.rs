//! Redis-backed counter store.
//!
//! The check-and-increment runs as one Lua script so that gateway instances
//! sharing a Redis share the same budget per caller.

use crate::error::{StoreError, StoreResult};
use crate::store::CounterStore;
use crate::window::{CounterOutcome, WindowSlot};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use tracing::{debug, info};

/// Returns -1 when rejected, otherwise the remaining quota
const SLIDING_WINDOW_SCRIPT: &str = r#"
local current_key  = KEYS[1]
local previous_key = KEYS[2]
local limit        = tonumber(ARGV[1])
local now          = tonumber(ARGV[2])
local window       = tonumber(ARGV[3])

local current  = tonumber(redis.call("GET", current_key) or "0")
local previous = tonumber(redis.call("GET", previous_key) or "0")

local elapsed = (now % window) / window
previous = math.floor((1 - elapsed) * previous)

if previous + current >= limit then
  return -1
end

local value = redis.call("INCR", current_key)
if value == 1 then
  redis.call("PEXPIRE", current_key, window * 2 + 1000)
end
return limit - (value + previous)
"#;

/// Counter store shared through Redis
pub struct RedisCounterStore {
    connection: ConnectionManager,
    script: Script,
}

impl RedisCounterStore {
    /// Connect to the Redis at `url`
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the server is unreachable.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| StoreError::Connection(format!("invalid redis url: {e}")))?;
        let connection = ConnectionManager::new(client).await?;

        info!("Connected to redis counter store");

        Ok(Self::with_connection(connection))
    }

    /// Wrap an existing connection
    #[must_use]
    pub fn with_connection(connection: ConnectionManager) -> Self {
        Self {
            connection,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        }
    }
}

impl std::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn check_and_increment(
        &self,
        slot: &WindowSlot,
        limit: u32,
    ) -> StoreResult<CounterOutcome> {
        let mut connection = self.connection.clone();

        let result: i64 = self
            .script
            .key(&slot.current_key)
            .key(&slot.previous_key)
            .arg(limit)
            .arg(slot.now_ms)
            .arg(slot.window_ms)
            .invoke_async(&mut connection)
            .await?;

        debug!(key = %slot.current_key, result, "Sliding window evaluated");

        if result < 0 {
            Ok(CounterOutcome::Rejected)
        } else {
            Ok(CounterOutcome::Admitted {
                remaining: u32::try_from(result).unwrap_or(u32::MAX),
            })
        }
    }
}
