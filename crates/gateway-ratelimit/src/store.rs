//! Counter store backends.
//!
//! A store performs the whole read-evaluate-increment step of one admission
//! decision atomically, so concurrent requests for the same key can never
//! jointly overshoot the limit.

use crate::error::StoreResult;
use crate::window::{CounterOutcome, WindowSlot};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Shared counter store
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Store name for logs
    fn name(&self) -> &'static str;

    /// Atomically evaluate `slot` against `limit` and count the request if
    /// it is admitted
    async fn check_and_increment(&self, slot: &WindowSlot, limit: u32)
        -> StoreResult<CounterOutcome>;
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    count: u64,
    expires_at_ms: u64,
}

/// Process-local counter store.
///
/// Counters are not shared between gateway instances; use it for a single
/// instance or in tests.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl MemoryCounterStore {
    /// Number of buckets above which expired entries are swept
    const SWEEP_THRESHOLD: usize = 4096;

    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live bucket count for `key` at `now_ms`
    #[must_use]
    pub fn count(&self, key: &str, now_ms: u64) -> u64 {
        Self::live_count(&self.buckets.lock(), key, now_ms)
    }

    fn live_count(buckets: &HashMap<String, Bucket>, key: &str, now_ms: u64) -> u64 {
        buckets
            .get(key)
            .filter(|bucket| bucket.expires_at_ms > now_ms)
            .map_or(0, |bucket| bucket.count)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn check_and_increment(
        &self,
        slot: &WindowSlot,
        limit: u32,
    ) -> StoreResult<CounterOutcome> {
        let now = slot.now_ms;
        let mut buckets = self.buckets.lock();

        if buckets.len() > Self::SWEEP_THRESHOLD {
            buckets.retain(|_, bucket| bucket.expires_at_ms > now);
        }

        let current = Self::live_count(&buckets, &slot.current_key, now);
        let previous = Self::live_count(&buckets, &slot.previous_key, now);

        let outcome = CounterOutcome::from_remaining(slot.evaluate(current, previous, limit));
        if let CounterOutcome::Admitted { .. } = outcome {
            let ttl_ms = slot.bucket_ttl().as_millis() as u64;
            let bucket = buckets
                .entry(slot.current_key.clone())
                .or_insert(Bucket {
                    count: 0,
                    expires_at_ms: 0,
                });
            if bucket.expires_at_ms <= now {
                *bucket = Bucket {
                    count: 0,
                    expires_at_ms: now + ttl_ms,
                };
            }
            bucket.count += 1;
        }

        Ok(outcome)
    }
}
