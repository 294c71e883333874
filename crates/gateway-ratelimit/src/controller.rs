//! Admission controller.
//!
//! Decides per caller whether a request may proceed. When the counter store
//! fails or is too slow the request is admitted and a warning is logged.

use crate::error::StoreError;
use crate::store::CounterStore;
use crate::window::{CounterOutcome, RateLimitKey, WindowSlot};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Default requests per window
pub const DEFAULT_LIMIT: u32 = 10;

/// Default window length
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default key namespace in the store
pub const DEFAULT_KEY_PREFIX: &str = "nexus-chat";

/// Default bound on a single store round trip
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

/// Result of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    /// Whether the request may proceed
    pub allowed: bool,
    /// Configured requests per window
    pub limit: u32,
    /// Requests left in the window after this one
    pub remaining: u32,
}

impl AdmissionDecision {
    /// An admitted request
    #[must_use]
    pub const fn admitted(limit: u32, remaining: u32) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
        }
    }

    /// A rejected request
    #[must_use]
    pub const fn rejected(limit: u32) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
        }
    }
}

/// Per-caller sliding-window admission control
#[derive(Clone)]
pub struct AdmissionController {
    store: Arc<dyn CounterStore>,
    limit: u32,
    window: Duration,
    key_prefix: String,
    operation_timeout: Duration,
}

impl AdmissionController {
    /// Create a controller with the default policy of 10 requests per 60 s
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self {
            store,
            limit: DEFAULT_LIMIT,
            window: DEFAULT_WINDOW,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Set the request budget per window
    #[must_use]
    pub fn with_limit(mut self, limit: u32, window: Duration) -> Self {
        self.limit = limit;
        self.window = window;
        self
    }

    /// Set the key namespace
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the store round-trip bound
    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Requests per window
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Window length
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Decide admission for `key` now
    pub async fn admit(&self, key: &RateLimitKey) -> AdmissionDecision {
        self.admit_at(key, now_ms()).await
    }

    /// Decide admission for `key` at `now_ms` milliseconds since the epoch
    pub async fn admit_at(&self, key: &RateLimitKey, now_ms: u64) -> AdmissionDecision {
        let window_ms = self.window.as_millis() as u64;
        let slot = WindowSlot::new(&self.key_prefix, key, now_ms, window_ms);

        let result = tokio::time::timeout(
            self.operation_timeout,
            self.store.check_and_increment(&slot, self.limit),
        )
        .await
        .unwrap_or(Err(StoreError::Timeout(self.operation_timeout)));

        match result {
            Ok(CounterOutcome::Admitted { remaining }) => {
                debug!(key = %key, remaining, "Request admitted");
                AdmissionDecision::admitted(self.limit, remaining)
            }
            Ok(CounterOutcome::Rejected) => {
                debug!(key = %key, limit = self.limit, "Request rejected");
                AdmissionDecision::rejected(self.limit)
            }
            Err(e) => {
                warn!(
                    store = self.store.name(),
                    key = %key,
                    error = %e,
                    "Counter store unavailable, admitting request"
                );
                AdmissionDecision::admitted(self.limit, self.limit)
            }
        }
    }
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("store", &self.store.name())
            .field("limit", &self.limit)
            .field("window", &self.window)
            .field("key_prefix", &self.key_prefix)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use crate::store::MemoryCounterStore;
    use async_trait::async_trait;

    const WINDOW_MS: u64 = 60_000;
    // Start of a window, far from the epoch
    const T0: u64 = 1_700_000_040_000;

    fn controller() -> (AdmissionController, Arc<MemoryCounterStore>) {
        let store = Arc::new(MemoryCounterStore::new());
        let controller = AdmissionController::new(store.clone());
        (controller, store)
    }

    fn ip(value: &str) -> RateLimitKey {
        RateLimitKey::new(value)
    }

    struct FailingStore;

    #[async_trait]
    impl CounterStore for FailingStore {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn check_and_increment(&self, _: &WindowSlot, _: u32) -> StoreResult<CounterOutcome> {
            Err(StoreError::Connection("connection refused".into()))
        }
    }

    struct HangingStore;

    #[async_trait]
    impl CounterStore for HangingStore {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn check_and_increment(&self, _: &WindowSlot, _: u32) -> StoreResult<CounterOutcome> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(CounterOutcome::Rejected)
        }
    }

    #[test]
    fn test_window_start_constant() {
        assert_eq!(T0 % WINDOW_MS, 0);
    }

    #[tokio::test]
    async fn test_eleventh_request_is_rejected() {
        let (controller, _) = controller();
        let key = ip("203.0.113.9");

        for i in 0..10u32 {
            let decision = controller.admit_at(&key, T0 + u64::from(i) * 1000).await;
            assert!(decision.allowed, "request {} should pass", i + 1);
            assert_eq!(decision.limit, 10);
            assert_eq!(decision.remaining, 9 - i);
        }

        let decision = controller.admit_at(&key, T0 + 10_000).await;
        assert_eq!(decision, AdmissionDecision::rejected(10));
    }

    #[tokio::test]
    async fn test_rejections_do_not_consume_quota() {
        let (controller, store) = controller();
        let key = ip("203.0.113.9");

        for _ in 0..25 {
            controller.admit_at(&key, T0).await;
        }

        let slot = WindowSlot::new(DEFAULT_KEY_PREFIX, &key, T0, WINDOW_MS);
        assert_eq!(store.count(&slot.current_key, T0), 10);
    }

    #[tokio::test]
    async fn test_quota_returns_after_window_passes() {
        let (controller, _) = controller();
        let key = ip("203.0.113.9");

        for _ in 0..11 {
            controller.admit_at(&key, T0).await;
        }
        assert!(!controller.admit_at(&key, T0 + 1).await.allowed);

        let decision = controller.admit_at(&key, T0 + 2 * WINDOW_MS).await;
        assert_eq!(decision, AdmissionDecision::admitted(10, 9));
    }

    #[tokio::test]
    async fn test_previous_window_is_weighted() {
        let (controller, _) = controller();
        let key = ip("203.0.113.9");

        for _ in 0..10 {
            controller.admit_at(&key, T0).await;
        }

        // Just after the boundary the previous bucket still counts in full
        assert!(!controller.admit_at(&key, T0 + WINDOW_MS).await.allowed);

        // Halfway through, floor(10 * 0.5) = 5 carry over
        let decision = controller.admit_at(&key, T0 + WINDOW_MS + WINDOW_MS / 2).await;
        assert_eq!(decision, AdmissionDecision::admitted(10, 4));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (controller, _) = controller();
        let first = ip("198.51.100.1");
        let second = ip("198.51.100.2");

        for _ in 0..10 {
            controller.admit_at(&first, T0).await;
        }
        assert!(!controller.admit_at(&first, T0).await.allowed);

        let decision = controller.admit_at(&second, T0).await;
        assert_eq!(decision, AdmissionDecision::admitted(10, 9));
    }

    #[tokio::test]
    async fn test_custom_policy_and_prefix() {
        let store = Arc::new(MemoryCounterStore::new());
        let controller = AdmissionController::new(store.clone())
            .with_limit(2, Duration::from_secs(1))
            .with_key_prefix("custom");
        let key = ip("192.0.2.1");

        assert!(controller.admit_at(&key, 5_000).await.allowed);
        assert!(controller.admit_at(&key, 5_100).await.allowed);
        assert!(!controller.admit_at(&key, 5_200).await.allowed);
        assert_eq!(store.count("custom:192.0.2.1:5", 5_200), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_never_exceed_limit() {
        let (controller, _) = controller();
        let key = ip("203.0.113.50");

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let controller = controller.clone();
                let key = key.clone();
                tokio::spawn(async move { controller.admit_at(&key, T0).await.allowed })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }

    #[tokio::test]
    async fn test_store_failure_admits() {
        let controller = AdmissionController::new(Arc::new(FailingStore));
        let decision = controller.admit(&ip("203.0.113.9")).await;
        assert_eq!(decision, AdmissionDecision::admitted(10, 10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_admits_after_timeout() {
        let controller = AdmissionController::new(Arc::new(HangingStore))
            .with_operation_timeout(Duration::from_millis(50));
        let decision = controller.admit(&ip("203.0.113.9")).await;
        assert!(decision.allowed);
    }
}
