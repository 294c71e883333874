//! Two-bucket sliding window arithmetic.
//!
//! Time is cut into fixed windows of `window_ms`. A request is counted in the
//! bucket of the window it falls in; the previous bucket contributes its count
//! scaled by the share of the previous window still covered by a sliding
//! window ending now.

use std::fmt;
use std::time::Duration;

/// Identity of the caller being rate limited.
///
/// Derived from the first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// loopback address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey(String);

impl RateLimitKey {
    /// Key used when no forwarding header is present
    pub const LOOPBACK: &'static str = "127.0.0.1";

    /// Build a key from an explicit value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derive the key from the forwarding headers of a request
    #[must_use]
    pub fn from_headers(forwarded_for: Option<&str>, real_ip: Option<&str>) -> Self {
        let from_forwarded = forwarded_for
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        let from_real_ip = real_ip.map(str::trim).filter(|ip| !ip.is_empty());

        Self::new(
            from_forwarded
                .or(from_real_ip)
                .unwrap_or(Self::LOOPBACK),
        )
    }

    /// Key as a string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The pair of buckets consulted for one admission decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSlot {
    /// Bucket of the window containing `now_ms`
    pub current_key: String,
    /// Bucket of the window before it
    pub previous_key: String,
    /// Decision time, milliseconds since the Unix epoch
    pub now_ms: u64,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl WindowSlot {
    /// Slot for `key` at `now_ms`
    #[must_use]
    pub fn new(prefix: &str, key: &RateLimitKey, now_ms: u64, window_ms: u64) -> Self {
        let window_ms = window_ms.max(1);
        let index = now_ms / window_ms;
        // window 0 has no predecessor; "-1" names a bucket nothing writes
        let previous_key = index.checked_sub(1).map_or_else(
            || format!("{prefix}:{key}:-1"),
            |previous| format!("{prefix}:{key}:{previous}"),
        );
        Self {
            current_key: format!("{prefix}:{key}:{index}"),
            previous_key,
            now_ms,
            window_ms,
        }
    }

    /// Share of the current window already elapsed, in `[0, 1)`
    #[must_use]
    pub fn elapsed_fraction(&self) -> f64 {
        (self.now_ms % self.window_ms) as f64 / self.window_ms as f64
    }

    /// Previous bucket count as seen by the sliding window, rounded down
    #[must_use]
    pub fn weighted_previous(&self, previous: u64) -> u64 {
        ((1.0 - self.elapsed_fraction()) * previous as f64).floor() as u64
    }

    /// How long a bucket must live to still be read as a previous bucket
    #[must_use]
    pub fn bucket_ttl(&self) -> Duration {
        Duration::from_millis(self.window_ms * 2 + 1000)
    }

    /// Apply the admission rule to raw bucket counts.
    ///
    /// Returns the remaining quota after counting this request, or `None` if
    /// the request is rejected (in which case nothing is counted).
    #[must_use]
    pub fn evaluate(&self, current: u64, previous: u64, limit: u32) -> Option<u32> {
        let effective = self.weighted_previous(previous) + current;
        let limit = u64::from(limit);
        if effective >= limit {
            return None;
        }
        Some((limit - effective - 1) as u32)
    }
}

/// Outcome of a check-and-increment against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOutcome {
    /// Counted; `remaining` requests left in the sliding window
    Admitted {
        /// Requests left after this one
        remaining: u32,
    },
    /// Over the limit; not counted
    Rejected,
}

impl CounterOutcome {
    /// Map the `evaluate` result into an outcome
    #[must_use]
    pub fn from_remaining(remaining: Option<u32>) -> Self {
        remaining.map_or(Self::Rejected, |remaining| Self::Admitted { remaining })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefers_first_forwarded_hop() {
        let key = RateLimitKey::from_headers(Some(" 203.0.113.7 , 10.0.0.1"), Some("10.0.0.2"));
        assert_eq!(key.as_str(), "203.0.113.7");
    }

    #[test]
    fn test_key_falls_back_to_real_ip_then_loopback() {
        assert_eq!(
            RateLimitKey::from_headers(None, Some("198.51.100.4")).as_str(),
            "198.51.100.4"
        );
        assert_eq!(
            RateLimitKey::from_headers(Some("  "), Some("")).as_str(),
            RateLimitKey::LOOPBACK
        );
        assert_eq!(RateLimitKey::from_headers(None, None).as_str(), "127.0.0.1");
    }

    #[test]
    fn test_slot_keys() {
        let key = RateLimitKey::new("1.2.3.4");
        let slot = WindowSlot::new("nexus-chat", &key, 125_000, 60_000);
        assert_eq!(slot.current_key, "nexus-chat:1.2.3.4:2");
        assert_eq!(slot.previous_key, "nexus-chat:1.2.3.4:1");
        assert_eq!(slot.bucket_ttl(), Duration::from_millis(121_000));
    }

    #[test]
    fn test_first_window_has_its_own_previous_bucket() {
        let key = RateLimitKey::new("1.2.3.4");
        let slot = WindowSlot::new("nexus-chat", &key, 1_000, 60_000);
        assert_eq!(slot.current_key, "nexus-chat:1.2.3.4:0");
        assert_eq!(slot.previous_key, "nexus-chat:1.2.3.4:-1");
        assert_ne!(slot.current_key, slot.previous_key);

        // nothing is ever counted in the -1 bucket, so the full limit is available
        assert_eq!(slot.evaluate(2, 0, 3), Some(0));
        assert_eq!(slot.evaluate(3, 0, 3), None);
    }

    #[test]
    fn test_weighted_previous_rounds_down() {
        let key = RateLimitKey::new("k");
        let slot = WindowSlot::new("p", &key, 90_000, 60_000);
        assert!((slot.elapsed_fraction() - 0.5).abs() < f64::EPSILON);
        assert_eq!(slot.weighted_previous(10), 5);
        assert_eq!(slot.weighted_previous(3), 1);
    }

    #[test]
    fn test_evaluate() {
        let key = RateLimitKey::new("k");
        let slot = WindowSlot::new("p", &key, 60_000, 60_000);

        assert_eq!(slot.evaluate(0, 0, 10), Some(9));
        assert_eq!(slot.evaluate(9, 0, 10), Some(0));
        assert_eq!(slot.evaluate(10, 0, 10), None);
        // At the start of a window the previous bucket counts fully
        assert_eq!(slot.evaluate(0, 10, 10), None);
        assert_eq!(slot.evaluate(0, 0, 0), None);
    }
}
