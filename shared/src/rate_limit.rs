//! Per-client fixed-window rate limiting.
//!
//! State lives for as long as the limiter does, which in a Lambda is the life of the
//! execution environment. Each environment keeps its own map, so the quota is
//! instance-local and best-effort.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(start.timestamp_millis()),
        }
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: i64) {
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Opaque client identifier used as the rate-limit key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity(String);

impl RequestIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request count inside one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub start: DateTime<Utc>,
}

impl RateWindow {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self { count: 0, start: now }
    }
}

/// Fixed-window counter keyed by [`RequestIdentity`].
pub struct RateLimiter {
    windows: DashMap<RequestIdentity, RateWindow>,
    clock: Arc<dyn Clock>,
    window: Duration,
    max_per_window: u32,
}

impl RateLimiter {
    /// Create a limiter on the wall clock.
    pub fn new(window_ms: u64, max_per_window: u32) -> Self {
        Self::with_clock(window_ms, max_per_window, Arc::new(SystemClock))
    }

    /// Create a limiter on an explicit clock.
    pub fn with_clock(window_ms: u64, max_per_window: u32, clock: Arc<dyn Clock>) -> Self {
        let window_ms = i64::try_from(window_ms).unwrap_or(i64::MAX);
        Self {
            windows: DashMap::new(),
            clock,
            window: Duration::milliseconds(window_ms),
            max_per_window,
        }
    }

    /// Count a request for `identity` and report whether it is within quota.
    ///
    /// Every call consumes quota, including calls that later fail for other reasons.
    /// A window expires only once strictly more than its width has elapsed.
    pub fn check(&self, identity: &RequestIdentity) -> bool {
        let now = self.clock.now();
        let mut window = self
            .windows
            .entry(identity.clone())
            .or_insert_with(|| RateWindow::fresh(now));

        if now - window.start > self.window {
            *window = RateWindow::fresh(now);
        }
        window.count = window.count.saturating_add(1);

        debug!(identity = %identity, count = window.count, "Rate limit check");
        window.count <= self.max_per_window
    }

    /// Current window for `identity`, if one exists.
    pub fn window(&self, identity: &RequestIdentity) -> Option<RateWindow> {
        self.windows.get(identity).map(|w| *w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: u32) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (RateLimiter::with_clock(60_000, max, clock.clone()), clock)
    }

    #[test]
    fn test_blocks_after_max_requests() {
        let (limiter, _) = limiter(6);
        let ip = RequestIdentity::new("203.0.113.7");

        for _ in 0..6 {
            assert!(limiter.check(&ip));
        }
        assert!(!limiter.check(&ip));
        assert!(!limiter.check(&ip));
        assert_eq!(limiter.window(&ip).unwrap().count, 8);
    }

    #[test]
    fn test_identities_are_independent() {
        let (limiter, _) = limiter(1);
        let a = RequestIdentity::new("a");
        let b = RequestIdentity::new("b");

        assert!(limiter.check(&a));
        assert!(!limiter.check(&a));
        assert!(limiter.check(&b));
    }

    #[test]
    fn test_exact_boundary_is_not_expired() {
        let (limiter, clock) = limiter(1);
        let ip = RequestIdentity::new("ip");

        assert!(limiter.check(&ip));
        clock.advance(60_000);
        assert!(!limiter.check(&ip));
        assert_eq!(limiter.window(&ip).unwrap().count, 2);
    }

    #[test]
    fn test_resets_after_window_elapses() {
        let (limiter, clock) = limiter(2);
        let ip = RequestIdentity::new("ip");

        assert!(limiter.check(&ip));
        assert!(limiter.check(&ip));
        assert!(!limiter.check(&ip));

        clock.advance(60_001);
        assert!(limiter.check(&ip));

        let window = limiter.window(&ip).unwrap();
        assert_eq!(window.count, 1);
        assert_eq!(window.start, clock.now());
    }
}
