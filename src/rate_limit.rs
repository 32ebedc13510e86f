//! Fixed-window submission counting per logical key.
//!
//! A [`RateLimiter`] is the one piece of state shared between forms: every
//! form bound to the same key (for instance `"profile-update"`) draws from the
//! same window. It is an explicitly owned store, normally created once and
//! handed to forms as an `Arc<RateLimiter>`, so it outlives any single form
//! and survives the form being rebuilt.
//!
//! # Algorithm
//!
//! One counter and window start per key. On each call:
//! - no entry yet, or the window has elapsed: open a new window with a count
//!   of 1 and allow
//! - otherwise increment; allow while `count <= max_attempts`
//!
//! An over-limit entry keeps its count, so further calls keep failing until
//! the window rolls over. Across a window boundary up to
//! `2 * max_attempts` calls can succeed in quick succession.
//!
//! Time comes from an injectable [`Clock`] so tests can drive window
//! rollover deterministically with a [`ManualClock`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::error::{ConfigError, ConfigErrorKind};

/// Source of the current time for a [`RateLimiter`].
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Clock backed by the system monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<RwLock<Instant>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    pub fn new(start: Instant) -> Self {
        Self {
            current: Arc::new(RwLock::new(start)),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.write();
        *current += duration;
    }

    /// Sets the clock to `time`.
    pub fn set(&self, time: Instant) {
        *self.current.write() = time;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.read()
    }
}

/// How many attempts a key may make per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Attempts allowed inside one window
    pub max_attempts: u32,
    /// Window length
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Default attempts per window.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    /// Default window length.
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

    /// Creates a policy.
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }

    /// Checks that the policy can ever allow a call.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `max_attempts` is 0 or the window is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::new(
                ConfigErrorKind::InvalidRateLimit,
                "max_attempts must be greater than 0",
            ));
        }
        if self.window.is_zero() {
            return Err(ConfigError::new(
                ConfigErrorKind::InvalidRateLimit,
                "window must be longer than 0",
            ));
        }
        Ok(())
    }
}

impl Default for RateLimitPolicy {
    /// 5 attempts per 60 seconds.
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_WINDOW)
    }
}

/// Snapshot of the counter for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Attempts seen in the current window, including rejected ones
    pub count: u32,
    /// When the current window opened
    pub window_start: Instant,
    /// Policy used by the most recent call for this key
    pub policy: RateLimitPolicy,
}

impl RateLimitEntry {
    /// The window closes at exactly `window_start + window`, not one tick
    /// after it: a call landing on the boundary opens a fresh window instead
    /// of counting against the old one.
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) >= self.policy.window
    }
}

/// Process-wide store of fixed-window counters keyed by operation name.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use secure_form::{ManualClock, RateLimitPolicy, RateLimiter};
///
/// let clock = ManualClock::default();
/// let limiter = RateLimiter::with_clock(clock.clone());
/// let policy = RateLimitPolicy::new(3, Duration::from_secs(60));
///
/// let results: Vec<bool> = (0..4)
///     .map(|_| limiter.check_and_record("profile-update", policy))
///     .collect();
/// assert_eq!(results, vec![true, true, true, false]);
///
/// clock.advance(Duration::from_secs(60));
/// assert!(limiter.check_and_record("profile-update", policy));
/// ```
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    /// Creates an empty limiter using the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates an empty limiter using `clock`.
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Records an attempt for `key` and reports whether it is allowed.
    ///
    /// The first attempt of a fresh window counts toward
    /// `policy.max_attempts`. The read and the write of the counter happen
    /// under one lock.
    pub fn check_and_record(&self, key: &str, policy: RateLimitPolicy) -> bool {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(key) {
            if !entry.is_expired(now) {
                entry.policy = policy;
                entry.count = entry.count.saturating_add(1);
                return entry.count <= policy.max_attempts;
            }
        }

        tracing::debug!(key, "opening rate limit window");
        entries.insert(
            key.to_string(),
            RateLimitEntry {
                count: 1,
                window_start: now,
                policy,
            },
        );
        policy.max_attempts >= 1
    }

    /// Returns the time left in the current window for `key`, or `None` when
    /// the key has no open window.
    pub fn retry_after(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        let entry = entries.get(key)?;

        if entry.is_expired(now) {
            return None;
        }
        let elapsed = now.saturating_duration_since(entry.window_start);
        Some(entry.policy.window.saturating_sub(elapsed))
    }

    /// Returns a snapshot of the counter for `key`.
    pub fn entry(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.lock().get(key).copied()
    }

    /// Forgets the counter for `key`. Returns whether one existed.
    pub fn reset(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Forgets every counter.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("keys", &self.entries.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    fn limiter() -> (ManualClock, RateLimiter) {
        let clock = ManualClock::default();
        let limiter = RateLimiter::with_clock(clock.clone());
        (clock, limiter)
    }

    #[test]
    fn fourth_call_in_window_is_rejected() {
        let (_clock, limiter) = limiter();
        let policy = RateLimitPolicy::new(3, WINDOW);

        let results: Vec<bool> = (0..4)
            .map(|_| limiter.check_and_record("k", policy))
            .collect();

        assert_eq!(results, vec![true, true, true, false]);
    }

    #[test]
    fn call_exactly_at_window_end_opens_new_window() {
        let (clock, limiter) = limiter();
        let policy = RateLimitPolicy::new(3, WINDOW);
        for _ in 0..4 {
            limiter.check_and_record("k", policy);
        }

        clock.advance(WINDOW);

        assert!(limiter.check_and_record("k", policy));
        assert_eq!(limiter.entry("k").map(|e| e.count), Some(1));
    }

    #[test]
    fn rejected_calls_keep_failing_until_rollover() {
        let (clock, limiter) = limiter();
        let policy = RateLimitPolicy::new(1, WINDOW);

        assert!(limiter.check_and_record("k", policy));
        for _ in 0..5 {
            clock.advance(Duration::from_secs(5));
            assert!(!limiter.check_and_record("k", policy));
        }
        assert_eq!(limiter.entry("k").map(|e| e.count), Some(6));
    }

    #[test]
    fn first_call_counts_toward_the_limit() {
        let (_clock, limiter) = limiter();
        let policy = RateLimitPolicy::new(1, WINDOW);

        assert!(limiter.check_and_record("k", policy));
        assert!(!limiter.check_and_record("k", policy));
    }

    #[test]
    fn keys_are_independent() {
        let (_clock, limiter) = limiter();
        let policy = RateLimitPolicy::new(1, WINDOW);

        assert!(limiter.check_and_record("profile-update", policy));
        assert!(!limiter.check_and_record("profile-update", policy));
        assert!(limiter.check_and_record("preferences-update", policy));
    }

    #[test]
    fn window_just_before_expiry_still_counts() {
        let (clock, limiter) = limiter();
        let policy = RateLimitPolicy::new(1, WINDOW);

        assert!(limiter.check_and_record("k", policy));
        clock.advance(WINDOW - Duration::from_millis(1));

        assert!(!limiter.check_and_record("k", policy));
    }

    #[test]
    fn retry_after_reports_remaining_window() {
        let (clock, limiter) = limiter();
        let policy = RateLimitPolicy::new(1, WINDOW);

        assert_eq!(limiter.retry_after("k"), None);
        limiter.check_and_record("k", policy);
        clock.advance(Duration::from_secs(20));

        assert_eq!(limiter.retry_after("k"), Some(Duration::from_secs(40)));

        clock.advance(Duration::from_secs(40));
        assert_eq!(limiter.retry_after("k"), None);
    }

    #[test]
    fn reset_forgets_the_key() {
        let (_clock, limiter) = limiter();
        let policy = RateLimitPolicy::new(1, WINDOW);
        limiter.check_and_record("k", policy);

        assert!(limiter.reset("k"));
        assert!(!limiter.reset("k"));
        assert!(limiter.check_and_record("k", policy));
    }

    #[test]
    fn clear_forgets_every_key() {
        let (_clock, limiter) = limiter();
        let policy = RateLimitPolicy::new(1, WINDOW);
        limiter.check_and_record("a", policy);
        limiter.check_and_record("b", policy);

        limiter.clear();

        assert!(limiter.entry("a").is_none());
        assert!(limiter.entry("b").is_none());
    }

    #[test]
    fn default_policy_is_five_per_minute() {
        let policy = RateLimitPolicy::default();

        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.window, Duration::from_secs(60));
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn unusable_policies_are_rejected() {
        assert!(RateLimitPolicy::new(0, WINDOW).validate().is_err());
        assert!(RateLimitPolicy::new(3, Duration::ZERO).validate().is_err());
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let start = Instant::now();
        let clock = ManualClock::new(start);
        let other = clock.clone();

        clock.advance(Duration::from_secs(10));

        assert_eq!(other.now(), start + Duration::from_secs(10));
        other.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();

        assert!(clock.now() >= first);
    }

    #[test]
    fn limiter_is_shareable_across_threads() {
        let limiter = Arc::new(RateLimiter::new());
        let policy = RateLimitPolicy::new(10, WINDOW);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..5)
                        .filter(|_| limiter.check_and_record("k", policy))
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .sum();
        assert_eq!(allowed, 10);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: within one window exactly min(calls, max) calls are allowed
            #[test]
            fn proptest_allowed_calls_never_exceed_max(max in 1u32..20, calls in 0usize..50) {
                let (_clock, limiter) = limiter();
                let policy = RateLimitPolicy::new(max, WINDOW);

                let allowed = (0..calls)
                    .filter(|_| limiter.check_and_record("k", policy))
                    .count();

                prop_assert_eq!(allowed, calls.min(max as usize));
            }

            /// Property: every window rollover restores a full allowance
            #[test]
            fn proptest_rollover_restores_allowance(max in 1u32..10, windows in 1usize..5) {
                let (clock, limiter) = limiter();
                let policy = RateLimitPolicy::new(max, WINDOW);

                for _ in 0..windows {
                    let allowed = (0..max + 2)
                        .filter(|_| limiter.check_and_record("k", policy))
                        .count();
                    prop_assert_eq!(allowed, max as usize);
                    clock.advance(WINDOW);
                }
            }
        }
    }
}
