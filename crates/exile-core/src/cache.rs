//! Frame- and time-scoped memoization
//!
//! A [`CachedValue`] is a small state machine: it starts `Empty`, becomes
//! `Valid` with the stamp of the frame or instant it was produced in, and is
//! considered stale once the policy's token source has moved past that stamp.
//! The token sources ([`FrameCounter`], [`Clock`]) are injectable so caches can
//! be tested without a live process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use strum::Display;

static GLOBAL_FRAME: LazyLock<FrameCounter> = LazyLock::new(FrameCounter::new);

/// Monotonically increasing frame tick
#[derive(Debug, Clone, Default)]
pub struct FrameCounter(Arc<AtomicU64>);

impl FrameCounter {
    /// Create an independent counter starting at frame 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide counter advanced by the update loop
    pub fn global() -> Self {
        GLOBAL_FRAME.clone()
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Advance to the next frame, returning the new tick
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Wall-clock source for time-scoped caches
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CacheScope {
    #[strum(serialize = "frame")]
    Frame,
    #[strum(serialize = "time")]
    Time,
}

/// Invalidation rule of a [`CachedValue`]
#[derive(Clone)]
pub enum CachePolicy {
    /// Stale once the frame counter moves on
    Frame(FrameCounter),
    /// Stale once `window` has elapsed since production
    Time {
        window: Duration,
        clock: Arc<dyn Clock>,
    },
}

impl CachePolicy {
    pub fn scope(&self) -> CacheScope {
        match self {
            CachePolicy::Frame(_) => CacheScope::Frame,
            CachePolicy::Time { .. } => CacheScope::Time,
        }
    }

    fn stamp(&self) -> Stamp {
        match self {
            CachePolicy::Frame(counter) => Stamp::Frame(counter.current()),
            CachePolicy::Time { clock, .. } => Stamp::Time(clock.now()),
        }
    }

    fn is_fresh(&self, produced: Stamp, now: Stamp) -> bool {
        match (self, produced, now) {
            (CachePolicy::Frame(_), Stamp::Frame(produced), Stamp::Frame(now)) => produced == now,
            (CachePolicy::Time { window, .. }, Stamp::Time(produced), Stamp::Time(now)) => {
                now.saturating_duration_since(produced) < *window
            }
            _ => false,
        }
    }
}

impl std::fmt::Debug for CachePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CachePolicy::Frame(counter) => f.debug_tuple("Frame").field(&counter.current()).finish(),
            CachePolicy::Time { window, .. } => {
                f.debug_struct("Time").field("window", window).finish_non_exhaustive()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stamp {
    Frame(u64),
    Time(Instant),
}

enum CacheState<T> {
    Empty,
    Valid { value: T, stamp: Stamp },
}

type Producer<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Memoized value recomputed once per invalidation window
///
/// The lock only guards the stored state and is released while the producer
/// runs, so two threads crossing a boundary at once may both produce.
pub struct CachedValue<T> {
    producer: Producer<T>,
    policy: CachePolicy,
    state: Mutex<CacheState<T>>,
}

impl<T: Clone> CachedValue<T> {
    pub fn new<F>(policy: CachePolicy, producer: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            producer: Box::new(producer),
            policy,
            state: Mutex::new(CacheState::Empty),
        }
    }

    /// Invalidated whenever `counter` advances
    pub fn frame<F>(counter: FrameCounter, producer: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(CachePolicy::Frame(counter), producer)
    }

    /// Invalidated `window` after each production
    pub fn time<F>(window: Duration, clock: Arc<dyn Clock>, producer: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::new(CachePolicy::Time { window, clock }, producer)
    }

    pub fn value(&self) -> T {
        let now = self.policy.stamp();
        {
            let state = self.state.lock();
            if let CacheState::Valid { value, stamp } = &*state {
                if self.policy.is_fresh(*stamp, now) {
                    return value.clone();
                }
            }
        }

        let value = (self.producer)();
        *self.state.lock() = CacheState::Valid {
            value: value.clone(),
            stamp: now,
        };
        value
    }

    /// Whether the next `value()` call would be served from the cache
    pub fn is_valid(&self) -> bool {
        match &*self.state.lock() {
            CacheState::Valid { stamp, .. } => self.policy.is_fresh(*stamp, self.policy.stamp()),
            CacheState::Empty => false,
        }
    }

    /// Drop the stored value
    pub fn invalidate(&self) {
        *self.state.lock() = CacheState::Empty;
    }

    pub fn scope(&self) -> CacheScope {
        self.policy.scope()
    }
}

impl<T> std::fmt::Debug for CachedValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedValue")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_producer() -> (Arc<AtomicUsize>, impl Fn() -> usize + Send + Sync + 'static) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        (calls, move || counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[test]
    fn test_frame_cache_produces_once_per_frame() {
        let frames = FrameCounter::new();
        let (calls, producer) = counting_producer();
        let cache = CachedValue::frame(frames.clone(), producer);

        assert_eq!(cache.value(), 1);
        assert_eq!(cache.value(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        frames.advance();
        assert!(!cache.is_valid());
        assert_eq!(cache.value(), 2);
        assert_eq!(cache.value(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_time_cache_window() {
        let clock = Arc::new(ManualClock::new());
        let (calls, producer) = counting_producer();
        let cache = CachedValue::time(Duration::from_millis(200), clock.clone(), producer);

        assert_eq!(cache.value(), 1);
        clock.advance(Duration::from_millis(199));
        assert_eq!(cache.value(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::from_millis(1));
        assert_eq!(cache.value(), 2);
        assert_eq!(cache.value(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_time_cache_ignores_frames() {
        let clock = Arc::new(ManualClock::new());
        let (calls, producer) = counting_producer();
        let cache = CachedValue::time(Duration::from_millis(200), clock, producer);

        cache.value();
        FrameCounter::global().advance();
        cache.value();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate() {
        let frames = FrameCounter::new();
        let (calls, producer) = counting_producer();
        let cache = CachedValue::frame(frames, producer);

        assert!(!cache.is_valid());
        cache.value();
        assert!(cache.is_valid());
        cache.invalidate();
        cache.value();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_frame_counter_is_shared_between_clones() {
        let frames = FrameCounter::new();
        let clone = frames.clone();
        assert_eq!(frames.advance(), 1);
        assert_eq!(clone.current(), 1);
    }

    #[test]
    fn test_scope_display() {
        let cache = CachedValue::frame(FrameCounter::new(), || 0u8);
        assert_eq!(cache.scope(), CacheScope::Frame);
        assert_eq!(cache.scope().to_string(), "frame");
    }
}
