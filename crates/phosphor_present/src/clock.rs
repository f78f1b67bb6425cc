//! # Clocks
//!
//! The pacing stepper needs only two primitives: a monotonic "now" and a
//! "sleep until". They sit behind a trait so the stepper's timing logic is
//! testable with a clock the test advances by hand.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Monotonic time source plus the ability to block until a point on it.
///
/// `now` is a [`Duration`] since an arbitrary per-clock epoch; only
/// differences are meaningful.
pub trait Clock {
    /// Current monotonic time.
    fn now(&self) -> Duration;

    /// Blocks the calling thread until at least `deadline`. A deadline in
    /// the past returns immediately.
    fn sleep_until(&self, deadline: Duration);
}

/// The real clock: `Instant`-based, sleeps with `std::thread::sleep`.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose epoch is the moment of creation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep_until(&self, deadline: Duration) {
        let now = self.epoch.elapsed();
        if let Some(remaining) = deadline.checked_sub(now) {
            std::thread::sleep(remaining);
        }
    }
}

/// A clock tests drive by hand. `sleep_until` jumps time forward instead of
/// blocking, so pacing tests run instantly and deterministically.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
    /// How late every sleep wakes, mimicking OS scheduler slop.
    oversleep: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Creates a manual clock starting at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `delta` without sleeping.
    pub fn advance(&self, delta: Duration) {
        *self.now.lock().expect("clock poisoned") += delta;
    }

    /// Makes every subsequent sleep wake `slop` past its deadline.
    pub fn set_oversleep(&self, slop: Duration) {
        *self.oversleep.lock().expect("clock poisoned") = slop;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().expect("clock poisoned")
    }

    fn sleep_until(&self, deadline: Duration) {
        let slop = *self.oversleep.lock().expect("clock poisoned");
        let mut now = self.now.lock().expect("clock poisoned");
        if deadline > *now {
            *now = deadline + slop;
        }
    }
}
