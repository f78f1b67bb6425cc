//! # Pacing Stepper
//!
//! Fixed-timeline sleep stepper for the presentation loop.
//!
//! Each [`Stepper::step`] sleeps until the next point on a timeline spaced
//! `interval` apart, rather than "now plus interval" - so oversleeping one
//! step shortens the next instead of drifting the whole cadence. The carried
//! overshoot lives in an accumulator, exactly the bookkeeping the present
//! loop wants to keep but reset at the right moments:
//!
//! - a step whose deadline already passed is *skipped* (no sleep), and the
//!   caller is expected to [`reseed`](Stepper::reseed) before relying on the
//!   timeline again;
//! - changing the interval (display mode change, tick-rate change) also
//!   requires a reseed, which restarts the timeline at "now" with an empty
//!   accumulator.

use crate::clock::Clock;
use std::time::Duration;
use tracing::warn;

/// What one call to [`Stepper::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// `false` when the deadline had already passed and no sleep happened.
    pub slept: bool,
    /// Measured time from the previous step point to the new one. Equals the
    /// configured interval when pacing is holding.
    pub measured: Duration,
}

/// Accumulator-based fixed-timeline stepper.
#[derive(Debug)]
pub struct Stepper<C: Clock> {
    clock: C,
    interval: Duration,
    /// The timeline point the previous step ended on.
    step_point: Duration,
    /// Overshoot carried from oversleeping, subtracted from future sleeps.
    accumulator: Duration,
}

impl<C: Clock> Stepper<C> {
    /// Creates a stepper whose timeline starts at the clock's current time.
    #[must_use]
    pub fn new(clock: C, interval: Duration) -> Self {
        let step_point = clock.now();
        Self {
            clock,
            interval,
            step_point,
            accumulator: Duration::ZERO,
        }
    }

    /// Returns the configured interval.
    #[inline]
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Restarts the timeline at "now" with `interval` and an empty
    /// accumulator. Call after a skipped step, after the interval's source
    /// changed (display mode, tick rate), or after a pause.
    pub fn reseed(&mut self, interval: Duration) {
        self.interval = interval;
        self.step_point = self.clock.now();
        self.accumulator = Duration::ZERO;
    }

    /// Sleeps until the next timeline point, or detects that it already
    /// passed.
    ///
    /// On time: sleeps, lands on `step_point + interval`, carries the
    /// oversleep into the accumulator so the next sleep is shortened.
    /// Late: no sleep, the timeline restarts from "now", and the outcome
    /// reports `slept: false`.
    pub fn step(&mut self) -> StepOutcome {
        let start = self.step_point;
        let deadline = start + self.interval;
        let now = self.clock.now();

        if now + self.accumulator >= deadline {
            // Already past the deadline (or the carried overshoot eats the
            // whole sleep): skip sleeping entirely.
            warn!(
                behind_us = (now + self.accumulator - deadline).as_micros() as u64,
                "pacing deadline missed, sleep skipped"
            );
            self.step_point = now;
            self.accumulator = Duration::ZERO;
            return StepOutcome {
                slept: false,
                measured: now.saturating_sub(start),
            };
        }

        self.clock.sleep_until(deadline - self.accumulator);
        let woke = self.clock.now();
        // Stay on the timeline; remember how far past the target we woke.
        self.step_point = deadline;
        self.accumulator = woke.saturating_sub(deadline);
        StepOutcome {
            slept: true,
            measured: deadline.saturating_sub(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TICK: Duration = Duration::from_millis(10);

    #[test]
    fn test_steps_land_on_fixed_timeline() {
        let clock = ManualClock::new();
        let mut stepper = Stepper::new(clock.clone(), TICK);

        for i in 1..=5_u32 {
            let outcome = stepper.step();
            assert!(outcome.slept);
            assert_eq!(outcome.measured, TICK);
            assert_eq!(clock.now(), TICK * i);
        }
    }

    #[test]
    fn test_late_arrival_skips_sleep() {
        let clock = ManualClock::new();
        let mut stepper = Stepper::new(clock.clone(), TICK);

        // The frame took 2.5 intervals; the deadline is long gone.
        clock.advance(TICK * 5 / 2);
        let outcome = stepper.step();
        assert!(!outcome.slept);
        assert_eq!(outcome.measured, TICK * 5 / 2);
        // No time passed; the caller reseeds and pacing resumes.
        assert_eq!(clock.now(), TICK * 5 / 2);
    }

    #[test]
    fn test_oversleep_shortens_next_sleep() {
        let clock = ManualClock::new();
        let mut stepper = Stepper::new(clock.clone(), TICK);

        // The OS wakes us 2ms past every deadline.
        clock.set_oversleep(Duration::from_millis(2));
        let outcome = stepper.step();
        assert!(outcome.slept);
        assert_eq!(clock.now(), Duration::from_millis(12));

        // The carried overshoot shortens the next sleep target by 2ms, so
        // with perfect sleeps the timeline lands back on schedule.
        clock.set_oversleep(Duration::ZERO);
        let outcome = stepper.step();
        assert!(outcome.slept);
        assert_eq!(outcome.measured, TICK);
        assert_eq!(clock.now(), Duration::from_millis(18));
    }

    #[test]
    fn test_reseed_restarts_timeline_at_now() {
        let clock = ManualClock::new();
        let mut stepper = Stepper::new(clock.clone(), TICK);
        clock.advance(TICK * 10);
        stepper.reseed(TICK * 2);

        let outcome = stepper.step();
        assert!(outcome.slept);
        assert_eq!(outcome.measured, TICK * 2);
        assert_eq!(clock.now(), TICK * 12);
    }
}
