//! # Present Loop Driver
//!
//! The presentation thread's main loop. Owns the pipeline's consumer end and
//! a backend, drains on a paced cadence, presents when the pipeline says a
//! new latest frame was drawn, and flushes everything out on shutdown.
//!
//! Pacing follows the rule the frame handoff implies: the loop's interval is
//! the *longer* of the display's refresh interval and the simulation's tick
//! interval - the slower cadence wins, because presenting more often than
//! new frames can exist burns a core for identical images. The stepper is
//! reseeded whenever its timeline stops being trustworthy: a skipped sleep,
//! a changed interval (display mode change, tick-rate change), or a drain
//! that had nothing to present.

use crate::clock::Clock;
use crate::pacing::Stepper;
use crossbeam_channel::{bounded, Receiver, Sender};
use phosphor_core::{DrainStatus, FrameConsumer, RenderBackend};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// A backend failure while presenting (buffer swap failure and kin).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("present failed: {reason}")]
pub struct BackendError {
    /// Backend-provided reason.
    pub reason: String,
}

/// Fatal errors that end the present loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresentError {
    /// The pipeline drain failed: command error or protocol violation.
    #[error("pipeline drain failed: {0}")]
    Drain(#[from] phosphor_core::DrainError),

    /// The backend failed to present a drawn frame.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// What the present loop needs from a backend beyond the pipeline's flush
/// boundary: the actual present, and the display's current cadence.
pub trait PresentBackend: RenderBackend {
    /// Makes the latest drawn output visible (buffer swap). Called exactly
    /// once per drain that returns [`DrainStatus::Presented`].
    ///
    /// # Errors
    ///
    /// Any [`BackendError`] is fatal to the present loop.
    fn present(&mut self) -> Result<(), BackendError>;

    /// The display's current refresh interval. Re-queried every loop
    /// iteration so display mode changes take effect immediately.
    fn refresh_interval(&mut self) -> Duration;
}

/// Shared, lock-free view of the present loop's measured cadence.
///
/// The loop records the measured interval of every step; any thread (the
/// simulation thread, typically, for interpolation or stats) can read the
/// most recent value.
#[derive(Debug, Clone, Default)]
pub struct FrameRateGauge {
    nanos: Arc<AtomicU64>,
}

impl FrameRateGauge {
    /// Creates a gauge with no recorded interval yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the latest measured present interval.
    pub fn record(&self, interval: Duration) {
        // Saturate rather than wrap; ~584 years of nanoseconds.
        let nanos = u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.store(nanos, Ordering::Relaxed);
    }

    /// The most recently recorded interval, or `None` before the first one.
    #[must_use]
    pub fn interval(&self) -> Option<Duration> {
        match self.nanos.load(Ordering::Relaxed) {
            0 => None,
            nanos => Some(Duration::from_nanos(nanos)),
        }
    }
}

/// Requests the present loop to exit. Clonable; stopping twice is harmless.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stop: Sender<()>,
}

impl StopHandle {
    /// Asks the loop to exit after its current iteration. Idempotent: if
    /// the loop is already gone or already stopping this does nothing.
    pub fn stop(&self) {
        let _ = self.stop.try_send(());
    }
}

/// Configuration for the present loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// The simulation's logical tick interval; the loop never paces faster
    /// than this, whatever the display claims.
    pub tick_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            // 60 logical ticks per second.
            tick_interval: Duration::from_nanos(1_000_000_000 / 60),
        }
    }
}

/// The present loop. Built on whichever thread, then moved to the
/// presentation thread and [`run`](Self::run).
#[derive(Debug)]
pub struct PresentDriver<B, C: Clock> {
    consumer: FrameConsumer,
    backend: B,
    stepper: Stepper<C>,
    config: DriverConfig,
    gauge: FrameRateGauge,
    stop: Receiver<()>,
}

impl<B, C> PresentDriver<B, C>
where
    B: PresentBackend,
    C: Clock,
{
    /// Creates a driver and the handle that stops it.
    #[must_use]
    pub fn new(
        consumer: FrameConsumer,
        backend: B,
        clock: C,
        config: DriverConfig,
    ) -> (Self, StopHandle) {
        let (stop_tx, stop_rx) = bounded(1);
        let stepper = Stepper::new(clock, config.tick_interval);
        (
            Self {
                consumer,
                backend,
                stepper,
                config,
                gauge: FrameRateGauge::new(),
                stop: stop_rx,
            },
            StopHandle { stop: stop_tx },
        )
    }

    /// Returns a clone of the gauge publishing the loop's measured cadence.
    #[must_use]
    pub fn gauge(&self) -> FrameRateGauge {
        self.gauge.clone()
    }

    /// Runs the present loop until stopped or a fatal error.
    ///
    /// On a clean stop the loop performs the final drain: everything still
    /// queued gets its `update` and cleanup (never `draw`), so no sealed
    /// frame's side effects are lost at shutdown. Returns the backend for
    /// inspection or reuse.
    ///
    /// # Errors
    ///
    /// [`PresentError::Drain`] and [`PresentError::Backend`] are both fatal;
    /// the caller should treat them as fatal to the process's rendering and
    /// shut down, since a broken pipeline would serve arbitrary stale
    /// frames.
    pub fn run(mut self) -> Result<B, PresentError> {
        debug!("present loop starting");
        let mut skipped = false;
        let mut last_status = DrainStatus::NoPresent;

        while self.stop.try_recv().is_err() {
            let status = match self.consumer.drain_and_present(&mut self.backend) {
                Ok(status) => status,
                Err(err) => {
                    error!(%err, "fatal drain error in present loop");
                    return Err(err.into());
                }
            };
            if status == DrainStatus::Presented {
                self.backend.present()?;
            }

            // The slower cadence wins: never present faster than the
            // simulation makes frames, nor than the display shows them.
            let target = self
                .backend
                .refresh_interval()
                .max(self.config.tick_interval);

            // The timeline is only worth keeping while it is actually
            // pacing presents: a skip, an interval change, or an idle drain
            // restarts it. Keeping the accumulator across healthy presents
            // is the point - that is what absorbs sleep jitter.
            if skipped || target != self.stepper.interval() || last_status != DrainStatus::Presented
            {
                self.stepper.reseed(target);
            }
            last_status = status;

            let outcome = self.stepper.step();
            skipped = !outcome.slept;
            self.gauge.record(outcome.measured);
        }

        debug!("present loop stopping, flushing remaining frames");
        self.consumer.finish(&mut self.backend)?;
        Ok(self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use phosphor_core::{FnCommand, FramePipeline};
    use std::sync::Mutex;

    /// Backend that records the interesting calls.
    #[derive(Debug, Default)]
    struct RecordingBackend {
        flushes: usize,
        presents: usize,
        refresh: Duration,
        fail_present: bool,
    }

    impl RenderBackend for RecordingBackend {
        fn flush(&mut self) {
            self.flushes += 1;
        }
    }

    impl PresentBackend for RecordingBackend {
        fn present(&mut self) -> Result<(), BackendError> {
            if self.fail_present {
                return Err(BackendError {
                    reason: "swap chain lost".to_string(),
                });
            }
            self.presents += 1;
            Ok(())
        }

        fn refresh_interval(&mut self) -> Duration {
            self.refresh
        }
    }

    fn driver_with(
        consumer: FrameConsumer,
        backend: RecordingBackend,
        clock: ManualClock,
    ) -> (PresentDriver<RecordingBackend, ManualClock>, StopHandle) {
        PresentDriver::new(
            consumer,
            backend,
            clock,
            DriverConfig {
                tick_interval: Duration::from_millis(10),
            },
        )
    }

    #[test]
    fn test_presents_once_per_sealed_frame() {
        let (mut producer, consumer) = FramePipeline::new();
        let clock = ManualClock::new();
        let backend = RecordingBackend {
            refresh: Duration::from_millis(5),
            ..RecordingBackend::default()
        };
        let (driver, stop) = driver_with(consumer, backend, clock);

        // The sealed frame itself requests the stop from its draw step, so
        // the first iteration presents and the second sees the stop.
        let mut builder = producer.start();
        builder.enqueue_command(FnCommand::new().on_draw(move || {
            stop.stop();
            Ok(())
        }));
        builder.seal();
        let backend = driver.run().expect("present loop failed");
        assert_eq!(backend.presents, 1);
    }

    #[test]
    fn test_backend_present_failure_is_fatal() {
        let (mut producer, consumer) = FramePipeline::new();
        let backend = RecordingBackend {
            fail_present: true,
            ..RecordingBackend::default()
        };
        let (driver, _stop) = driver_with(consumer, backend, ManualClock::new());

        producer.start().seal();
        let err = driver.run().expect_err("present should fail");
        assert!(matches!(err, PresentError::Backend(_)));
    }

    #[test]
    fn test_final_drain_flushes_queued_frames() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (mut producer, consumer) = FramePipeline::new();
        let (driver, stop) = driver_with(
            consumer,
            RecordingBackend::default(),
            ManualClock::new(),
        );

        for tag in ["a", "b"] {
            let mut builder = producer.start();
            let seen = Arc::clone(&log);
            builder.enqueue_command(FnCommand::new().on_update(move || {
                seen.lock().expect("log poisoned").push(tag);
                Ok(())
            }));
            builder.seal();
        }

        // Stop before the first iteration: the loop exits immediately and
        // the final drain still runs every queued frame's update.
        stop.stop();
        let _backend = driver.run().expect("present loop failed");
        assert_eq!(*log.lock().expect("log poisoned"), vec!["a", "b"]);
    }

    #[test]
    fn test_gauge_publishes_measured_interval() {
        let (mut producer, consumer) = FramePipeline::new();
        let clock = ManualClock::new();
        let backend = RecordingBackend {
            refresh: Duration::from_millis(20),
            ..RecordingBackend::default()
        };
        let (driver, stop) = driver_with(consumer, backend, clock);
        let gauge = driver.gauge();
        assert_eq!(gauge.interval(), None);

        let mut builder = producer.start();
        builder.enqueue_command(FnCommand::new().on_draw(move || {
            stop.stop();
            Ok(())
        }));
        builder.seal();
        let _backend = driver.run().expect("present loop failed");
        // Display at 50 Hz is slower than ticks at 100 Hz: 20ms cadence.
        assert_eq!(gauge.interval(), Some(Duration::from_millis(20)));
    }
}
