//! # Frame Pipeline
//!
//! The seal/drain state machine connecting the two threads.
//!
//! ```text
//! Simulation thread                         Presentation thread
//! ─────────────────                         ───────────────────
//! start()  ──> FrameBuilder
//! enqueue() ──> commands, in order
//! seal()   ──> 1. push frame into SPSC queue
//!              2. release-store frame seq as "latest"
//!                                           drain_and_present():
//!                                             acquire-load "latest" snapshot
//!                                             pop frames in FIFO order:
//!                                               update every command
//!                                               draw only the latest frame
//!                                               drop (cleanup) every command
//!                                               flush after each stale frame
//!                                             CAS "latest" snapshot -> none
//! ```
//!
//! The push-then-publish order in `seal` means the consumer can never
//! observe a latest sequence number it cannot also reach by draining the
//! queue; the CAS-clear means a newer frame published mid-drain is never
//! clobbered by a stale clear.
//!
//! Running `update` on frames that will never be drawn is deliberate:
//! update steps carry effects that must happen exactly once per sealed frame
//! and in submission order (resource-cache reference counts, accumulation
//! buffers a later frame's draw reads). `draw` is the only step gated on
//! "is this the frame being shown", because it is the only step with
//! GPU-visible output.

use crate::error::DrainError;
use crate::frame::{Frame, FrameBuilder, FrameSeq};
use crate::queue::spsc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// "No latest frame" marker in the shared slot.
const NO_LATEST: u64 = 0;

/// Boundary between the pipeline and whatever executes rendering work.
///
/// The pipeline itself knows nothing about any graphics API; it only needs
/// a flush boundary to bound the backend work left unexecuted while several
/// stale frames are drained in one call.
pub trait RenderBackend {
    /// Flush pending backend work. Called after each drained stale frame.
    fn flush(&mut self);
}

/// Outcome of a successful [`FrameConsumer::drain_and_present`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// The latest frame was drawn; the caller must now perform the actual
    /// present (buffer swap), exactly once.
    Presented,
    /// Nothing new was sealed since the previous drain; nothing was drawn
    /// and the caller must not present.
    NoPresent,
}

/// State shared between the two handles: just the latest sealed sequence
/// number. Everything else is exclusively owned by one side at a time.
#[derive(Debug)]
struct SharedLatest {
    latest: AtomicU64,
}

/// The frame pipeline. Purely a constructor namespace: all operations live
/// on the two handles it returns.
#[derive(Debug)]
pub struct FramePipeline;

impl FramePipeline {
    /// Creates a pipeline and returns its two ends. Neither handle is
    /// `Clone`; move the producer to the simulation thread and the consumer
    /// to the presentation thread.
    #[must_use]
    pub fn new() -> (FrameProducer, FrameConsumer) {
        let shared = Arc::new(SharedLatest {
            latest: AtomicU64::new(NO_LATEST),
        });
        let (queue_tx, queue_rx) = spsc::channel();
        (
            FrameProducer {
                shared: Arc::clone(&shared),
                queue: queue_tx,
                next_seq: 1,
            },
            FrameConsumer {
                shared,
                queue: queue_rx,
            },
        )
    }
}

/// Simulation-thread end of the pipeline. Builds and seals frames.
#[derive(Debug)]
pub struct FrameProducer {
    shared: Arc<SharedLatest>,
    queue: spsc::Producer<Frame>,
    next_seq: u64,
}

impl FrameProducer {
    /// Opens a new frame. The returned builder borrows this producer, so at
    /// most one frame can be open at a time; seal it with
    /// [`FrameBuilder::seal`] or drop it to abandon.
    pub fn start(&mut self) -> FrameBuilder<'_> {
        let seq = FrameSeq::new(self.next_seq)
            .unwrap_or_else(|| unreachable!("frame sequence wrapped to zero"));
        self.next_seq += 1;
        FrameBuilder::new(self, seq)
    }

    /// Seals `frame`: pushes it into the queue, then publishes its sequence
    /// number as the latest. The order is load-bearing - the consumer must
    /// never observe a latest value it cannot drain to.
    pub(crate) fn publish(&mut self, frame: Frame) -> FrameSeq {
        let seq = frame.seq();
        trace!(seq = seq.get(), commands = frame.remaining(), "frame sealed");
        self.queue.push(frame);
        self.shared.latest.store(seq.get(), Ordering::Release);
        seq
    }
}

/// Presentation-thread end of the pipeline. Drains sealed frames and
/// reports whether a present is due.
#[derive(Debug)]
pub struct FrameConsumer {
    shared: Arc<SharedLatest>,
    queue: spsc::Consumer<Frame>,
}

impl FrameConsumer {
    /// Drains every frame sealed up to this moment and executes it.
    ///
    /// For each queued frame, in seal order: every command's `update` runs,
    /// `draw` runs only if the frame is the snapshotted latest, and the
    /// command is dropped (cleanup) immediately after - unconditionally, in
    /// submission order. After each stale frame the backend is flushed.
    /// Draining stops at the latest frame, whose sequence number is then
    /// compare-and-cleared so the next call without a new seal reports
    /// [`DrainStatus::NoPresent`].
    ///
    /// On [`DrainStatus::Presented`] the caller must perform the actual
    /// buffer swap, exactly once, after this returns.
    ///
    /// # Errors
    ///
    /// [`DrainError::Update`]/[`DrainError::Draw`] when a command fails -
    /// cleanup has still run for every command dequeued by this call.
    /// [`DrainError::FrameLost`] when the queue is exhausted before the
    /// snapshotted latest frame appears; this is a protocol violation
    /// (debug builds assert) and the pipeline must not be trusted afterward.
    pub fn drain_and_present<B>(&mut self, backend: &mut B) -> Result<DrainStatus, DrainError>
    where
        B: RenderBackend + ?Sized,
    {
        let snapshot = self.shared.latest.load(Ordering::Acquire);
        if snapshot == NO_LATEST {
            return Ok(DrainStatus::NoPresent);
        }

        while let Some(mut frame) = self.queue.pop() {
            let seq = frame.seq().get();
            let is_latest = seq == snapshot;
            trace!(seq, is_latest, "draining frame");

            Self::run_frame(&mut frame, is_latest)?;

            if is_latest {
                // Clear only if no newer frame was sealed mid-drain.
                let _ = self.shared.latest.compare_exchange(
                    snapshot,
                    NO_LATEST,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                return Ok(DrainStatus::Presented);
            }
            backend.flush();
        }

        error!(seq = snapshot, "latest frame missing from queue");
        debug_assert!(
            false,
            "frame {snapshot} was published as latest but never drained"
        );
        Err(DrainError::FrameLost { seq: snapshot })
    }

    /// Final teardown drain, run once the producer has stopped sealing:
    /// every still-queued frame gets `update` and cleanup for each command
    /// (never `draw` - nothing will be shown), with a flush after each
    /// frame. Also clears the latest marker.
    ///
    /// Called automatically on drop as a last resort, where command errors
    /// can no longer be reported.
    ///
    /// # Errors
    ///
    /// [`DrainError::Update`] when a command's update fails; cleanup still
    /// runs for everything dequeued, and dropping the consumer afterwards
    /// cleans up whatever remains.
    pub fn finish<B>(&mut self, backend: &mut B) -> Result<(), DrainError>
    where
        B: RenderBackend + ?Sized,
    {
        self.shared.latest.store(NO_LATEST, Ordering::Release);
        let mut frames = 0_u64;
        while let Some(mut frame) = self.queue.pop() {
            Self::run_frame(&mut frame, false)?;
            backend.flush();
            frames += 1;
        }
        debug!(frames, "pipeline finished");
        Ok(())
    }

    /// Executes one frame's commands in submission order. Each command is
    /// dropped as soon as its steps complete; on error the failing command
    /// drops here and the rest of the frame drops with `frame` itself, so
    /// cleanup is never skipped.
    fn run_frame(frame: &mut Frame, draw_now: bool) -> Result<(), DrainError> {
        let seq = frame.seq().get();
        while let Some(mut command) = frame.next_command() {
            command
                .update()
                .map_err(|source| DrainError::Update { seq, source })?;
            if draw_now {
                command
                    .draw()
                    .map_err(|source| DrainError::Draw { seq, source })?;
            }
            // `command` drops here: cleanup, exactly once, in order.
        }
        Ok(())
    }
}

impl Drop for FrameConsumer {
    fn drop(&mut self) {
        struct NullBackend;
        impl RenderBackend for NullBackend {
            fn flush(&mut self) {}
        }
        // Errors are unreportable during drop; cleanup still runs for every
        // command because frames and queue drain through their own drops.
        if let Err(err) = self.finish(&mut NullBackend) {
            error!(%err, "command failed during pipeline teardown");
        }
    }
}
