//! # Frames
//!
//! A frame is one sealed, ordered batch of commands: everything one logical
//! simulation tick wants rendered. Frames are built on the simulation thread
//! through a [`FrameBuilder`] and become immutable the instant they are
//! sealed; from then on the presentation thread is the only code that
//! touches them.

use crate::command::RenderCommand;
use crate::queue::local::LocalQueue;
use std::num::NonZeroU64;

/// Identity of a sealed frame.
///
/// Sequence numbers are assigned monotonically by the producer; the shared
/// "latest" slot stores the raw value (with 0 meaning "none"), so "is this
/// the frame being shown right now" is a sequence comparison rather than a
/// pointer comparison into memory the consumer is about to free.
pub type FrameSeq = NonZeroU64;

/// One sealed batch of commands. Produced by [`FrameBuilder::seal`] via the
/// pipeline; consumed command-by-command by the presentation thread.
pub struct Frame {
    seq: FrameSeq,
    commands: LocalQueue<Box<dyn RenderCommand>>,
}

impl Frame {
    /// Returns this frame's sequence number.
    #[inline]
    #[must_use]
    pub fn seq(&self) -> FrameSeq {
        self.seq
    }

    /// Returns the number of commands not yet executed.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.commands.len()
    }

    /// Removes and returns the next command in submission order.
    pub(crate) fn next_command(&mut self) -> Option<Box<dyn RenderCommand>> {
        self.commands.dequeue()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("seq", &self.seq)
            .field("remaining", &self.commands.len())
            .finish()
    }
}

/// An open, not-yet-sealed frame.
///
/// Returned by [`FrameProducer::start`](crate::pipeline::FrameProducer::start),
/// which borrows the producer for the builder's lifetime - so a second
/// `start` before this frame is sealed or abandoned is a compile error, where
/// the C-style protocol would silently leak the first frame.
///
/// Dropping a builder without sealing abandons the frame: its commands'
/// cleanup runs right here on the simulation thread and nothing is published.
pub struct FrameBuilder<'p> {
    producer: &'p mut crate::pipeline::FrameProducer,
    frame: Option<Frame>,
}

impl<'p> FrameBuilder<'p> {
    pub(crate) fn new(producer: &'p mut crate::pipeline::FrameProducer, seq: FrameSeq) -> Self {
        Self {
            producer,
            frame: Some(Frame {
                seq,
                commands: LocalQueue::new(),
            }),
        }
    }

    /// Appends a command to the open frame. Commands run in submission order.
    pub fn enqueue(&mut self, command: Box<dyn RenderCommand>) {
        self.open_frame().commands.enqueue(command);
    }

    /// Convenience for [`enqueue`](Self::enqueue) without the caller boxing.
    pub fn enqueue_command<C: RenderCommand + 'static>(&mut self, command: C) {
        self.enqueue(Box::new(command));
    }

    /// Returns the sequence number this frame will carry once sealed.
    #[must_use]
    pub fn seq(&self) -> FrameSeq {
        self.frame
            .as_ref()
            .unwrap_or_else(|| unreachable!("builder frame taken before seal"))
            .seq
    }

    /// Returns the number of commands enqueued so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frame.as_ref().map_or(0, |f| f.commands.len())
    }

    /// Returns `true` if no commands have been enqueued yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seals the frame: publishes it into the shared queue and then marks it
    /// as the latest. Consumes the builder; the producer is free for the
    /// next `start` afterwards. Returns the sealed frame's sequence number.
    pub fn seal(mut self) -> FrameSeq {
        let frame = self
            .frame
            .take()
            .unwrap_or_else(|| unreachable!("builder frame taken before seal"));
        self.producer.publish(frame)
    }

    fn open_frame(&mut self) -> &mut Frame {
        self.frame
            .as_mut()
            .unwrap_or_else(|| unreachable!("builder frame taken before seal"))
    }
}

impl std::fmt::Debug for FrameBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuilder")
            .field("frame", &self.frame)
            .finish()
    }
}
