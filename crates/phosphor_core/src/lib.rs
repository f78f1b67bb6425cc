//! # PHOSPHOR Core
//!
//! Lock-free frame handoff between exactly two threads:
//!
//! ```text
//! ┌──────────────┐  start/enqueue/end   ┌─────────────┐   drain + present   ┌──────────────┐
//! │  Simulation  │─────────────────────>│ Frame Queue │────────────────────>│ Presentation │
//! │   (producer) │   sealed frames      │   (SPSC)    │  latest frame only  │  (consumer)  │
//! └──────────────┘                      └─────────────┘                     └──────────────┘
//! ```
//!
//! The simulation thread runs at a fixed logical rate and the presentation
//! thread at the display's variable rate. Neither side ever blocks on the
//! other; the presentation thread processes *every* sealed frame in order
//! (so one-shot side effects always run) but draws only the most recently
//! sealed one.
//!
//! ## Architecture Rules
//!
//! 1. **One producer, one consumer** - enforced at the type level, not by
//!    runtime assertions: the handle types are not `Clone`.
//! 2. **No locks** - the only cross-thread state is the SPSC queue's node
//!    links and one atomic sequence number, all acquire/release.
//! 3. **Nothing is dropped silently** - every command of every sealed frame
//!    has its `update` run and its drop cleanup run exactly once, even for
//!    frames that are never drawn.

pub mod command;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod queue;

pub use command::{FnCommand, RenderCommand};
pub use error::{CommandError, DrainError};
pub use frame::{Frame, FrameBuilder, FrameSeq};
pub use pipeline::{DrainStatus, FrameConsumer, FrameProducer, FramePipeline, RenderBackend};
pub use queue::local::LocalQueue;
pub use queue::spsc;
