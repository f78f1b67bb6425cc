//! # Demo Simulation
//!
//! Builds the frames the demo's simulation thread seals each tick: a clear,
//! a sprite batch, and a glyph batch, all recording into a shared log the
//! way real commands would talk to a resource cache and a GPU queue.
//!
//! The split between the steps mirrors their contracts: `update` effects
//! (cache references, accumulation) must happen for every sealed frame, so
//! they are logged unconditionally; `draw` effects are logged only when the
//! pipeline actually shows the frame; cleanup logs when the command drops.

use parking_lot::Mutex;
use phosphor_core::{FnCommand, FrameProducer, FrameSeq};
use std::sync::Arc;

/// Ordered log of command activity, shared between the two threads.
///
/// Stands in for the GPU queue and resource cache that real commands would
/// touch; tests assert against its order.
#[derive(Debug, Clone, Default)]
pub struct RenderLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl RenderLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one event.
    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    /// Takes every event logged so far, in order.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Number of events logged so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns `true` if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

/// One command that logs `update:{tag}`, `draw:{tag}`, `cleanup:{tag}`.
fn logging_command(log: &RenderLog, tag: String) -> FnCommand {
    let (update_log, draw_log, cleanup_log) = (log.clone(), log.clone(), log.clone());
    let (update_tag, draw_tag, cleanup_tag) = (tag.clone(), tag.clone(), tag);
    FnCommand::new()
        .on_update(move || {
            update_log.record(format!("update:{update_tag}"));
            Ok(())
        })
        .on_draw(move || {
            draw_log.record(format!("draw:{draw_tag}"));
            Ok(())
        })
        .on_cleanup(move || cleanup_log.record(format!("cleanup:{cleanup_tag}")))
}

/// Builds and seals one tick's frame: clear, sprites, glyphs, in that
/// order. Returns the sealed frame's sequence number.
pub fn build_tick_frame(producer: &mut FrameProducer, tick: u64, log: &RenderLog) -> FrameSeq {
    let mut builder = producer.start();
    builder.enqueue_command(logging_command(log, format!("clear@{tick}")));
    builder.enqueue_command(logging_command(log, format!("sprites@{tick}")));
    builder.enqueue_command(logging_command(log, format!("glyphs@{tick}")));
    builder.seal()
}
