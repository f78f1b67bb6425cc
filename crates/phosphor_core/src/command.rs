//! # Render Commands
//!
//! A command is one deferred rendering operation: clear the target, submit a
//! sprite batch, submit glyphs, and so on. Commands are built on the
//! simulation thread and executed on the presentation thread, so anything
//! they capture must be `Send`.
//!
//! Each command has up to three steps:
//!
//! - [`RenderCommand::update`]: side effects that must run exactly once per
//!   sealed frame, in submission order, whether or not the frame is ever
//!   drawn - resolving names through a reference-counted resource cache,
//!   appending geometry into an accumulation buffer a later frame reads, etc.
//! - [`RenderCommand::draw`]: the user-visible work. Run only for the frame
//!   being shown right now.
//! - cleanup: the command's `Drop` impl. The pipeline drops every command it
//!   dequeues immediately after its steps, so cleanup runs exactly once, in
//!   submission order, after `update`/`draw`, on every path including aborts.

use crate::error::CommandError;

/// One deferred rendering operation.
///
/// The implementor itself is the command's state; the pipeline owns it from
/// enqueue until the `Drop` after execution.
pub trait RenderCommand: Send {
    /// Per-frame side effects. Runs for every sealed frame, drawn or not.
    ///
    /// An error is fatal to the drain that invoked it.
    fn update(&mut self) -> Result<(), CommandError> {
        Ok(())
    }

    /// Submits the command's visible work to the backend. Runs only when the
    /// containing frame is the latest one at drain time.
    ///
    /// An error is fatal to the drain that invoked it.
    fn draw(&mut self) -> Result<(), CommandError> {
        Ok(())
    }
}

/// Type of the boxed `update`/`draw` callbacks of [`FnCommand`].
pub type StepFn = Box<dyn FnMut() -> Result<(), CommandError> + Send>;

/// Type of the boxed cleanup callback of [`FnCommand`].
pub type CleanupFn = Box<dyn FnOnce() + Send>;

/// A [`RenderCommand`] assembled from closures.
///
/// The step closures are optional, mirroring how callers typically need only
/// one or two of them (a clear has no cleanup, a cache release has no draw).
///
/// # Example
///
/// ```
/// use phosphor_core::FnCommand;
///
/// let cmd = FnCommand::new()
///     .on_update(|| Ok(()))
///     .on_cleanup(|| { /* release the sprite batch */ });
/// # let _ = cmd;
/// ```
#[derive(Default)]
pub struct FnCommand {
    update: Option<StepFn>,
    draw: Option<StepFn>,
    cleanup: Option<CleanupFn>,
}

impl FnCommand {
    /// Creates a command with no steps. Each step defaults to a no-op.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `update` step.
    #[must_use]
    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> Result<(), CommandError> + Send + 'static,
    {
        self.update = Some(Box::new(f));
        self
    }

    /// Sets the `draw` step.
    #[must_use]
    pub fn on_draw<F>(mut self, f: F) -> Self
    where
        F: FnMut() -> Result<(), CommandError> + Send + 'static,
    {
        self.draw = Some(Box::new(f));
        self
    }

    /// Sets the cleanup step, run from `Drop` exactly once.
    #[must_use]
    pub fn on_cleanup<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.cleanup = Some(Box::new(f));
        self
    }
}

impl RenderCommand for FnCommand {
    fn update(&mut self) -> Result<(), CommandError> {
        match &mut self.update {
            Some(step) => step(),
            None => Ok(()),
        }
    }

    fn draw(&mut self) -> Result<(), CommandError> {
        match &mut self.draw {
            Some(step) => step(),
            None => Ok(()),
        }
    }
}

impl Drop for FnCommand {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl std::fmt::Debug for FnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCommand")
            .field("update", &self.update.is_some())
            .field("draw", &self.draw.is_some())
            .field("cleanup", &self.cleanup.is_some())
            .finish()
    }
}
