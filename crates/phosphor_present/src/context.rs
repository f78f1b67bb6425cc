//! # Graphics Context Handoff
//!
//! The graphics context is created by one designated owning thread, used
//! exclusively by the presentation thread for the pipeline's lifetime, and
//! destroyed by the owner. That is a one-shot loan:
//!
//! ```text
//! owner thread                     presentation thread
//! ────────────                     ───────────────────
//! create context
//! owner.lend(ctx) ───────────────> loan.receive() -> (ctx, return_slip)
//!        │                               make current, run present loop
//!        ▼                         return_slip.hand_back(ctx)
//! reclaim.reclaim() <──────────────────┘
//! destroy context
//! ```
//!
//! Every handle consumes itself, so lending twice, receiving twice, or
//! returning twice is a compile error - the protocol is not reentrant and
//! happens at most once per process lifetime of the pipeline.

use crossbeam_channel::{bounded, Receiver, Sender};
use thiserror::Error;

/// Handoff protocol failures. Each means the other thread went away
/// (panicked or dropped its handle) mid-protocol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandoffError {
    /// The owner dropped its handle before lending the context.
    #[error("context was never lent: owning side dropped")]
    NeverLent,

    /// The presentation side dropped without handing the context back.
    #[error("context was never returned: presentation side dropped")]
    NeverReturned,
}

/// Owner-side handle: lends the context out once.
#[derive(Debug)]
pub struct ContextOwner<T> {
    lend: Sender<T>,
    take_back: Receiver<T>,
}

/// Owner-side handle produced by [`ContextOwner::lend`]: reclaims the
/// context at shutdown.
#[derive(Debug)]
pub struct ContextReclaim<T> {
    take_back: Receiver<T>,
}

/// Presentation-side handle: receives the loaned context once.
#[derive(Debug)]
pub struct ContextLoan<T> {
    receive: Receiver<T>,
    give_back: Sender<T>,
}

/// Presentation-side handle produced by [`ContextLoan::receive`]: hands the
/// context back at shutdown.
#[derive(Debug)]
pub struct ContextReturn<T> {
    give_back: Sender<T>,
}

/// Creates the two ends of a one-shot context handoff.
#[must_use]
pub fn handoff<T: Send>() -> (ContextOwner<T>, ContextLoan<T>) {
    // Capacity 1 in both directions: each channel carries exactly one value
    // and neither sender may block, even if the peer has not arrived yet.
    let (lend, receive) = bounded(1);
    let (give_back, take_back) = bounded(1);
    (
        ContextOwner { lend, take_back },
        ContextLoan { receive, give_back },
    )
}

impl<T: Send> ContextOwner<T> {
    /// Publishes the context to the presentation thread. Returns the handle
    /// that later reclaims it.
    ///
    /// # Errors
    ///
    /// [`HandoffError::NeverReturned`] if the presentation side is already
    /// gone; the context is dropped on the owner's thread in that case.
    pub fn lend(self, context: T) -> Result<ContextReclaim<T>, HandoffError> {
        self.lend
            .send(context)
            .map_err(|_| HandoffError::NeverReturned)?;
        Ok(ContextReclaim {
            take_back: self.take_back,
        })
    }
}

impl<T: Send> ContextReclaim<T> {
    /// Blocks until the presentation thread hands the context back, then
    /// returns it for destruction on this thread.
    ///
    /// # Errors
    ///
    /// [`HandoffError::NeverReturned`] if the presentation side dropped
    /// without handing the context back (the context itself was dropped on
    /// that thread).
    pub fn reclaim(self) -> Result<T, HandoffError> {
        self.take_back
            .recv()
            .map_err(|_| HandoffError::NeverReturned)
    }
}

impl<T: Send> ContextLoan<T> {
    /// Blocks until the owner lends the context, then returns it together
    /// with the return slip for shutdown.
    ///
    /// # Errors
    ///
    /// [`HandoffError::NeverLent`] if the owner dropped before lending.
    pub fn receive(self) -> Result<(T, ContextReturn<T>), HandoffError> {
        let context = self.receive.recv().map_err(|_| HandoffError::NeverLent)?;
        Ok((
            context,
            ContextReturn {
                give_back: self.give_back,
            },
        ))
    }
}

impl<T: Send> ContextReturn<T> {
    /// Hands the context back to the owning thread.
    ///
    /// # Errors
    ///
    /// [`HandoffError::NeverLent`] if the owning side already dropped its
    /// reclaim handle; the context is dropped here in that case.
    pub fn hand_back(self, context: T) -> Result<(), HandoffError> {
        self.give_back
            .send(context)
            .map_err(|_| HandoffError::NeverLent)
    }
}
