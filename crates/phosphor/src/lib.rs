//! # PHOSPHOR
//!
//! Application layer over the frame pipeline: startup configuration, a
//! headless recording backend, and the demo simulation that exercises the
//! simulation-thread/presentation-thread handoff end to end.
//!
//! The interesting machinery lives below this crate:
//! [`phosphor_core`] is the lock-free pipeline, [`phosphor_present`] is the
//! paced presentation loop. This crate wires them together the way a real
//! game would, with a backend that records instead of talking to a GPU.

pub mod backend;
pub mod config;
pub mod sim;

pub use backend::{BackendStats, HeadlessBackend};
pub use config::{ConfigError, PhosphorConfig};
pub use sim::{build_tick_frame, RenderLog};
