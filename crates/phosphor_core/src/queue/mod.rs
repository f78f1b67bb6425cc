//! # Queue Primitives
//!
//! Two FIFO flavors with deliberately different contracts:
//!
//! - [`local::LocalQueue`]: single-thread only, recycles its nodes through an
//!   internal cache. One is created per frame to hold that frame's commands,
//!   so the cache amortizes allocation across the high-frequency
//!   create/fill/drain cycle.
//! - [`spsc`]: safe for exactly one producer thread and one consumer thread
//!   concurrently, without locks. Hands sealed frames across the thread
//!   boundary. Only use it where concurrency is actually required; it costs
//!   an allocation per element and atomic ordering on every operation.

pub mod local;
pub mod spsc;
