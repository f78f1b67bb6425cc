//! # PHOSPHOR Present
//!
//! Everything the presentation thread runs that is not the pipeline itself:
//!
//! ```text
//! ┌──────────────┐  ContextLoan  ┌────────────────────────────────────┐
//! │ Owning thread│──────────────>│        Presentation thread         │
//! │ (GL context) │<──────────────│ loop {                             │
//! └──────────────┘  hand-back    │   drain_and_present(&mut backend)  │
//!                                │   backend.present() if Presented   │
//!                                │   stepper.step()  // pace to the   │
//!                                │ }                 // slower cadence│
//!                                └────────────────────────────────────┘
//! ```
//!
//! The pipeline never blocks; all real sleeping happens here, in the
//! [`pacing::Stepper`], which throttles how often the consumer drains. The
//! interval is the slower of the display's refresh cadence and the
//! simulation's tick cadence - presenting faster than new frames can exist
//! is wasted work.

pub mod clock;
pub mod context;
pub mod driver;
pub mod pacing;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use context::{
    handoff, ContextLoan, ContextOwner, ContextReclaim, ContextReturn, HandoffError,
};
pub use driver::{
    BackendError, DriverConfig, FrameRateGauge, PresentBackend, PresentDriver, PresentError,
    StopHandle,
};
pub use pacing::{StepOutcome, Stepper};
