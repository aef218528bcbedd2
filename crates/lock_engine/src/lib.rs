//! # Lock Engine
//!
//! Software phase-locked loop for camera frame timing.
//!
//! Responsibilities:
//! - Clock-domain offset estimation (host vs. capture device)
//! - Frame-event lock state machine and period model
//! - Trigger deadline derivation for the external actuator
//!
//! ## Usage Example
//!
//! ```ignore
//! use lock_engine::FramePll;
//! use contracts::{FrameEvent, PllSettings};
//!
//! let pll = FramePll::new(PllSettings::default());
//! pll.bind_port(port);
//! pll.start(&clock)?;
//!
//! // From the capture callback thread:
//! let state = pll.on_frame_event(event)?;
//!
//! // From the actuator side:
//! if let Some(deadline) = pll.next_trigger_deadline() {
//!     // schedule the strobe
//! }
//! ```

mod controller;
mod estimator;
mod pll;
mod scheduler;

pub use controller::LockController;
pub use estimator::OffsetEstimator;
pub use pll::FramePll;
pub use scheduler::next_trigger_deadline;

// Re-export contracts types
pub use contracts::{
    LockConfig, LockState, LockStatus, OffsetEstimate, PeriodModel, PllSettings, ProbeConfig,
    TriggerConfig, TriggerDeadline,
};
