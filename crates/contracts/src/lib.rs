//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Host timestamps are microseconds (`i64`) on the host monotonic/steady clock
//! - Device timestamps are microseconds on the capture device's own clock domain
//! - The two domains share no epoch; `OffsetEstimate` bridges them

mod clock;
mod error;
mod frame;
mod lock;
mod port;
mod settings;

pub use clock::*;
pub use error::*;
pub use frame::{FrameEvent, FrameEventCallback, FrameSource};
pub use lock::*;
pub use port::{HostClock, TimingPort};
pub use settings::*;
