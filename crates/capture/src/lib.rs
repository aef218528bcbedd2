//! # Capture
//!
//! Capture-pipeline collaborators for the frame PLL.
//!
//! Implements the `contracts` traits (`FrameSource`, `TimingPort`,
//! `HostClock`) without real camera hardware:
//! - `MockCamera` generates frame events at a configurable rate in a
//!   background thread
//! - `MockTimingPort` / `UnresponsivePort` simulate the device timing port
//! - `SystemClock` / `FakeClock` provide host time bases for runtime and tests
//!
//! A real capture backend would implement the same traits against the vendor
//! SDK; everything above the traits is unchanged.

mod clock;
mod mock_camera;
mod mock_port;

pub use clock::{FakeClock, SystemClock};
pub use mock_camera::{MockCamera, MockCameraConfig};
pub use mock_port::{MockTimingPort, UnresponsivePort};
