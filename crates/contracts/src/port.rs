//! TimingPort / HostClock - clock access traits
//!
//! `TimingPort` is the one piece of device I/O the loop performs, and only
//! during offset measurement. `HostClock` abstracts the host time base so the
//! estimator and watchdog are testable without real time.

use crate::PllError;

/// Handle to the capture device's timing port
///
/// Queries may fail or hang on real hardware; implementations are expected to
/// enforce their own bounded timeout and surface it as an error rather than
/// blocking forever.
pub trait TimingPort: Send + Sync {
    /// Read the device's current clock value (microseconds, device domain)
    fn device_clock_us(&self) -> Result<i64, PllError>;
}

/// Host time base (microseconds)
pub trait HostClock: Send + Sync {
    /// Current host time in microseconds
    fn now_us(&self) -> i64;
}
