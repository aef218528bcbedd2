//! Mock timing ports.

use std::sync::Arc;

use contracts::{HostClock, PllError, TimingPort};

use crate::SystemClock;

/// Simulated device timing port.
///
/// Reports a device clock that runs at host rate but in its own domain:
/// `device = host + device_minus_host_us`. Reading the backing clock costs
/// one tick, which stands in for the query's round-trip latency.
pub struct MockTimingPort {
    clock: Arc<dyn HostClock>,
    device_minus_host_us: i64,
}

impl MockTimingPort {
    /// Port backed by the system clock (runtime / demo use)
    pub fn new(device_minus_host_us: i64) -> Self {
        Self::with_clock(Arc::new(SystemClock), device_minus_host_us)
    }

    /// Port backed by an explicit clock (deterministic tests)
    pub fn with_clock(clock: Arc<dyn HostClock>, device_minus_host_us: i64) -> Self {
        Self {
            clock,
            device_minus_host_us,
        }
    }

    /// The simulated clock-domain skew
    pub fn device_minus_host_us(&self) -> i64 {
        self.device_minus_host_us
    }

    /// Translate a host timestamp into the simulated device domain
    pub fn to_device_us(&self, host_us: i64) -> i64 {
        host_us + self.device_minus_host_us
    }
}

impl TimingPort for MockTimingPort {
    fn device_clock_us(&self) -> Result<i64, PllError> {
        Ok(self.clock.now_us() + self.device_minus_host_us)
    }
}

/// Port that never answers.
///
/// A real unresponsive port would hang until the driver's own timeout fires;
/// the mock surfaces that directly as an error.
pub struct UnresponsivePort;

impl TimingPort for UnresponsivePort {
    fn device_clock_us(&self) -> Result<i64, PllError> {
        Err(PllError::port("timing port did not respond"))
    }
}
