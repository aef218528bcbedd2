//! ClockSample / OffsetEstimate - Offset Estimator data model
//!
//! One round-trip probe and the running estimate it feeds.

use serde::{Deserialize, Serialize};

/// Single offset-measurement round trip
///
/// The device clock was read somewhere inside the host bracket
/// `[host_before_us, host_after_us]`; the estimator treats the reading as
/// referring to the bracket midpoint. Ephemeral, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSample {
    /// Host time immediately before querying the device clock
    pub host_before_us: i64,

    /// Host time immediately after the query returned
    pub host_after_us: i64,

    /// Device clock value reported by the timing port
    pub device_us: i64,
}

impl ClockSample {
    /// Width of the host bracket (round-trip latency)
    pub fn bracket_us(&self) -> i64 {
        self.host_after_us - self.host_before_us
    }

    /// Host time the device reading is attributed to
    pub fn midpoint_us(&self) -> i64 {
        self.host_before_us + self.bracket_us() / 2
    }

    /// Offset implied by this sample (host - device)
    pub fn offset_us(&self) -> i64 {
        self.midpoint_us() - self.device_us
    }
}

/// Clock-domain offset estimate
///
/// `offset_us` translates device timestamps into host space:
/// `host ≈ device + offset_us`. Owned exclusively by the Offset Estimator;
/// read-only everywhere else.
///
/// Invariant: within a single measurement campaign `error_bound_us` is
/// monotonically non-increasing (more samples cannot report a worse bound).
/// A fresh campaign resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetEstimate {
    /// Host minus device at the same instant (microseconds)
    pub offset_us: i64,

    /// One-way error bound: half the tightest round-trip bracket observed
    pub error_bound_us: u64,

    /// Number of probes that contributed to this campaign
    pub sample_count: u32,
}
