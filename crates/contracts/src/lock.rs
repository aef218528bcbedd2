//! LockState / PeriodModel / LockStatus - Lock Controller data model

use serde::{Deserialize, Serialize};

use crate::OffsetEstimate;

/// Loop health classification
///
/// `Faulted` is terminal: once entered, only an explicit stop/start restores
/// the loop. `Locked` requires `lock_confirm_count` consecutive in-tolerance
/// phase-error observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// No events accepted since start
    Unlocked,
    /// Tracking events, model not yet trustworthy
    Converging,
    /// Model matches observed events within tolerance; safe for triggering
    Locked,
    /// Runtime divergence detected; restart required
    Faulted,
}

impl LockState {
    /// Whether the timing model may be used to schedule actuation
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked)
    }
}

/// Linear timing model "next event ≈ phase_reference + k · period_estimate"
///
/// Mutated by the Lock Controller on every accepted frame event. Created on
/// `start()`, discarded on `stop()`; no persistence across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodModel {
    /// Smoothed inter-frame period (microseconds)
    pub period_estimate_us: f64,

    /// Host-clock anchor: the most recent accepted event
    pub phase_reference_us: i64,

    /// Host time at which the model was last updated
    pub last_update_host_time_us: i64,
}

impl PeriodModel {
    /// Predicted host time of the next frame event
    pub fn predicted_next_us(&self) -> i64 {
        self.phase_reference_us + self.period_estimate_us.round() as i64
    }
}

/// Scheduler output: when the actuator should fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDeadline {
    /// Host-clock deadline for the actuation
    pub deadline_host_us: i64,

    /// Predicted frame event the deadline is derived from
    pub predicted_frame_us: i64,

    /// Lead-time bias that was applied (signed)
    pub lead_time_us: i64,
}

/// Diagnostic snapshot of the loop (for metrics and CLI reporting)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockStatus {
    /// Current loop state
    pub state: LockState,

    /// Smoothed period estimate (microseconds)
    pub period_estimate_us: f64,

    /// Predicted host time of the next frame event
    pub predicted_next_us: i64,

    /// Phase error of the most recent accepted event
    pub last_phase_error_us: i64,

    /// Offset estimate used to translate device timestamps
    pub offset: OffsetEstimate,

    /// Frame events observed since start
    pub events_seen: u64,

    /// Single-cycle dropouts tolerated so far
    pub dropouts: u64,

    /// Gross discontinuities observed so far
    pub discontinuities: u64,
}
