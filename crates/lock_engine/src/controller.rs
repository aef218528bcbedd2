//! Lock state machine and period model.

use contracts::{LockConfig, LockState, LockStatus, OffsetEstimate, PeriodModel};
use tracing::{debug, instrument, warn};

/// Lock Controller
///
/// Consumes per-frame timestamp events and maintains the linear timing model
/// "next event ≈ phase_reference + k · period_estimate". Classifies loop
/// health as unlocked / converging / locked / faulted.
///
/// Pure arithmetic and state transitions; never blocks, safe to drive from
/// the capture pipeline's callback thread.
#[derive(Debug, Clone)]
pub struct LockController {
    config: LockConfig,
    offset: OffsetEstimate,
    state: LockState,
    model: PeriodModel,
    /// First event since start() seeds the phase reference
    primed: bool,
    in_tolerance_streak: u32,
    out_of_tolerance_streak: u32,
    dropout_streak: u32,
    discontinuity_streak: u32,
    last_phase_error_us: i64,
    events_seen: u64,
    dropouts: u64,
    discontinuities: u64,
}

impl LockController {
    /// Create a fresh controller in UNLOCKED state.
    ///
    /// `nominal_period_us` seeds the period estimate so phase errors are
    /// classifiable from the second event onward. `start_host_us` anchors the
    /// watchdog until the first event arrives, so a camera that never
    /// delivers a frame still faults after `watchdog_cycles` periods.
    pub fn new(
        config: LockConfig,
        nominal_period_us: f64,
        offset: OffsetEstimate,
        start_host_us: i64,
    ) -> Self {
        Self {
            config,
            offset,
            state: LockState::Unlocked,
            model: PeriodModel {
                period_estimate_us: nominal_period_us,
                phase_reference_us: 0,
                last_update_host_time_us: start_host_us,
            },
            primed: false,
            in_tolerance_streak: 0,
            out_of_tolerance_streak: 0,
            dropout_streak: 0,
            discontinuity_streak: 0,
            last_phase_error_us: 0,
            events_seen: 0,
            dropouts: 0,
            discontinuities: 0,
        }
    }

    /// Process one frame-arrival event.
    ///
    /// Translates the device timestamp into host space with the current
    /// offset estimate, measures the phase error against the model, updates
    /// the period estimate, and returns the resulting state.
    #[instrument(
        level = "trace",
        name = "lock_on_frame_event",
        skip(self),
        fields(state = ?self.state)
    )]
    pub fn on_frame_event(&mut self, device_ts_us: i64, host_ts_us: i64) -> LockState {
        // FAULTED is terminal until an explicit restart
        if self.state == LockState::Faulted {
            return self.state;
        }

        self.events_seen += 1;
        let observed_us = device_ts_us + self.offset.offset_us;

        if !self.primed {
            self.primed = true;
            self.model.phase_reference_us = observed_us;
            self.model.last_update_host_time_us = host_ts_us;
            self.transition(LockState::Converging);
            return self.state;
        }

        let period = self.model.period_estimate_us;
        let interval = (observed_us - self.model.phase_reference_us) as f64;
        let cycles = (interval / period).round() as i64;

        if cycles <= 0 {
            return self.on_discontinuity("non-advancing interval");
        }

        let per_cycle = interval / cycles as f64;
        let deviation = ((per_cycle - period) / period).abs();
        if deviation > self.config.max_period_deviation {
            return self.on_discontinuity("interval outside plausible grid");
        }
        self.discontinuity_streak = 0;

        let predicted_us =
            self.model.phase_reference_us + (cycles as f64 * period).round() as i64;
        let phase_error = observed_us - predicted_us;
        self.last_phase_error_us = phase_error;
        metrics::histogram!("framelock_phase_error_us").record(phase_error.abs() as f64);

        // Missed frames: extrapolate through the gap, penalize only when the
        // dropout repeats.
        if cycles > 1 {
            self.dropouts += cycles as u64 - 1;
            self.dropout_streak += 1;
            metrics::counter!("framelock_dropouts_total").increment(cycles as u64 - 1);
            if cycles > 2 || self.dropout_streak >= 2 {
                self.in_tolerance_streak = 0;
                self.out_of_tolerance_streak = 0;
                self.transition(LockState::Converging);
            }
        } else {
            self.dropout_streak = 0;
        }

        // Period update: exponential smoothing of the per-cycle interval
        self.model.period_estimate_us += self.config.period_smoothing * (per_cycle - period);
        metrics::gauge!("framelock_period_estimate_us").set(self.model.period_estimate_us);
        if self.model.period_estimate_us < self.config.min_period_us
            || self.model.period_estimate_us > self.config.max_period_us
        {
            warn!(
                period_us = self.model.period_estimate_us,
                "period estimate left plausible range"
            );
            self.transition(LockState::Faulted);
            return self.state;
        }

        // Re-anchor the phase reference at the observed event
        self.model.phase_reference_us = observed_us;
        self.model.last_update_host_time_us = host_ts_us;

        // A single-cycle interval is evidence for or against the lock;
        // extrapolated (dropout) events are neutral.
        if cycles == 1 {
            self.classify(phase_error);
        }

        self.state
    }

    /// Watchdog poll: fault the loop when events stopped arriving.
    ///
    /// Intended to be called periodically from the control plane, not from
    /// the event path.
    pub fn check_deadline(&mut self, now_host_us: i64) -> LockState {
        if self.state == LockState::Faulted {
            return self.state;
        }

        let silence = (now_host_us - self.model.last_update_host_time_us) as f64;
        let limit = self.config.watchdog_cycles as f64 * self.model.period_estimate_us;
        if silence > limit {
            warn!(
                silence_us = silence,
                limit_us = limit,
                "no frame events within watchdog deadline"
            );
            self.transition(LockState::Faulted);
        }
        self.state
    }

    /// Replace the offset estimate (periodic drift re-measurement).
    pub fn set_offset(&mut self, offset: OffsetEstimate) {
        self.offset = offset;
    }

    /// Current loop state
    pub fn state(&self) -> LockState {
        self.state
    }

    /// Current timing model
    pub fn model(&self) -> &PeriodModel {
        &self.model
    }

    /// Predicted host time of the next frame event
    pub fn predicted_next_us(&self) -> i64 {
        self.model.predicted_next_us()
    }

    /// Diagnostic snapshot
    pub fn status(&self) -> LockStatus {
        LockStatus {
            state: self.state,
            period_estimate_us: self.model.period_estimate_us,
            predicted_next_us: self.model.predicted_next_us(),
            last_phase_error_us: self.last_phase_error_us,
            offset: self.offset,
            events_seen: self.events_seen,
            dropouts: self.dropouts,
            discontinuities: self.discontinuities,
        }
    }

    fn classify(&mut self, phase_error: i64) {
        if phase_error.abs() <= self.config.lock_tolerance_us {
            self.out_of_tolerance_streak = 0;
            self.in_tolerance_streak += 1;
            if self.state != LockState::Locked
                && self.in_tolerance_streak >= self.config.lock_confirm_count
            {
                self.transition(LockState::Locked);
            }
        } else {
            self.in_tolerance_streak = 0;
            if self.state == LockState::Locked {
                self.out_of_tolerance_streak += 1;
                if self.out_of_tolerance_streak >= self.config.unlock_hysteresis {
                    self.out_of_tolerance_streak = 0;
                    self.transition(LockState::Converging);
                }
            }
        }
    }

    /// Event does not fit the timing grid at all. The phase reference is left
    /// untouched so a single bogus timestamp can be recovered from; repeated
    /// misses escalate to FAULTED.
    fn on_discontinuity(&mut self, reason: &'static str) -> LockState {
        self.discontinuities += 1;
        self.discontinuity_streak += 1;
        self.dropout_streak = 0;
        self.in_tolerance_streak = 0;
        self.out_of_tolerance_streak = 0;
        metrics::counter!("framelock_discontinuities_total").increment(1);

        if self.discontinuity_streak >= self.config.fault_discontinuity_limit {
            warn!(reason, streak = self.discontinuity_streak, "loop faulted");
            self.transition(LockState::Faulted);
        } else {
            debug!(reason, streak = self.discontinuity_streak, "gross discontinuity");
            self.transition(LockState::Converging);
        }
        self.state
    }

    fn transition(&mut self, next: LockState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "lock state transition");
            metrics::counter!(
                "framelock_lock_transitions_total",
                "to" => format!("{next:?}")
            )
            .increment(1);
            self.state = next;
        }
    }
}
