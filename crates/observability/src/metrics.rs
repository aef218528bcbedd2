//! Lock metrics collection.
//!
//! Collects and aggregates loop health metrics from `LockStatus` snapshots.

use contracts::{LockState, LockStatus, TriggerDeadline};
use metrics::{counter, gauge, histogram};

/// Record metrics from a `LockStatus` snapshot
///
/// Call once per processed frame event (or per status poll).
///
/// # Example
///
/// ```ignore
/// use observability::record_lock_status;
///
/// if let Some(status) = pll.status() {
///     record_lock_status(&status);
/// }
/// ```
pub fn record_lock_status(status: &LockStatus) {
    gauge!("framelock_state_code").set(state_code(status.state));
    gauge!("framelock_period_us").set(status.period_estimate_us);
    gauge!("framelock_predicted_next_us").set(status.predicted_next_us as f64);
    gauge!("framelock_offset_error_bound_us").set(status.offset.error_bound_us as f64);

    histogram!("framelock_phase_error_abs_us").record(status.last_phase_error_us.abs() as f64);

    gauge!("framelock_events_seen").set(status.events_seen as f64);
    gauge!("framelock_dropouts").set(status.dropouts as f64);
    gauge!("framelock_discontinuities").set(status.discontinuities as f64);
}

/// Record a frame event arrival from a given source
pub fn record_frame_event(source_id: &str, state: LockState) {
    counter!(
        "framelock_frame_events_total",
        "source_id" => source_id.to_string(),
        "state" => format!("{state:?}")
    )
    .increment(1);
}

/// Record a scheduled trigger deadline
pub fn record_trigger_scheduled(deadline: &TriggerDeadline) {
    counter!("framelock_triggers_scheduled_total").increment(1);
    gauge!("framelock_trigger_lead_time_us").set(deadline.lead_time_us as f64);
}

fn state_code(state: LockState) -> f64 {
    match state {
        LockState::Unlocked => 0.0,
        LockState::Converging => 1.0,
        LockState::Locked => 2.0,
        LockState::Faulted => 3.0,
    }
}

/// Lock metrics aggregator
///
/// Aggregates metrics in memory for end-of-run summaries.
#[derive(Debug, Clone, Default)]
pub struct PllMetricsAggregator {
    /// Total frame events observed
    pub total_events: u64,

    /// Events processed while LOCKED
    pub locked_events: u64,

    /// Lock state transitions observed
    pub transitions: u64,

    /// Dropouts tolerated (from the latest snapshot)
    pub dropouts: u64,

    /// Gross discontinuities (from the latest snapshot)
    pub discontinuities: u64,

    /// Absolute phase error statistics (microseconds)
    pub phase_error_stats: RunningStats,

    /// Period estimate statistics (microseconds)
    pub period_stats: RunningStats,

    /// Last state seen (for transition counting)
    last_state: Option<LockState>,
}

impl PllMetricsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update aggregate statistics from a snapshot
    pub fn update(&mut self, status: &LockStatus) {
        self.total_events += 1;
        if status.state.is_locked() {
            self.locked_events += 1;
        }

        if let Some(last) = self.last_state {
            if last != status.state {
                self.transitions += 1;
            }
        }
        self.last_state = Some(status.state);

        self.dropouts = status.dropouts;
        self.discontinuities = status.discontinuities;

        self.phase_error_stats
            .push(status.last_phase_error_us.abs() as f64);
        self.period_stats.push(status.period_estimate_us);
    }

    /// Produce a summary report
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_events: self.total_events,
            locked_events: self.locked_events,
            transitions: self.transitions,
            dropouts: self.dropouts,
            discontinuities: self.discontinuities,
            locked_ratio: if self.total_events > 0 {
                self.locked_events as f64 / self.total_events as f64 * 100.0
            } else {
                0.0
            },
            phase_error_us: StatsSummary::from(&self.phase_error_stats),
            period_us: StatsSummary::from(&self.period_stats),
            final_state: self.last_state,
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_events: u64,
    pub locked_events: u64,
    pub transitions: u64,
    pub dropouts: u64,
    pub discontinuities: u64,
    pub locked_ratio: f64,
    pub phase_error_us: StatsSummary,
    pub period_us: StatsSummary,
    pub final_state: Option<LockState>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Lock Metrics Summary ===")?;
        writeln!(f, "Frame events: {}", self.total_events)?;
        writeln!(
            f,
            "Locked events: {} ({:.2}%)",
            self.locked_events, self.locked_ratio
        )?;
        writeln!(f, "State transitions: {}", self.transitions)?;
        writeln!(f, "Dropouts: {}", self.dropouts)?;
        writeln!(f, "Discontinuities: {}", self.discontinuities)?;
        writeln!(f, "Phase error |us|: {}", self.phase_error_us)?;
        writeln!(f, "Period (us): {}", self.period_us)?;
        if let Some(state) = self.final_state {
            writeln!(f, "Final state: {state:?}")?;
        }
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::OffsetEstimate;

    fn status(state: LockState, phase_error_us: i64) -> LockStatus {
        LockStatus {
            state,
            period_estimate_us: 33_333.0,
            predicted_next_us: 1_033_333,
            last_phase_error_us: phase_error_us,
            offset: OffsetEstimate {
                offset_us: 400_000,
                error_bound_us: 25,
                sample_count: 4,
            },
            events_seen: 1,
            dropouts: 0,
            discontinuities: 0,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_transitions_and_lock_ratio() {
        let mut aggregator = PllMetricsAggregator::new();

        aggregator.update(&status(LockState::Converging, 2_000));
        aggregator.update(&status(LockState::Converging, 400));
        aggregator.update(&status(LockState::Locked, 50));
        aggregator.update(&status(LockState::Locked, 40));

        let summary = aggregator.summary();
        assert_eq!(summary.total_events, 4);
        assert_eq!(summary.locked_events, 2);
        assert_eq!(summary.transitions, 1);
        assert!((summary.locked_ratio - 50.0).abs() < 1e-10);
        assert_eq!(summary.final_state, Some(LockState::Locked));
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = PllMetricsAggregator::new();
        aggregator.update(&status(LockState::Locked, 50));
        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Frame events: 1"));
        assert!(output.contains("Locked"));
    }
}
