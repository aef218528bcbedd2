//! Loop run statistics.

use std::time::Duration;

use observability::PllMetricsAggregator;

/// Statistics from one loop run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total frame events received from the camera
    pub events_received: u64,

    /// Trigger deadlines handed to the strobe task
    pub triggers_scheduled: u64,

    /// Frame events dropped because the channel was full
    pub backpressure_drops: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Lock metrics aggregator
    pub lock_metrics: PllMetricsAggregator,
}

impl PipelineStats {
    /// Frame event throughput in Hz
    pub fn event_rate_hz(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_received as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Framelock Statistics                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frame events: {}", self.events_received);
        println!("   ├─ Event rate: {:.2} Hz", self.event_rate_hz());
        println!("   ├─ Triggers scheduled: {}", self.triggers_scheduled);
        println!("   └─ Backpressure drops: {}", self.backpressure_drops);

        let summary = self.lock_metrics.summary();

        println!("\n📈 Lock Metrics");
        println!(
            "   ├─ Locked events: {} ({:.2}%)",
            summary.locked_events, summary.locked_ratio
        );
        println!("   ├─ State transitions: {}", summary.transitions);
        println!("   ├─ Dropouts: {}", summary.dropouts);
        println!("   ├─ Discontinuities: {}", summary.discontinuities);
        println!("   ├─ Phase error |us|: {}", summary.phase_error_us);
        println!("   └─ Period (us): {}", summary.period_us);

        if let Some(state) = summary.final_state {
            println!("\n🔒 Final state: {state:?}");
        }

        println!();
    }
}
