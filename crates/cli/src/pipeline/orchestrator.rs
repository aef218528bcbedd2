//! Loop orchestrator - wires the mock camera into the lock loop.
//!
//! Owns the component lifecycle: offset campaign at start, frame events into
//! the controller, trigger deadlines out to the strobe task, watchdog polling,
//! and a clean stop on completion or fault.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use capture::{MockCamera, MockCameraConfig, MockTimingPort, SystemClock};
use contracts::{FrameEvent, FrameSource, HostClock, LockState, PllSettings, TriggerDeadline};
use lock_engine::FramePll;
use observability::{record_frame_event, record_lock_status, record_trigger_scheduled};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::PipelineStats;

/// Loop pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Lock loop settings
    pub settings: PllSettings,

    /// Mock camera configuration
    pub camera: MockCameraConfig,

    /// Maximum number of frame events to process (None = unlimited)
    pub max_events: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Frame event channel buffer size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main loop orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the lock loop to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let clock = SystemClock;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Bind the timing port and run the offset campaign
        let pll = Arc::new(FramePll::new(self.config.settings.clone()));
        pll.bind_port(Arc::new(MockTimingPort::new(
            self.config.camera.device_minus_host_us,
        )));

        let estimate = pll
            .start(&clock)
            .context("Offset campaign failed, loop not started")?;

        info!(
            offset_us = estimate.offset_us,
            error_bound_us = estimate.error_bound_us,
            samples = estimate.sample_count,
            "Clock offset measured"
        );

        // Start the mock camera, frame events flow through the channel
        let (tx, mut rx) = mpsc::channel::<FrameEvent>(self.config.buffer_size);
        let backpressure_drops = Arc::new(AtomicU64::new(0));

        let camera = MockCamera::new("mock-cam0", self.config.camera.clone());
        let drops = backpressure_drops.clone();
        camera.listen(Arc::new(move |event| {
            if tx.try_send(event).is_err() {
                drops.fetch_add(1, Ordering::Relaxed);
            }
        }));

        info!(
            camera_id = camera.source_id(),
            frequency_hz = self.config.camera.frequency_hz,
            "Mock camera listening"
        );

        // Watchdog polls once per nominal period
        let mut watchdog =
            tokio::time::interval(Duration::from_micros(self.config.settings.nominal_period_us as u64));
        watchdog.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let max_events = self.config.max_events;
        let source_id = camera.source_id().to_string();
        let pll_events = pll.clone();

        // Absolute deadline so a timed-out run still reports the stats it
        // accumulated.
        let run_deadline = self
            .config
            .timeout
            .map(|t| tokio::time::Instant::now() + t);

        let event_loop = async move {
            let mut stats = PipelineStats::default();
            let mut last_deadline: Option<i64> = None;

            loop {
                tokio::select! {
                    maybe_event = rx.recv() => {
                        let Some(event) = maybe_event else { break };
                        stats.events_received += 1;

                        let state = match pll_events.on_frame_event(event) {
                            Ok(state) => state,
                            Err(e) => {
                                warn!(error = %e, "Frame event rejected");
                                continue;
                            }
                        };

                        record_frame_event(&source_id, state);
                        if let Some(status) = pll_events.status() {
                            record_lock_status(&status);
                            stats.lock_metrics.update(&status);
                        }

                        if state == LockState::Faulted {
                            error!("Loop faulted, stopping");
                            break;
                        }

                        if state.is_locked() {
                            if let Some(deadline) = pll_events.next_trigger_deadline() {
                                if last_deadline != Some(deadline.deadline_host_us) {
                                    last_deadline = Some(deadline.deadline_host_us);
                                    stats.triggers_scheduled += 1;
                                    record_trigger_scheduled(&deadline);
                                    spawn_strobe_task(deadline);
                                }
                            }
                        }

                        if let Some(max) = max_events {
                            if stats.events_received >= max {
                                info!(events = stats.events_received, "Reached max events limit");
                                break;
                            }
                        }
                    }
                    _ = watchdog.tick() => {
                        match pll_events.check_deadline(SystemClock.now_us()) {
                            Ok(LockState::Faulted) => {
                                error!("Watchdog expired, loop faulted");
                                break;
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "Watchdog poll failed");
                                break;
                            }
                        }
                    }
                    _ = sleep_until_deadline(run_deadline) => {
                        warn!("Run timed out, stopping");
                        break;
                    }
                }
            }

            stats
        };

        let stats = event_loop.await;

        // Shutdown
        info!("Shutting down loop...");
        camera.stop();
        pll.stop();

        let mut final_stats = stats;
        final_stats.backpressure_drops = backpressure_drops.load(Ordering::Relaxed);
        final_stats.duration = start_time.elapsed();

        info!(
            duration_secs = final_stats.duration.as_secs_f64(),
            event_rate_hz = format!("{:.2}", final_stats.event_rate_hz()),
            "Loop shutdown complete"
        );

        Ok(final_stats)
    }
}

/// Resolve at the run deadline; pend forever when no timeout is configured.
async fn sleep_until_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Sleep until the deadline on the host clock, then fire the strobe.
///
/// The actuation itself is a log line; real hardware would hang off this
/// point. A deadline already in the past still fires immediately so the
/// late count is visible in the logs.
fn spawn_strobe_task(deadline: TriggerDeadline) {
    tokio::spawn(async move {
        let now_us = SystemClock.now_us();
        let delta_us = deadline.deadline_host_us - now_us;
        if delta_us > 0 {
            tokio::time::sleep(Duration::from_micros(delta_us as u64)).await;
        }

        let fired_at_us = SystemClock.now_us();
        info!(
            deadline_host_us = deadline.deadline_host_us,
            predicted_frame_us = deadline.predicted_frame_us,
            late_us = fired_at_us - deadline.deadline_host_us,
            "Strobe fired"
        );
    });
}
