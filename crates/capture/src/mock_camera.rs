//! Mock camera implementation
//!
//! Implements the `FrameSource` trait, generating frame-arrival events at a
//! configurable rate in a background thread. Used for testing and development
//! without camera hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use contracts::{FrameEvent, FrameEventCallback, FrameSource, HostClock};
use tracing::{debug, trace};

use crate::SystemClock;

/// Mock camera configuration
#[derive(Debug, Clone)]
pub struct MockCameraConfig {
    /// Frame rate (Hz)
    pub frequency_hz: f64,
    /// Simulated clock-domain skew of the device timestamps
    pub device_minus_host_us: i64,
    /// Alternating timing jitter applied to each frame (±, microseconds)
    pub jitter_us: i64,
    /// Drop every n-th frame (simulated dropout), `None` = no drops
    pub drop_every: Option<u64>,
}

impl Default for MockCameraConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 30.0,
            device_minus_host_us: 0,
            jitter_us: 0,
            drop_every: None,
        }
    }
}

/// Mock camera
///
/// Generates `FrameEvent`s at the configured frequency in a background
/// thread. Events are delivered through the callback in frame order, matching
/// the real capture pipeline's behavior; a configured drop pattern skips the
/// callback but keeps the cadence.
pub struct MockCamera {
    camera_id: String,
    config: MockCameraConfig,
    listening: Arc<AtomicBool>,
}

impl MockCamera {
    /// Create a new mock camera
    pub fn new(camera_id: impl Into<String>, config: MockCameraConfig) -> Self {
        Self {
            camera_id: camera_id.into(),
            config,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a mock camera with default configuration
    pub fn with_defaults(camera_id: impl Into<String>) -> Self {
        Self::new(camera_id, MockCameraConfig::default())
    }
}

impl FrameSource for MockCamera {
    fn source_id(&self) -> &str {
        &self.camera_id
    }

    fn listen(&self, callback: FrameEventCallback) {
        // Idempotent: if already listening, don't start again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let camera_id = self.camera_id.clone();
        let config = self.config.clone();
        let listening = self.listening.clone();
        let period_us = (1_000_000.0 / config.frequency_hz.max(0.001)) as i64;

        thread::spawn(move || {
            let clock = SystemClock;
            let mut frame_id: u64 = 0;

            debug!(
                camera_id = %camera_id,
                frequency_hz = config.frequency_hz,
                period_us,
                "mock camera started"
            );

            while listening.load(Ordering::Relaxed) {
                frame_id += 1;

                // Alternate the jitter sign so it averages out
                let jitter = if frame_id % 2 == 0 {
                    config.jitter_us
                } else {
                    -config.jitter_us
                };
                let sleep_us = (period_us + jitter).max(0) as u64;
                thread::sleep(Duration::from_micros(sleep_us));

                if !listening.load(Ordering::Relaxed) {
                    break;
                }

                if let Some(n) = config.drop_every {
                    if n > 0 && frame_id % n == 0 {
                        trace!(camera_id = %camera_id, frame_id, "mock camera dropped frame");
                        continue;
                    }
                }

                let host_us = clock.now_us();
                let event = FrameEvent {
                    device_timestamp_us: host_us + config.device_minus_host_us,
                    host_timestamp_us: host_us,
                    frame_id: Some(frame_id),
                };
                trace!(camera_id = %camera_id, frame_id, host_us, "mock camera frame");
                callback(event);
            }

            debug!(camera_id = %camera_id, frames = frame_id, "mock camera stopped");
        });
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}
