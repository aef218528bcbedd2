//! Host clock implementations.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use contracts::HostClock;

/// Wall-clock host time in microseconds since the Unix epoch.
///
/// All runtime components (port, camera, orchestrator) must share one time
/// base, so this reads the system clock rather than a per-instance origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl HostClock for SystemClock {
    fn now_us(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0)
    }
}

/// Deterministic test clock: advances a fixed step on every read.
///
/// Each offset probe performs a bounded number of reads, so the simulated
/// round-trip latency is exact and repeatable. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct FakeClock {
    now: Arc<AtomicI64>,
    step_us: i64,
}

impl FakeClock {
    /// Create a clock starting at `start_us`, advancing `step_us` per read
    pub fn new(start_us: i64, step_us: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_us)),
            step_us,
        }
    }

    /// Move the clock forward without a read
    pub fn advance(&self, delta_us: i64) {
        self.now.fetch_add(delta_us, Ordering::SeqCst);
    }
}

impl HostClock for FakeClock {
    fn now_us(&self) -> i64 {
        self.now.fetch_add(self.step_us, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_clock_steps_per_read() {
        let clock = FakeClock::new(100, 10);
        assert_eq!(clock.now_us(), 100);
        assert_eq!(clock.now_us(), 110);
        clock.advance(1_000);
        assert_eq!(clock.now_us(), 1_120);
    }

    #[test]
    fn test_fake_clock_clones_share_state() {
        let a = FakeClock::new(0, 5);
        let b = a.clone();
        a.now_us();
        assert_eq!(b.now_us(), 5);
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_us();
        let b = clock.now_us();
        assert!(b >= a);
        assert!(a > 0);
    }
}
