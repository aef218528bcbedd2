//! Clock-domain offset estimation.
//!
//! Round-trip probing of the device timing port: the device clock is read
//! inside a host-time bracket, the reading is attributed to the bracket
//! midpoint, and the one-way error is bounded by half the round-trip width.

use contracts::{ClockSample, HostClock, OffsetEstimate, PllError, ProbeConfig, TimingPort};
use tracing::{debug, trace};

/// Offset Estimator
///
/// Runs one measurement campaign per `measure` call. The campaign keeps the
/// `best_k` tightest-bracket probes seen so far and averages their offsets;
/// the reported error bound is half the tightest bracket. Iterates until the
/// target bound is met or the probe / wall-clock budget is exhausted, and
/// returns the best estimate achieved either way. Callers must inspect
/// `error_bound_us` rather than assume the target was reached.
#[derive(Debug, Clone)]
pub struct OffsetEstimator {
    config: ProbeConfig,
}

impl OffsetEstimator {
    /// Create a new estimator
    pub fn new(config: ProbeConfig) -> Self {
        let config = ProbeConfig {
            max_probes: config.max_probes.max(1),
            best_k: config.best_k.max(1),
            ..config
        };
        Self { config }
    }

    /// Run one measurement campaign.
    ///
    /// # Errors
    ///
    /// `ProbeTimeout` if no probe completed within the budget (unresponsive
    /// port). A met probe budget with an unmet error target is not an error.
    pub fn measure(
        &self,
        port: &dyn TimingPort,
        clock: &dyn HostClock,
    ) -> Result<OffsetEstimate, PllError> {
        let started_us = clock.now_us();
        let budget_us = self.config.campaign_timeout_ms as i64 * 1000;

        // Tightest brackets first, truncated to best_k
        let mut best: Vec<ClockSample> = Vec::with_capacity(self.config.best_k + 1);
        let mut probes: u32 = 0;
        let mut accepted: u32 = 0;

        while probes < self.config.max_probes {
            probes += 1;

            let host_before_us = clock.now_us();
            let device = port.device_clock_us();
            let host_after_us = clock.now_us();

            match device {
                Ok(device_us) => {
                    let sample = ClockSample {
                        host_before_us,
                        host_after_us,
                        device_us,
                    };
                    // Guard against a non-monotonic host read
                    if sample.bracket_us() >= 0 {
                        accepted += 1;
                        let pos = best
                            .binary_search_by_key(&sample.bracket_us(), |s| s.bracket_us())
                            .unwrap_or_else(|p| p);
                        best.insert(pos, sample);
                        best.truncate(self.config.best_k);

                        trace!(
                            probe = probes,
                            bracket_us = sample.bracket_us(),
                            offset_us = sample.offset_us(),
                            "offset probe"
                        );
                    }
                }
                Err(err) => {
                    trace!(probe = probes, error = %err, "offset probe failed");
                }
            }

            if let Some(first) = best.first() {
                let bound = (first.bracket_us() / 2) as u64;
                if bound <= self.config.target_error_us {
                    break;
                }
            }

            if clock.now_us() - started_us > budget_us {
                break;
            }
        }

        let elapsed_ms = ((clock.now_us() - started_us).max(0) / 1000) as u64;

        if best.is_empty() {
            return Err(PllError::ProbeTimeout { probes, elapsed_ms });
        }

        let sum: i128 = best.iter().map(|s| s.offset_us() as i128).sum();
        let offset_us = (sum / best.len() as i128) as i64;
        let error_bound_us = (best[0].bracket_us() / 2) as u64;

        let estimate = OffsetEstimate {
            offset_us,
            error_bound_us,
            sample_count: accepted,
        };

        debug!(
            offset_us,
            error_bound_us,
            samples = accepted,
            probes,
            elapsed_ms,
            "offset campaign complete"
        );
        metrics::histogram!("framelock_offset_error_bound_us").record(error_bound_us as f64);
        metrics::gauge!("framelock_offset_us").set(offset_us as f64);

        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

    /// Host clock that advances a fixed step on every read, so each probe
    /// observes a deterministic round-trip bracket.
    struct SteppingClock {
        now: AtomicI64,
        step_us: i64,
    }

    impl SteppingClock {
        fn new(step_us: i64) -> Self {
            Self {
                now: AtomicI64::new(1_000_000),
                step_us,
            }
        }
    }

    impl HostClock for SteppingClock {
        fn now_us(&self) -> i64 {
            self.now.fetch_add(self.step_us, Ordering::SeqCst)
        }
    }

    /// Port whose device clock trails the host by a fixed offset.
    struct SkewedPort<'a> {
        clock: &'a SteppingClock,
        device_minus_host_us: i64,
    }

    impl TimingPort for SkewedPort<'_> {
        fn device_clock_us(&self) -> Result<i64, PllError> {
            let host = self.clock.now.load(Ordering::SeqCst);
            Ok(host + self.device_minus_host_us)
        }
    }

    struct DeadPort {
        calls: AtomicU32,
    }

    impl TimingPort for DeadPort {
        fn device_clock_us(&self) -> Result<i64, PllError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PllError::port("device did not answer"))
        }
    }

    #[test]
    fn test_error_bound_is_half_round_trip() {
        let rtt = 120;
        let clock = SteppingClock::new(rtt);
        let port = SkewedPort {
            clock: &clock,
            device_minus_host_us: -5_000_000,
        };

        let estimator = OffsetEstimator::new(ProbeConfig {
            max_probes: 16,
            target_error_us: 0,
            best_k: 4,
            campaign_timeout_ms: 1_000,
        });

        let estimate = estimator.measure(&port, &clock).unwrap();
        // Each probe brackets the device read by exactly one clock step.
        assert!(estimate.error_bound_us <= (rtt / 2) as u64);
        assert!(estimate.sample_count >= 1);
    }

    #[test]
    fn test_recovers_known_offset() {
        let clock = SteppingClock::new(50);
        let port = SkewedPort {
            clock: &clock,
            device_minus_host_us: -123_456,
        };

        let estimator = OffsetEstimator::new(ProbeConfig::default());
        let estimate = estimator.measure(&port, &clock).unwrap();

        // offset is host - device
        let err = (estimate.offset_us - 123_456).abs();
        assert!(err <= 50, "offset off by {err}us");
    }

    #[test]
    fn test_stops_early_when_target_met() {
        let clock = SteppingClock::new(10);
        let port = SkewedPort {
            clock: &clock,
            device_minus_host_us: 0,
        };

        let estimator = OffsetEstimator::new(ProbeConfig {
            max_probes: 1_000,
            target_error_us: 100,
            best_k: 1,
            campaign_timeout_ms: 1_000,
        });

        let estimate = estimator.measure(&port, &clock).unwrap();
        // First probe already satisfies a 100us bound at a 10us step.
        assert_eq!(estimate.sample_count, 1);
    }

    #[test]
    fn test_unresponsive_port_times_out() {
        let clock = SteppingClock::new(10);
        let port = DeadPort {
            calls: AtomicU32::new(0),
        };

        let estimator = OffsetEstimator::new(ProbeConfig {
            max_probes: 8,
            ..ProbeConfig::default()
        });

        let result = estimator.measure(&port, &clock);
        assert!(matches!(result, Err(PllError::ProbeTimeout { probes: 8, .. })));
        assert_eq!(port.calls.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_returns_best_effort_when_target_unmet() {
        let rtt = 1_000;
        let clock = SteppingClock::new(rtt);
        let port = SkewedPort {
            clock: &clock,
            device_minus_host_us: 0,
        };

        let estimator = OffsetEstimator::new(ProbeConfig {
            max_probes: 4,
            target_error_us: 1, // unreachable at this latency
            best_k: 2,
            campaign_timeout_ms: 10_000,
        });

        let estimate = estimator.measure(&port, &clock).unwrap();
        assert!(estimate.error_bound_us > 1);
        assert_eq!(estimate.sample_count, 4);
    }
}
