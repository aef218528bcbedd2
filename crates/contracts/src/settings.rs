//! PLL settings contracts that can be shared across crates.
//!
//! Passive configuration: read, never mutated, by the core.

use serde::{Deserialize, Serialize};

use crate::PllError;

/// Top-level PLL settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PllSettings {
    /// Whether the loop is enabled at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Nominal inter-frame period (microseconds), e.g. 33_333 for ~30 fps.
    /// Seeds the period estimate so phase errors are classifiable from the
    /// second event.
    #[serde(default = "default_nominal_period")]
    pub nominal_period_us: f64,

    /// Lock controller configuration
    #[serde(default)]
    pub lock: LockConfig,

    /// Offset probe configuration
    #[serde(default)]
    pub probe: ProbeConfig,

    /// Trigger scheduling configuration
    #[serde(default)]
    pub trigger: TriggerConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_nominal_period() -> f64 {
    33_333.0
}

impl Default for PllSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            nominal_period_us: default_nominal_period(),
            lock: LockConfig::default(),
            probe: ProbeConfig::default(),
            trigger: TriggerConfig::default(),
        }
    }
}

impl PllSettings {
    /// Validate the settings tree.
    ///
    /// Enforced both by the config loader and by `start()`, so settings
    /// constructed in-process obey the same rules as loaded ones. Returns the
    /// first error encountered.
    pub fn validate(&self) -> Result<(), PllError> {
        self.validate_period()?;
        self.validate_lock()?;
        self.validate_probe()?;
        Ok(())
    }

    fn validate_period(&self) -> Result<(), PllError> {
        let lock = &self.lock;

        if lock.min_period_us <= 0.0 || lock.min_period_us >= lock.max_period_us {
            return Err(PllError::config_validation(
                "lock.min_period_us / lock.max_period_us",
                format!(
                    "plausible range must satisfy 0 < min ({}) < max ({})",
                    lock.min_period_us, lock.max_period_us
                ),
            ));
        }

        if self.nominal_period_us < lock.min_period_us
            || self.nominal_period_us > lock.max_period_us
        {
            return Err(PllError::config_validation(
                "nominal_period_us",
                format!(
                    "nominal period {} outside plausible range [{}, {}]",
                    self.nominal_period_us, lock.min_period_us, lock.max_period_us
                ),
            ));
        }

        Ok(())
    }

    fn validate_lock(&self) -> Result<(), PllError> {
        let lock = &self.lock;

        if lock.lock_tolerance_us <= 0 {
            return Err(PllError::config_validation(
                "lock.lock_tolerance_us",
                format!("tolerance must be > 0, got {}", lock.lock_tolerance_us),
            ));
        }

        if lock.lock_confirm_count == 0 || lock.unlock_hysteresis == 0 {
            return Err(PllError::config_validation(
                "lock.lock_confirm_count / lock.unlock_hysteresis",
                "streak counts must be >= 1",
            ));
        }

        if lock.lock_confirm_count <= lock.unlock_hysteresis {
            return Err(PllError::config_validation(
                "lock.unlock_hysteresis",
                format!(
                    "unlock_hysteresis ({}) must be < lock_confirm_count ({}) to avoid flapping",
                    lock.unlock_hysteresis, lock.lock_confirm_count
                ),
            ));
        }

        if !(lock.period_smoothing > 0.0 && lock.period_smoothing <= 1.0) {
            return Err(PllError::config_validation(
                "lock.period_smoothing",
                format!("smoothing must be in (0, 1], got {}", lock.period_smoothing),
            ));
        }

        if !(lock.max_period_deviation > 0.0 && lock.max_period_deviation < 1.0) {
            return Err(PllError::config_validation(
                "lock.max_period_deviation",
                format!(
                    "deviation must be in (0, 1), got {}",
                    lock.max_period_deviation
                ),
            ));
        }

        if lock.fault_discontinuity_limit == 0 || lock.watchdog_cycles == 0 {
            return Err(PllError::config_validation(
                "lock.fault_discontinuity_limit / lock.watchdog_cycles",
                "fault thresholds must be >= 1",
            ));
        }

        Ok(())
    }

    fn validate_probe(&self) -> Result<(), PllError> {
        let probe = &self.probe;

        if probe.max_probes == 0 {
            return Err(PllError::config_validation(
                "probe.max_probes",
                "probe budget must be >= 1",
            ));
        }

        if probe.best_k == 0 {
            return Err(PllError::config_validation(
                "probe.best_k",
                "best_k must be >= 1",
            ));
        }

        if probe.campaign_timeout_ms == 0 {
            return Err(PllError::config_validation(
                "probe.campaign_timeout_ms",
                "campaign timeout must be >= 1ms",
            ));
        }

        Ok(())
    }
}

/// Lock controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Phase error tolerance for lock classification (microseconds)
    pub lock_tolerance_us: i64,

    /// Consecutive in-tolerance events required to enter LOCKED (N_lock)
    pub lock_confirm_count: u32,

    /// Consecutive out-of-tolerance events required to leave LOCKED (N_unlock).
    /// Must be smaller than `lock_confirm_count` to avoid flapping.
    pub unlock_hysteresis: u32,

    /// EWMA weight applied to each new per-cycle interval, in (0, 1].
    /// Small values favor stability over responsiveness.
    pub period_smoothing: f64,

    /// Fractional deviation of a per-cycle interval from the model above
    /// which the event counts as a gross discontinuity, in (0, 1)
    pub max_period_deviation: f64,

    /// Consecutive gross discontinuities before the loop faults
    pub fault_discontinuity_limit: u32,

    /// Periods of silence tolerated before the watchdog faults the loop
    pub watchdog_cycles: u32,

    /// Physically plausible period range (microseconds)
    pub min_period_us: f64,
    pub max_period_us: f64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_tolerance_us: 500,
            lock_confirm_count: 3,
            unlock_hysteresis: 2,
            period_smoothing: 0.1,
            max_period_deviation: 0.25,
            fault_discontinuity_limit: 3,
            watchdog_cycles: 5,
            min_period_us: 1_000.0,
            max_period_us: 1_000_000.0,
        }
    }
}

/// Offset probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Maximum probes per campaign
    pub max_probes: u32,

    /// Stop early once the error bound reaches this target (microseconds)
    pub target_error_us: u64,

    /// Number of tightest-bracket probes averaged for the final offset
    pub best_k: usize,

    /// Wall-clock budget for one campaign (milliseconds)
    pub campaign_timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_probes: 64,
            target_error_us: 50,
            best_k: 4,
            campaign_timeout_ms: 250,
        }
    }
}

/// Trigger scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Whether trigger deadlines are produced at all
    pub enabled: bool,

    /// Signed bias applied to the predicted event time (microseconds).
    /// Negative fires before the modeled event, compensating actuator latency.
    pub lead_time_us: i64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            lead_time_us: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let s = PllSettings::default();
        assert!(s.enabled);
        assert!(s.lock.lock_confirm_count > s.lock.unlock_hysteresis);
        assert!(s.lock.period_smoothing > 0.0 && s.lock.period_smoothing <= 1.0);
        assert!(s.nominal_period_us >= s.lock.min_period_us);
        assert!(s.nominal_period_us <= s.lock.max_period_us);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_flapping_hysteresis() {
        let mut s = PllSettings::default();
        s.lock.unlock_hysteresis = s.lock.lock_confirm_count;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("unlock_hysteresis"));
    }

    #[test]
    fn test_validate_rejects_smoothing_out_of_range() {
        let mut s = PllSettings::default();
        s.lock.period_smoothing = -0.5;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let json = r#"{ "nominal_period_us": 16667.0 }"#;
        let s: PllSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.nominal_period_us, 16_667.0);
        assert_eq!(s.lock.lock_tolerance_us, 500);
        assert_eq!(s.probe.max_probes, 64);
        assert!(s.trigger.enabled);
    }
}
