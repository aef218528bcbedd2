//! Settings validation.
//!
//! The rules themselves live on `PllSettings::validate` in `contracts`, so
//! settings built in-process go through the same checks as loaded ones:
//! - lock tolerance, smoothing, deviation within meaningful ranges
//! - lock_confirm_count > unlock_hysteresis (hysteresis must not flap)
//! - nominal period inside the plausible period range
//! - probe budgets non-zero

use contracts::{PllError, PllSettings};

/// Validate a settings tree.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(settings: &PllSettings) -> Result<(), PllError> {
    settings.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(validate(&PllSettings::default()).is_ok());
    }

    #[test]
    fn test_rejects_nonpositive_tolerance() {
        let mut settings = PllSettings::default();
        settings.lock.lock_tolerance_us = 0;
        let err = validate(&settings).unwrap_err();
        assert!(err.to_string().contains("lock_tolerance_us"));
    }

    #[test]
    fn test_rejects_flapping_hysteresis() {
        let mut settings = PllSettings::default();
        settings.lock.unlock_hysteresis = settings.lock.lock_confirm_count;
        let err = validate(&settings).unwrap_err();
        assert!(err.to_string().contains("unlock_hysteresis"));
    }

    #[test]
    fn test_rejects_smoothing_out_of_range() {
        let mut settings = PllSettings::default();
        settings.lock.period_smoothing = 1.5;
        assert!(validate(&settings).is_err());
    }

    #[test]
    fn test_rejects_nominal_outside_plausible_range() {
        let mut settings = PllSettings::default();
        settings.nominal_period_us = 10.0; // below min_period_us
        let err = validate(&settings).unwrap_err();
        assert!(err.to_string().contains("nominal_period_us"));
    }

    #[test]
    fn test_rejects_zero_probe_budget() {
        let mut settings = PllSettings::default();
        settings.probe.max_probes = 0;
        assert!(validate(&settings).is_err());
    }
}
