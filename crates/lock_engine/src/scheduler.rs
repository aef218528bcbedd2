//! Trigger deadline derivation.
//!
//! Pure function of the current model state; holds no state of its own. An
//! unlocked loop never yields a deadline; callers must not schedule physical
//! actuation from a model that has not proven itself.

use contracts::{LockState, PeriodModel, TriggerConfig, TriggerDeadline};

/// Derive the host-clock deadline for the next actuation.
///
/// Returns `None` unless the loop is LOCKED and triggering is enabled. When
/// locked, the deadline is the predicted next frame event plus the configured
/// lead-time bias (negative fires before the event, compensating actuator
/// latency).
pub fn next_trigger_deadline(
    state: LockState,
    model: &PeriodModel,
    config: &TriggerConfig,
) -> Option<TriggerDeadline> {
    if !config.enabled || !state.is_locked() {
        return None;
    }

    let predicted_frame_us = model.predicted_next_us();
    Some(TriggerDeadline {
        deadline_host_us: predicted_frame_us + config.lead_time_us,
        predicted_frame_us,
        lead_time_us: config.lead_time_us,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> PeriodModel {
        PeriodModel {
            period_estimate_us: 33_333.0,
            phase_reference_us: 1_000_000,
            last_update_host_time_us: 1_000_000,
        }
    }

    #[test]
    fn test_unavailable_unless_locked() {
        let config = TriggerConfig::default();
        for state in [LockState::Unlocked, LockState::Converging, LockState::Faulted] {
            assert!(next_trigger_deadline(state, &model(), &config).is_none());
        }
    }

    #[test]
    fn test_locked_deadline_applies_lead_time() {
        let config = TriggerConfig {
            enabled: true,
            lead_time_us: -1_500,
        };
        let deadline = next_trigger_deadline(LockState::Locked, &model(), &config).unwrap();
        assert_eq!(deadline.predicted_frame_us, 1_033_333);
        assert_eq!(deadline.deadline_host_us, 1_031_833);
        assert_eq!(deadline.lead_time_us, -1_500);
    }

    #[test]
    fn test_disabled_trigger_yields_nothing() {
        let config = TriggerConfig {
            enabled: false,
            lead_time_us: 0,
        };
        assert!(next_trigger_deadline(LockState::Locked, &model(), &config).is_none());
    }
}
