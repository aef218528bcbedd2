//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshot checks
//! - Deterministic lock scenarios on a fake clock
//! - Mock-camera e2e runs on the real clock (no hardware required)

#[cfg(test)]
mod contract_tests {
    use contracts::{LockState, PllSettings};

    #[test]
    fn test_default_settings_are_usable() {
        let settings = PllSettings::default();
        assert!(settings.enabled);
        assert!(settings.lock.lock_confirm_count > settings.lock.unlock_hysteresis);
        assert!(settings.probe.best_k >= 1);
    }

    #[test]
    fn test_lock_state_predicates() {
        assert!(LockState::Locked.is_locked());
        assert!(!LockState::Unlocked.is_locked());
        assert!(!LockState::Converging.is_locked());
        assert!(!LockState::Faulted.is_locked());
    }

    #[test]
    fn test_settings_survive_config_round_trip() {
        let settings = PllSettings::default();
        let toml = config_loader::ConfigLoader::to_toml(&settings).unwrap();
        let back =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(settings.nominal_period_us, back.nominal_period_us);
        assert_eq!(settings.lock.lock_tolerance_us, back.lock.lock_tolerance_us);
        assert_eq!(settings.probe.max_probes, back.probe.max_probes);
    }
}

#[cfg(test)]
mod deterministic_tests {
    use std::sync::Arc;

    use capture::{FakeClock, MockTimingPort};
    use contracts::{FrameEvent, HostClock, LockState, PllError, PllSettings};
    use lock_engine::FramePll;
    use observability::PllMetricsAggregator;

    const PERIOD_US: i64 = 33_333;
    const SKEW_US: i64 = -400_000;

    fn started_pll(settings: PllSettings) -> (FramePll, FakeClock) {
        let clock = FakeClock::new(5_000_000, 25);
        let pll = FramePll::new(settings);
        pll.bind_port(Arc::new(MockTimingPort::with_clock(
            Arc::new(clock.clone()),
            SKEW_US,
        )));
        pll.start(&clock).unwrap();
        (pll, clock)
    }

    fn event(device_us: i64) -> FrameEvent {
        FrameEvent {
            device_timestamp_us: device_us,
            host_timestamp_us: device_us - SKEW_US,
            frame_id: None,
        }
    }

    /// A steady cadence must converge, lock, and produce a trigger deadline
    /// that leads the predicted exposure by the configured bias.
    #[test]
    fn test_e2e_lock_and_trigger_deadline() {
        let mut settings = PllSettings::default();
        settings.trigger.lead_time_us = -1_500;
        let (pll, clock) = started_pll(settings);

        let base = clock.now_us() + SKEW_US + 50_000;
        let mut state = LockState::Unlocked;
        for k in 0..4 {
            state = pll.on_frame_event(event(base + k * PERIOD_US)).unwrap();
        }
        assert_eq!(state, LockState::Locked);

        let deadline = pll.next_trigger_deadline().expect("locked loop");
        assert_eq!(deadline.lead_time_us, -1_500);
        assert_eq!(
            deadline.deadline_host_us,
            deadline.predicted_frame_us - 1_500
        );

        let status = pll.status().unwrap();
        assert_eq!(deadline.predicted_frame_us, status.predicted_next_us);
        // Offset campaign recovered the simulated skew
        assert!((status.offset.offset_us - (-SKEW_US)).abs() <= 1_000);
    }

    /// A single missing frame keeps the lock; the model extrapolates across
    /// the two-period gap.
    #[test]
    fn test_e2e_single_dropout_keeps_lock() {
        let (pll, clock) = started_pll(PllSettings::default());

        let base = clock.now_us() + SKEW_US + 50_000;
        let mut t = base;
        for _ in 0..4 {
            pll.on_frame_event(event(t)).unwrap();
            t += PERIOD_US;
        }
        assert_eq!(pll.status().unwrap().state, LockState::Locked);

        // Skip one frame, next event lands two periods out
        t += PERIOD_US;
        let state = pll.on_frame_event(event(t)).unwrap();
        assert_eq!(state, LockState::Locked);
        assert_eq!(pll.status().unwrap().dropouts, 1);
    }

    /// Repeated gross discontinuities drive the loop into the terminal
    /// Faulted state; restart requires a fresh bind + start.
    #[test]
    fn test_e2e_fault_and_restart() {
        let (pll, clock) = started_pll(PllSettings::default());

        let base = clock.now_us() + SKEW_US + 50_000;
        for k in 0..4 {
            pll.on_frame_event(event(base + k * PERIOD_US)).unwrap();
        }
        assert_eq!(pll.status().unwrap().state, LockState::Locked);

        // Off-grid arrivals, none fitting an integer cycle count
        let anchor = base + 3 * PERIOD_US;
        let mut state = LockState::Locked;
        for frac in [1.40_f64, 1.45, 1.35] {
            let t = anchor + (frac * PERIOD_US as f64) as i64;
            state = pll.on_frame_event(event(t)).unwrap();
        }
        assert_eq!(state, LockState::Faulted);

        // Faulted is terminal, deadlines stop
        assert!(pll.next_trigger_deadline().is_none());

        // Recovery path: stop, rebind, start again
        pll.stop();
        assert!(matches!(
            pll.on_frame_event(event(0)),
            Err(PllError::NotRunning)
        ));
        pll.bind_port(Arc::new(MockTimingPort::with_clock(
            Arc::new(clock.clone()),
            SKEW_US,
        )));
        pll.start(&clock).unwrap();
        assert_eq!(pll.status().unwrap().state, LockState::Unlocked);
    }

    /// Watchdog faults the loop after sustained silence.
    #[test]
    fn test_e2e_watchdog_faults_silent_camera() {
        let (pll, clock) = started_pll(PllSettings::default());

        let base = clock.now_us() + SKEW_US + 50_000;
        for k in 0..4 {
            pll.on_frame_event(event(base + k * PERIOD_US)).unwrap();
        }
        assert_eq!(pll.status().unwrap().state, LockState::Locked);

        let last_host = base + 3 * PERIOD_US - SKEW_US;
        let silence = PllSettings::default().lock.watchdog_cycles as i64 + 1;
        let state = pll
            .check_deadline(last_host + silence * PERIOD_US)
            .unwrap();
        assert_eq!(state, LockState::Faulted);
    }

    /// The metrics aggregator sees the same run the controller does.
    #[test]
    fn test_e2e_aggregator_tracks_lock_ratio() {
        let (pll, clock) = started_pll(PllSettings::default());
        let mut aggregator = PllMetricsAggregator::new();

        let base = clock.now_us() + SKEW_US + 50_000;
        for k in 0..10 {
            pll.on_frame_event(event(base + k * PERIOD_US)).unwrap();
            aggregator.update(&pll.status().unwrap());
        }

        let summary = aggregator.summary();
        assert_eq!(summary.total_events, 10);
        assert!(summary.locked_events >= 6);
        assert_eq!(summary.final_state, Some(LockState::Locked));
        assert!(summary.period_us.mean > 30_000.0 && summary.period_us.mean < 36_000.0);
    }
}

#[cfg(test)]
mod mock_camera_tests {
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::time::Duration;

    use capture::{MockCamera, MockCameraConfig, MockTimingPort, SystemClock};
    use contracts::{FrameSource, LockState, PllSettings};
    use lock_engine::FramePll;

    /// Settings loose enough to ride out OS scheduling noise in the mock
    /// camera's sleep cadence.
    fn wall_clock_settings(period_us: f64) -> PllSettings {
        let mut settings = PllSettings::default();
        settings.nominal_period_us = period_us;
        settings.lock.lock_tolerance_us = (period_us / 2.0) as i64;
        settings.lock.max_period_deviation = 0.45;
        settings.lock.fault_discontinuity_limit = 10;
        settings
    }

    /// Full wall-clock run: mock camera thread -> channel -> loop, must
    /// reach LOCKED within a bounded number of frames.
    #[test]
    fn test_e2e_mock_camera_reaches_lock() {
        let skew_us = -250_000;
        let settings = wall_clock_settings(20_000.0);

        let pll = FramePll::new(settings);
        pll.bind_port(Arc::new(MockTimingPort::new(skew_us)));
        pll.start(&SystemClock).unwrap();

        let camera = MockCamera::new(
            "e2e-cam",
            MockCameraConfig {
                frequency_hz: 50.0,
                device_minus_host_us: skew_us,
                jitter_us: 0,
                drop_every: None,
            },
        );

        let (tx, rx) = mpsc::channel();
        camera.listen(Arc::new(move |event| {
            let _ = tx.send(event);
        }));

        let mut locked = false;
        for _ in 0..150 {
            let Ok(event) = rx.recv_timeout(Duration::from_secs(2)) else {
                break;
            };
            if pll.on_frame_event(event).unwrap() == LockState::Locked {
                locked = true;
                break;
            }
        }
        camera.stop();

        assert!(locked, "loop never locked: {:?}", pll.status());
        assert!(pll.next_trigger_deadline().is_some());
        pll.stop();
    }

    /// A periodic drop pattern is absorbed as dropouts without faulting.
    #[test]
    fn test_e2e_mock_camera_with_drops_stays_healthy() {
        let settings = wall_clock_settings(20_000.0);

        let pll = FramePll::new(settings);
        pll.bind_port(Arc::new(MockTimingPort::new(0)));
        pll.start(&SystemClock).unwrap();

        let camera = MockCamera::new(
            "e2e-cam-drops",
            MockCameraConfig {
                frequency_hz: 50.0,
                device_minus_host_us: 0,
                jitter_us: 0,
                drop_every: Some(5),
            },
        );

        let (tx, rx) = mpsc::channel();
        camera.listen(Arc::new(move |event| {
            let _ = tx.send(event);
        }));

        let mut events = 0;
        while events < 60 {
            let Ok(event) = rx.recv_timeout(Duration::from_secs(2)) else {
                break;
            };
            events += 1;
            let state = pll.on_frame_event(event).unwrap();
            assert_ne!(state, LockState::Faulted, "status: {:?}", pll.status());
        }
        camera.stop();

        let status = pll.status().unwrap();
        assert!(events >= 40, "only {events} events arrived");
        assert!(status.dropouts >= 1, "drop pattern never registered");
        pll.stop();
    }
}
