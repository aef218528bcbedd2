//! FramePll - loop supervisor and lifecycle.
//!
//! Owns the mutex-guarded controller state and the timing port binding.
//! Frame events arrive from the capture pipeline's callback thread;
//! `start`/`stop` run on the control plane. A single mutex serializes both, so
//! lifecycle operations drain any in-flight event processing before resetting
//! state. The event path does arithmetic only and never blocks on I/O.

use std::sync::{Arc, Mutex};

use contracts::{
    FrameEvent, HostClock, LockState, LockStatus, OffsetEstimate, PllError, PllSettings,
    TimingPort, TriggerDeadline,
};
use tracing::{info, instrument};

use crate::controller::LockController;
use crate::estimator::OffsetEstimator;
use crate::scheduler;

/// Frame-capture phase-locked loop
pub struct FramePll {
    settings: PllSettings,
    port: Mutex<Option<Arc<dyn TimingPort>>>,
    /// `None` while stopped; lifecycle and event path share this lock
    inner: Mutex<Option<LockController>>,
}

impl FramePll {
    /// Create a stopped loop with the given settings
    pub fn new(settings: PllSettings) -> Self {
        Self {
            settings,
            port: Mutex::new(None),
            inner: Mutex::new(None),
        }
    }

    /// Supply the capture device's timing port.
    ///
    /// Must happen before `start()`; rebinding while stopped is allowed.
    pub fn bind_port(&self, port: Arc<dyn TimingPort>) {
        if let Ok(mut slot) = self.port.lock() {
            *slot = Some(port);
        }
    }

    /// Start the loop: run one offset campaign and install fresh state.
    ///
    /// # Errors
    ///
    /// - `ConfigValidation` if the loop is disabled or the settings tree is
    ///   inconsistent (same rules the config loader enforces)
    /// - `PortUnbound` if no timing port has been supplied
    /// - `ProbeTimeout` if the offset campaign produced no usable sample
    ///
    /// On error no partial state is created; the loop remains stopped.
    #[instrument(name = "pll_start", skip_all)]
    pub fn start(&self, clock: &dyn HostClock) -> Result<OffsetEstimate, PllError> {
        if !self.settings.enabled {
            return Err(PllError::config_validation("enabled", "pll is disabled"));
        }
        // Settings built in-process bypass the config loader
        self.settings.validate()?;

        let port = self
            .port
            .lock()
            .map_err(|_| PllError::Other("port mutex poisoned".into()))?
            .clone()
            .ok_or(PllError::PortUnbound)?;

        let estimator = OffsetEstimator::new(self.settings.probe.clone());
        let estimate = estimator.measure(port.as_ref(), clock)?;

        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PllError::Other("state mutex poisoned".into()))?;
        *inner = Some(LockController::new(
            self.settings.lock.clone(),
            self.settings.nominal_period_us,
            estimate,
            clock.now_us(),
        ));

        info!(
            offset_us = estimate.offset_us,
            error_bound_us = estimate.error_bound_us,
            nominal_period_us = self.settings.nominal_period_us,
            "pll started"
        );
        Ok(estimate)
    }

    /// Stop the loop and release the port binding. Idempotent.
    #[instrument(name = "pll_stop", skip_all)]
    pub fn stop(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.take().is_some() {
                info!("pll stopped");
            }
        }
        if let Ok(mut port) = self.port.lock() {
            *port = None;
        }
    }

    /// Whether the loop is currently running
    pub fn is_running(&self) -> bool {
        self.inner.lock().map(|i| i.is_some()).unwrap_or(false)
    }

    /// Feed one frame-arrival event (capture callback thread).
    pub fn on_frame_event(&self, event: FrameEvent) -> Result<LockState, PllError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PllError::Other("state mutex poisoned".into()))?;
        let ctrl = inner.as_mut().ok_or(PllError::NotRunning)?;
        Ok(ctrl.on_frame_event(event.device_timestamp_us, event.host_timestamp_us))
    }

    /// Host-clock deadline for the next actuation, if the loop is locked.
    pub fn next_trigger_deadline(&self) -> Option<TriggerDeadline> {
        let inner = self.inner.lock().ok()?;
        let ctrl = inner.as_ref()?;
        scheduler::next_trigger_deadline(ctrl.state(), ctrl.model(), &self.settings.trigger)
    }

    /// Watchdog poll: fault the loop when events stopped arriving.
    pub fn check_deadline(&self, now_host_us: i64) -> Result<LockState, PllError> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PllError::Other("state mutex poisoned".into()))?;
        let ctrl = inner.as_mut().ok_or(PllError::NotRunning)?;
        Ok(ctrl.check_deadline(now_host_us))
    }

    /// Diagnostic snapshot of the running loop
    pub fn status(&self) -> Option<LockStatus> {
        let inner = self.inner.lock().ok()?;
        inner.as_ref().map(|ctrl| ctrl.status())
    }

    /// Re-run an offset campaign to track slow clock drift.
    ///
    /// Swaps the estimate under the state lock; the lock classification is
    /// otherwise untouched.
    #[instrument(name = "pll_remeasure", skip_all)]
    pub fn remeasure_offset(&self, clock: &dyn HostClock) -> Result<OffsetEstimate, PllError> {
        let port = self
            .port
            .lock()
            .map_err(|_| PllError::Other("port mutex poisoned".into()))?
            .clone()
            .ok_or(PllError::PortUnbound)?;

        let estimator = OffsetEstimator::new(self.settings.probe.clone());
        let estimate = estimator.measure(port.as_ref(), clock)?;

        let mut inner = self
            .inner
            .lock()
            .map_err(|_| PllError::Other("state mutex poisoned".into()))?;
        let ctrl = inner.as_mut().ok_or(PllError::NotRunning)?;
        ctrl.set_offset(estimate);

        info!(
            offset_us = estimate.offset_us,
            error_bound_us = estimate.error_bound_us,
            "offset re-measured"
        );
        Ok(estimate)
    }
}
