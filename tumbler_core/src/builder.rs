//! Builder for `DissociationController`.
//!
//! `try_build()` validates the timing, configures the sensor (plus the fixed
//! settle delay) and anchors the chamber at the measurement end, so a built
//! controller is ready to sample.

use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use tumbler_traits::clock::{Clock, MonotonicClock};
use tumbler_traits::{ChamberActuator, Light, LightSensor};

use crate::cancel::CancelToken;
use crate::config::{CycleCfg, SensorCalibration};
use crate::controller::{DissociationController, StopPredicate};
use crate::cycle::{CycleState, Orientation};
use crate::error::{BuildError, Result};
use crate::hw_error::hw_report;
use crate::recorder::{DataRecorder, SampleSeries};
use crate::sensor::configure_sensor;
use crate::util::as_millis_u64;

/// Shortest tumble period accepted. Keeps sample timestamps strictly increasing
/// at millisecond resolution.
pub const MIN_TUMBLE: Duration = Duration::from_millis(1);

pub struct ControllerBuilder<A, L, S> {
    actuator: Option<A>,
    light: Option<L>,
    sensor: Option<S>,
    recorder: Option<DataRecorder>,
    cycle: Option<CycleCfg>,
    calibration: Option<SensorCalibration>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    cancel: Option<CancelToken>,
    stop_when: Option<StopPredicate>,
}

impl<A, L, S> Default for ControllerBuilder<A, L, S> {
    fn default() -> Self {
        Self {
            actuator: None,
            light: None,
            sensor: None,
            recorder: None,
            cycle: None,
            calibration: None,
            clock: None,
            cancel: None,
            stop_when: None,
        }
    }
}

impl<A: ChamberActuator, L: Light, S: LightSensor> DissociationController<A, L, S> {
    pub fn builder() -> ControllerBuilder<A, L, S> {
        ControllerBuilder::default()
    }
}

impl<A, L, S> ControllerBuilder<A, L, S> {
    pub fn with_actuator(mut self, actuator: A) -> Self {
        self.actuator = Some(actuator);
        self
    }
    pub fn with_light(mut self, light: L) -> Self {
        self.light = Some(light);
        self
    }
    pub fn with_sensor(mut self, sensor: S) -> Self {
        self.sensor = Some(sensor);
        self
    }
    pub fn with_recorder(mut self, recorder: DataRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }
    pub fn with_cycle(mut self, cycle: CycleCfg) -> Self {
        self.cycle = Some(cycle);
        self
    }
    pub fn with_calibration(mut self, calibration: SensorCalibration) -> Self {
        self.calibration = Some(calibration);
        self
    }
    /// Provide a custom clock; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
    /// Stop the run once `f` returns true for the series. Never stops by default.
    pub fn with_stop_when<F>(mut self, f: F) -> Self
    where
        F: FnMut(&SampleSeries) -> bool + 'static,
    {
        self.stop_when = Some(Box::new(f));
        self
    }
}

fn validate(cycle: &CycleCfg) -> Result<()> {
    if cycle.tumble_time < MIN_TUMBLE {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tumble_time must be >= 1 ms",
        )));
    }
    if cycle.sample_time.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sample_time must be > 0",
        )));
    }
    if cycle.settle_time < cycle.tumble_time {
        tracing::warn!(
            settle_ms = as_millis_u64(cycle.settle_time),
            tumble_ms = as_millis_u64(cycle.tumble_time),
            "settle_time shorter than tumble_time; settle wait is zero"
        );
    }
    Ok(())
}

impl<A: ChamberActuator, L: Light, S: LightSensor> ControllerBuilder<A, L, S> {
    pub fn try_build(self) -> Result<DissociationController<A, L, S>> {
        let mut actuator = self
            .actuator
            .ok_or_else(|| eyre::Report::new(BuildError::MissingActuator))?;
        let light = self
            .light
            .ok_or_else(|| eyre::Report::new(BuildError::MissingLight))?;
        let mut sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let recorder = self
            .recorder
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRecorder))?;
        let cycle = self.cycle.unwrap_or_default();
        validate(&cycle)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };

        configure_sensor(&mut sensor, self.calibration.unwrap_or_default(), &*clock)?;

        actuator
            .flip(cycle.end_forward)
            .map_err(hw_report)
            .wrap_err("anchor chamber at measurement end")?;
        let orientation = Orientation::measurement(cycle.end_forward);

        let num_tumbles = cycle.num_tumbles();
        tracing::info!(
            num_tumbles,
            settle_wait_ms = as_millis_u64(cycle.settle_wait()),
            end_forward = cycle.end_forward,
            "controller ready"
        );

        let epoch = clock.now();
        Ok(DissociationController {
            actuator,
            light,
            sensor,
            cycle,
            recorder,
            clock,
            cancel: self.cancel,
            stop_when: self.stop_when,
            state: CycleState::Settling,
            orientation,
            num_tumbles,
            epoch,
        })
    }
}
