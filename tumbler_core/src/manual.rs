//! Operator-driven measurement of individual samples.
//!
//! The chamber waits at the load position. For each label the operator
//! supplies, it is flipped to the read position, measured, and flipped back.

use std::sync::Arc;

use eyre::WrapErr;
use tumbler_traits::{ChamberActuator, Clock, Light, LightSensor};

use crate::config::{CycleCfg, SensorCalibration};
use crate::cycle::Orientation;
use crate::error::Result;
use crate::hw_error::hw_report;
use crate::recorder::{LabeledSample, LabeledSeries};
use crate::sensor::configure_sensor;

/// Supplies sample labels. `Ok(None)` or an empty label ends the session.
pub trait LabelSource {
    fn next_label(&mut self) -> Result<Option<String>>;
}

impl<F> LabelSource for F
where
    F: FnMut() -> Result<Option<String>>,
{
    fn next_label(&mut self) -> Result<Option<String>> {
        self()
    }
}

pub struct ManualReadController<A: ChamberActuator, L: Light, S: LightSensor> {
    actuator: A,
    light: L,
    sensor: S,
    cycle: CycleCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    orientation: Orientation,
}

impl<A: ChamberActuator, L: Light, S: LightSensor> ManualReadController<A, L, S> {
    /// Configure the sensor and park the chamber at the load position.
    pub fn new(
        mut actuator: A,
        light: L,
        mut sensor: S,
        cycle: CycleCfg,
        calibration: SensorCalibration,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self> {
        configure_sensor(&mut sensor, calibration, &*clock)?;
        let load = !cycle.end_forward;
        actuator
            .flip(load)
            .map_err(hw_report)
            .wrap_err("move to load position")?;
        Ok(Self {
            actuator,
            light,
            sensor,
            cycle,
            clock,
            orientation: Orientation::after_flip(load),
        })
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn flip(&mut self, forward: bool, what: &'static str) -> Result<()> {
        self.actuator
            .flip(forward)
            .map_err(hw_report)
            .wrap_err(what)?;
        self.orientation = Orientation::after_flip(forward);
        Ok(())
    }

    /// Read one sample: to read position, illuminate, sample, back to load.
    pub fn read_one(&mut self, label: &str) -> Result<LabeledSample> {
        let end_forward = self.cycle.end_forward;
        self.flip(end_forward, "move to read position")?;
        self.light
            .set_light(true)
            .map_err(hw_report)
            .wrap_err("light on")?;
        self.clock.sleep(self.cycle.lamp_time);
        let reading = self.sensor.sample().map_err(hw_report);
        self.light
            .set_light(false)
            .map_err(hw_report)
            .wrap_err("light off")?;
        let intensity = reading.wrap_err("sample light sensor")?;
        self.flip(!end_forward, "move to load position")?;
        tracing::info!(label, intensity, "manual sample recorded");
        Ok(LabeledSample {
            label: label.to_string(),
            intensity,
        })
    }

    /// Read labels until the source is exhausted.
    pub fn run(&mut self, labels: &mut dyn LabelSource) -> Result<LabeledSeries> {
        let mut series = LabeledSeries::new();
        while let Some(label) = labels.next_label()? {
            let label = label.trim();
            if label.is_empty() {
                break;
            }
            series.push(self.read_one(label)?);
        }
        Ok(series)
    }
}
