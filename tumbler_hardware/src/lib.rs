//! Instrument backends: simulated (always available) and Raspberry Pi
//! drivers built on `rppal` (feature `hardware`).
pub mod error;
#[cfg(feature = "hardware")]
pub mod gpio;
#[cfg(feature = "hardware")]
pub mod tsl2591;

pub use error::HwError;

use tumbler_traits::{
    ContinuousServo, Gain, HwResult, IntegrationTime, Light, LightSensor, StepperDriver,
};

/// Simulated continuous-rotation servo; remembers the last throttle.
#[derive(Debug, Default)]
pub struct SimulatedServo {
    throttle: f32,
}

impl SimulatedServo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn throttle(&self) -> f32 {
        self.throttle
    }
}

impl ContinuousServo for SimulatedServo {
    fn set_throttle(&mut self, throttle: f32) -> HwResult<()> {
        tracing::trace!(throttle, "servo throttle (simulated)");
        self.throttle = throttle;
        Ok(())
    }
}

/// Simulated step/direction driver; counts the pulses it was sent.
#[derive(Debug, Default)]
pub struct SimulatedStepper {
    forward: bool,
    steps: u64,
}

impl SimulatedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn forward(&self) -> bool {
        self.forward
    }
}

impl StepperDriver for SimulatedStepper {
    fn set_direction(&mut self, forward: bool) -> HwResult<()> {
        self.forward = forward;
        Ok(())
    }

    fn step(&mut self) -> HwResult<()> {
        self.steps += 1;
        Ok(())
    }
}

/// Simulated lamp.
#[derive(Debug, Default)]
pub struct SimulatedLight {
    on: bool,
}

impl SimulatedLight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Light for SimulatedLight {
    fn set_light(&mut self, on: bool) -> HwResult<()> {
        tracing::debug!(on, "lamp (simulated)");
        self.on = on;
        Ok(())
    }
}

/// Full-scale count of a 16-bit light channel.
const SIM_FULL_SCALE: u32 = u16::MAX as u32;

/// Simulated light sensor.
///
/// Readings follow a sample that clears as it dissociates: each reading is
/// brighter than the last until it plateaus, scaled by the configured gain
/// and clipped at the 16-bit channel limit like the real part.
#[derive(Debug)]
pub struct SimulatedSensor {
    configured: Option<(Gain, IntegrationTime)>,
    base: u32,
    step: u32,
    plateau: u32,
    reads: u32,
    timing_out: bool,
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self {
            configured: None,
            base: 40,
            step: 3,
            plateau: 400,
            reads: 0,
            timing_out: false,
        }
    }
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sensor whose every read times out; exercises error propagation.
    pub fn timing_out() -> Self {
        Self {
            timing_out: true,
            ..Self::default()
        }
    }

    pub fn configured(&self) -> Option<(Gain, IntegrationTime)> {
        self.configured
    }
}

fn gain_multiplier(gain: Gain) -> u32 {
    match gain {
        Gain::Low => 1,
        Gain::Medium => 25,
        Gain::High => 428,
        Gain::Max => 9876,
    }
}

impl LightSensor for SimulatedSensor {
    fn configure(&mut self, gain: Gain, integration: IntegrationTime) -> HwResult<()> {
        tracing::debug!(%gain, %integration, "light sensor configured (simulated)");
        self.configured = Some((gain, integration));
        Ok(())
    }

    fn sample(&mut self) -> HwResult<u32> {
        if self.timing_out {
            return Err(Box::new(HwError::Timeout));
        }
        let Some((gain, integration)) = self.configured else {
            return Err(Box::new(HwError::NotConfigured));
        };
        let level = self
            .base
            .saturating_add(self.step.saturating_mul(self.reads))
            .min(self.plateau);
        self.reads = self.reads.saturating_add(1);
        let windows = (integration.as_millis() / 100) as u32;
        let counts = level
            .saturating_mul(gain_multiplier(gain))
            .saturating_mul(windows)
            .min(SIM_FULL_SCALE);
        tracing::trace!(counts, "light sensor sample (simulated)");
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_sensor_refuses_unconfigured_reads() {
        let mut sensor = SimulatedSensor::new();
        let err = sensor.sample().expect_err("not configured");
        assert!(err.to_string().contains("before configure"));
    }

    #[test]
    fn simulated_sensor_brightens_then_plateaus() {
        let mut sensor = SimulatedSensor::new();
        sensor
            .configure(Gain::Low, IntegrationTime::Ms100)
            .unwrap();
        let first = sensor.sample().unwrap();
        let second = sensor.sample().unwrap();
        assert!(second > first);
        let last = (0..500).map(|_| sensor.sample().unwrap()).last().unwrap();
        assert_eq!(last, 400);
    }

    #[test]
    fn simulated_sensor_clips_at_channel_limit() {
        let mut sensor = SimulatedSensor::new();
        sensor
            .configure(Gain::Max, IntegrationTime::Ms600)
            .unwrap();
        assert_eq!(sensor.sample().unwrap(), SIM_FULL_SCALE);
    }

    #[test]
    fn simulated_stepper_counts_pulses() {
        let mut stepper = SimulatedStepper::new();
        stepper.set_direction(true).unwrap();
        for _ in 0..7 {
            stepper.step().unwrap();
        }
        assert!(stepper.forward());
        assert_eq!(stepper.steps(), 7);
    }

    #[test]
    fn simulated_light_tracks_state() {
        let mut light = SimulatedLight::new();
        light.set_light(true).unwrap();
        assert!(light.is_on());
        light.set_light(false).unwrap();
        assert!(!light.is_on());
    }
}
