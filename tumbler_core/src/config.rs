//! Configuration types for the dissociation controller.
//!
//! These are the runtime configuration structs used by the controller and the
//! actuator variants. They are separate from the TOML-deserialized config in
//! `tumbler_config`; see `conversions` for the bridge.

use std::time::Duration;
use tumbler_traits::{Gain, IntegrationTime};

use crate::cycle::num_tumbles;

/// Cycle timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleCfg {
    /// Period of one tumble: the flip plus the dwell after it.
    pub tumble_time: Duration,
    /// Interval between measurements, spent tumbling.
    pub sample_time: Duration,
    /// Settle window before each reading.
    pub settle_time: Duration,
    /// Lamp warm-up between light on and the reading.
    pub lamp_time: Duration,
    /// Whether `flip(true)` ends in the measurement orientation.
    pub end_forward: bool,
}

impl Default for CycleCfg {
    fn default() -> Self {
        Self {
            tumble_time: Duration::from_secs(3),
            sample_time: Duration::from_secs(300),
            settle_time: Duration::from_secs(10),
            lamp_time: Duration::from_secs(2),
            end_forward: true,
        }
    }
}

impl CycleCfg {
    /// Flips per tumble block; always even.
    pub fn num_tumbles(&self) -> u32 {
        num_tumbles(self.sample_time, self.tumble_time)
    }

    /// Wait at the top of each cycle.
    ///
    /// The last tumble already dwelt for `tumble_time` with the chamber at
    /// rest, so only the remainder of the settle window is waited here.
    /// Saturates at zero when `settle_time < tumble_time`.
    pub fn settle_wait(&self) -> Duration {
        self.settle_time.saturating_sub(self.tumble_time)
    }
}

/// Light sensor calibration applied before sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SensorCalibration {
    pub gain: Gain,
    pub integration: IntegrationTime,
}

/// Pulse-throttle motion parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleCfg {
    pub forward: f32,
    pub reverse: f32,
    pub stop: f32,
    /// How long the throttle is held for one flip.
    pub flip_time: Duration,
}

impl Default for ThrottleCfg {
    fn default() -> Self {
        Self {
            forward: 1.0,
            reverse: -1.0,
            stop: 0.0,
            flip_time: Duration::from_millis(600),
        }
    }
}

/// Step-count motion parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCfg {
    pub flip_steps: u32,
    pub step_delay: Duration,
}

impl Default for StepCfg {
    fn default() -> Self {
        Self {
            flip_steps: 100,
            step_delay: Duration::from_millis(2),
        }
    }
}

/// Motion backend parameters, chosen at composition time.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCfg {
    Throttle(ThrottleCfg),
    Stepper(StepCfg),
}
