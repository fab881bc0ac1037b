//! `From` implementations bridging `tumbler_config` types to `tumbler_core` types.

use std::time::Duration;
use tumbler_traits::{Gain, IntegrationTime};

use crate::config::{CycleCfg, MotionCfg, SensorCalibration, StepCfg, ThrottleCfg};
use crate::util::duration_from_secs;

// ── CycleCfg ─────────────────────────────────────────────────────────────────

impl From<&tumbler_config::TimingCfg> for CycleCfg {
    fn from(c: &tumbler_config::TimingCfg) -> Self {
        Self {
            tumble_time: duration_from_secs(c.tumble_s),
            sample_time: duration_from_secs(c.sample_s),
            settle_time: duration_from_secs(c.settle_s),
            lamp_time: duration_from_secs(c.lamp_s),
            end_forward: c.end_forward,
        }
    }
}

// ── SensorCalibration ────────────────────────────────────────────────────────

// Free function rather than `From`: both types are foreign here (orphan rule).
fn gain_from(g: tumbler_config::SensorGain) -> Gain {
    match g {
        tumbler_config::SensorGain::Low => Gain::Low,
        tumbler_config::SensorGain::Medium => Gain::Medium,
        tumbler_config::SensorGain::High => Gain::High,
        tumbler_config::SensorGain::Max => Gain::Max,
    }
}

impl From<&tumbler_config::SensorCfg> for SensorCalibration {
    /// Unsupported integration times fall back to the default window; `validate`
    /// rejects them before this point.
    fn from(c: &tumbler_config::SensorCfg) -> Self {
        Self {
            gain: gain_from(c.gain),
            integration: IntegrationTime::from_millis(c.integration_ms).unwrap_or_default(),
        }
    }
}

// ── MotionCfg ────────────────────────────────────────────────────────────────

impl From<&tumbler_config::ThrottleMotion> for ThrottleCfg {
    fn from(c: &tumbler_config::ThrottleMotion) -> Self {
        Self {
            forward: c.forward_throttle,
            reverse: c.reverse_throttle,
            stop: c.stop_throttle,
            flip_time: Duration::from_millis(c.flip_ms),
        }
    }
}

impl From<&tumbler_config::StepperMotion> for StepCfg {
    fn from(c: &tumbler_config::StepperMotion) -> Self {
        Self {
            flip_steps: c.flip_steps,
            step_delay: Duration::from_micros(c.step_delay_us),
        }
    }
}

impl From<&tumbler_config::MotionCfg> for MotionCfg {
    fn from(c: &tumbler_config::MotionCfg) -> Self {
        match c {
            tumbler_config::MotionCfg::Throttle(t) => MotionCfg::Throttle(t.into()),
            tumbler_config::MotionCfg::Stepper(s) => MotionCfg::Stepper(s.into()),
        }
    }
}
