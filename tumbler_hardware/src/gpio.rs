//! GPIO-backed lamp, stepper, and servo drivers.
use rppal::gpio::{Gpio, OutputPin};
use std::thread::sleep;
use std::time::Duration;
use tumbler_traits::{ContinuousServo, HwResult, Light, StepperDriver};

use crate::error::{HwError, Result};

fn output_pin(gpio: &Gpio, pin: u8) -> Result<OutputPin> {
    gpio.get(pin)
        .map(|p| p.into_output_low())
        .map_err(|e| HwError::Gpio(format!("open pin {pin}: {e}")))
}

fn open_gpio() -> Result<Gpio> {
    Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))
}

pub struct GpioLight {
    pin: OutputPin,
    active_low: bool,
}

impl GpioLight {
    pub fn new(pin: u8, active_low: bool) -> Result<Self> {
        let gpio = open_gpio()?;
        let mut pin = output_pin(&gpio, pin)?;
        // Start with the lamp off.
        if active_low {
            pin.set_high();
        }
        Ok(Self { pin, active_low })
    }
}

impl Light for GpioLight {
    fn set_light(&mut self, on: bool) -> HwResult<()> {
        if on != self.active_low {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
        Ok(())
    }
}

/// Width of the STEP pulse; drivers need at least ~2us.
const STEP_PULSE: Duration = Duration::from_micros(10);

pub struct GpioStepper {
    step: OutputPin,
    dir: OutputPin,
    // Held low (driver enabled) for the lifetime of the stepper.
    _enable: Option<OutputPin>,
}

impl GpioStepper {
    pub fn new(step_pin: u8, dir_pin: u8, enable_pin: Option<u8>) -> Result<Self> {
        let gpio = open_gpio()?;
        let step = output_pin(&gpio, step_pin)?;
        let dir = output_pin(&gpio, dir_pin)?;
        let enable = enable_pin.map(|p| output_pin(&gpio, p)).transpose()?;
        Ok(Self {
            step,
            dir,
            _enable: enable,
        })
    }
}

impl StepperDriver for GpioStepper {
    fn set_direction(&mut self, forward: bool) -> HwResult<()> {
        if forward {
            self.dir.set_high();
        } else {
            self.dir.set_low();
        }
        Ok(())
    }

    fn step(&mut self) -> HwResult<()> {
        self.step.set_high();
        sleep(STEP_PULSE);
        self.step.set_low();
        Ok(())
    }
}

/// Standard servo frame: 50 Hz.
const SERVO_PERIOD: Duration = Duration::from_millis(20);
/// Pulse width at zero throttle.
const SERVO_CENTER_PULSE_US: f32 = 1500.0;
/// Pulse width swing from center to full throttle.
const SERVO_SPAN_US: f32 = 500.0;

/// Continuous-rotation servo on a software-PWM GPIO pin.
pub struct PwmServo {
    pin: OutputPin,
}

impl PwmServo {
    pub fn new(pin: u8) -> Result<Self> {
        let gpio = open_gpio()?;
        let pin = output_pin(&gpio, pin)?;
        Ok(Self { pin })
    }

    fn pulse_for(throttle: f32) -> Duration {
        let t = throttle.clamp(-1.0, 1.0);
        let us = SERVO_CENTER_PULSE_US + t * SERVO_SPAN_US;
        Duration::from_micros(us.round() as u64)
    }
}

impl ContinuousServo for PwmServo {
    fn set_throttle(&mut self, throttle: f32) -> HwResult<()> {
        let pulse = Self::pulse_for(throttle);
        tracing::trace!(throttle, pulse_us = u64::try_from(pulse.as_micros()).unwrap_or(u64::MAX), "servo pulse");
        self.pin
            .set_pwm(SERVO_PERIOD, pulse)
            .map_err(|e| HwError::Gpio(format!("servo pwm: {e}")))?;
        Ok(())
    }
}

impl Drop for PwmServo {
    fn drop(&mut self) {
        let _ = self.pin.clear_pwm();
    }
}
