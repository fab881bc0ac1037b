pub mod clock;
pub mod sensor;

pub use clock::{Clock, MonotonicClock};
pub use sensor::{Gain, IntegrationTime};

pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Moves the sample chamber from one end orientation to the other.
///
/// Motion is open-loop: a successful return only means the command sequence
/// was issued, not that the chamber reached the end stop. Implementations
/// block for the full duration of the motion.
pub trait ChamberActuator {
    fn flip(&mut self, forward: bool) -> HwResult<()>;
}

/// On/off light source used to illuminate the chamber for a reading.
pub trait Light {
    fn set_light(&mut self, on: bool) -> HwResult<()>;
}

/// Ambient light sensor used for turbidity readings.
///
/// Callers must wait for the integration window to stabilize after
/// `configure` before the first `sample`.
pub trait LightSensor {
    fn configure(&mut self, gain: Gain, integration: IntegrationTime) -> HwResult<()>;
    /// One raw intensity reading in sensor-native counts.
    fn sample(&mut self) -> HwResult<u32>;
}

/// Continuous-rotation servo driven by a signed throttle in `[-1.0, 1.0]`.
pub trait ContinuousServo {
    fn set_throttle(&mut self, throttle: f32) -> HwResult<()>;
}

/// Step/direction stepper driver.
pub trait StepperDriver {
    fn set_direction(&mut self, forward: bool) -> HwResult<()>;
    /// Emit a single step pulse.
    fn step(&mut self) -> HwResult<()>;
}

impl<T: ChamberActuator + ?Sized> ChamberActuator for Box<T> {
    fn flip(&mut self, forward: bool) -> HwResult<()> {
        (**self).flip(forward)
    }
}

impl<T: Light + ?Sized> Light for Box<T> {
    fn set_light(&mut self, on: bool) -> HwResult<()> {
        (**self).set_light(on)
    }
}

impl<T: LightSensor + ?Sized> LightSensor for Box<T> {
    fn configure(&mut self, gain: Gain, integration: IntegrationTime) -> HwResult<()> {
        (**self).configure(gain, integration)
    }
    fn sample(&mut self) -> HwResult<u32> {
        (**self).sample()
    }
}

impl<T: ContinuousServo + ?Sized> ContinuousServo for Box<T> {
    fn set_throttle(&mut self, throttle: f32) -> HwResult<()> {
        (**self).set_throttle(throttle)
    }
}

impl<T: StepperDriver + ?Sized> StepperDriver for Box<T> {
    fn set_direction(&mut self, forward: bool) -> HwResult<()> {
        (**self).set_direction(forward)
    }
    fn step(&mut self) -> HwResult<()> {
        (**self).step()
    }
}
