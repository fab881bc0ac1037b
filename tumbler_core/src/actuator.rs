//! The two chamber motion variants behind `ChamberActuator`.
//!
//! Both are open-loop and block the caller for the whole motion. The
//! controller only sees the trait; which variant runs is decided when the
//! instrument is assembled.

use std::sync::Arc;
use tumbler_traits::{ChamberActuator, Clock, ContinuousServo, HwResult, StepperDriver};

use crate::config::{StepCfg, ThrottleCfg};

/// Flips by driving a continuous-rotation servo for a fixed time.
pub struct ThrottleActuator<S: ContinuousServo> {
    servo: S,
    cfg: ThrottleCfg,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<S: ContinuousServo> ThrottleActuator<S> {
    pub fn new(servo: S, cfg: ThrottleCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { servo, cfg, clock }
    }

    pub fn servo(&self) -> &S {
        &self.servo
    }
}

impl<S: ContinuousServo> ChamberActuator for ThrottleActuator<S> {
    fn flip(&mut self, forward: bool) -> HwResult<()> {
        let throttle = if forward {
            self.cfg.forward
        } else {
            self.cfg.reverse
        };
        tracing::trace!(forward, throttle, "throttle flip");
        self.servo.set_throttle(throttle)?;
        self.clock.sleep(self.cfg.flip_time);
        self.servo.set_throttle(self.cfg.stop)
    }
}

/// Flips by emitting a fixed number of stepper pulses.
pub struct StepActuator<D: StepperDriver> {
    driver: D,
    cfg: StepCfg,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl<D: StepperDriver> StepActuator<D> {
    pub fn new(driver: D, cfg: StepCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { driver, cfg, clock }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: StepperDriver> ChamberActuator for StepActuator<D> {
    fn flip(&mut self, forward: bool) -> HwResult<()> {
        tracing::trace!(forward, steps = self.cfg.flip_steps, "stepper flip");
        self.driver.set_direction(forward)?;
        for _ in 0..self.cfg.flip_steps {
            self.driver.step()?;
            self.clock.sleep(self.cfg.step_delay);
        }
        Ok(())
    }
}
