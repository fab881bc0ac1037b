//! Instrument assembly: config mapping, backend selection and the run clock.
//!
//! Without the `hardware` feature every collaborator is simulated. Two
//! environment switches shape the simulation for tests and demos:
//! `TUMBLER_SIM_FAST=1` runs on a virtual clock so waits return immediately,
//! and `TUMBLER_TEST_SIM_TIMEOUT=1` makes every sensor read time out.

use std::sync::Arc;

use tumbler_core::{Instrument, StepActuator, ThrottleActuator};
use tumbler_traits::clock::test_clock::TestClock;
use tumbler_traits::{ChamberActuator, Clock, Light, LightSensor, MonotonicClock};

pub type DynInstrument = Instrument<Box<dyn ChamberActuator>, Box<dyn Light>, Box<dyn LightSensor>>;

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// The clock every wait of this invocation goes through.
pub fn make_clock() -> Arc<dyn Clock + Send + Sync> {
    if env_flag("TUMBLER_SIM_FAST") {
        tracing::info!("simulated fast clock");
        Arc::new(TestClock::new())
    } else {
        Arc::new(MonotonicClock::new())
    }
}

#[cfg(not(feature = "hardware"))]
pub fn build_actuator(
    motion: &tumbler_config::MotionCfg,
    clock: Arc<dyn Clock + Send + Sync>,
) -> eyre::Result<Box<dyn ChamberActuator>> {
    use tumbler_core::MotionCfg;
    use tumbler_hardware::{SimulatedServo, SimulatedStepper};

    let actuator: Box<dyn ChamberActuator> = match MotionCfg::from(motion) {
        MotionCfg::Throttle(t) => Box::new(ThrottleActuator::new(SimulatedServo::new(), t, clock)),
        MotionCfg::Stepper(s) => Box::new(StepActuator::new(SimulatedStepper::new(), s, clock)),
    };
    Ok(actuator)
}

#[cfg(feature = "hardware")]
pub fn build_actuator(
    motion: &tumbler_config::MotionCfg,
    clock: Arc<dyn Clock + Send + Sync>,
) -> eyre::Result<Box<dyn ChamberActuator>> {
    use eyre::WrapErr;
    use tumbler_hardware::gpio::{GpioStepper, PwmServo};

    let actuator: Box<dyn ChamberActuator> = match motion {
        tumbler_config::MotionCfg::Throttle(m) => {
            let servo = PwmServo::new(m.servo_pin).wrap_err("open servo")?;
            Box::new(ThrottleActuator::new(servo, m.into(), clock))
        }
        tumbler_config::MotionCfg::Stepper(m) => {
            let driver = GpioStepper::new(m.step_pin, m.dir_pin, m.enable_pin)
                .wrap_err("open stepper pins")?;
            Box::new(StepActuator::new(driver, m.into(), clock))
        }
    };
    Ok(actuator)
}

#[cfg(not(feature = "hardware"))]
pub fn build_instrument(
    cfg: &tumbler_config::Config,
    clock: Arc<dyn Clock + Send + Sync>,
) -> eyre::Result<DynInstrument> {
    use tumbler_hardware::{SimulatedLight, SimulatedSensor};

    let sensor = if env_flag("TUMBLER_TEST_SIM_TIMEOUT") {
        SimulatedSensor::timing_out()
    } else {
        SimulatedSensor::new()
    };
    tracing::info!(backend = backend_name(&cfg.motion), "using simulated instrument");
    Ok(Instrument {
        actuator: build_actuator(&cfg.motion, clock)?,
        light: Box::new(SimulatedLight::new()),
        sensor: Box::new(sensor),
    })
}

#[cfg(feature = "hardware")]
pub fn build_instrument(
    cfg: &tumbler_config::Config,
    clock: Arc<dyn Clock + Send + Sync>,
) -> eyre::Result<DynInstrument> {
    use eyre::WrapErr;
    use tumbler_hardware::gpio::GpioLight;
    use tumbler_hardware::tsl2591::Tsl2591;

    let light = GpioLight::new(cfg.light.pin, cfg.light.active_low).wrap_err("open lamp pin")?;
    let sensor = Tsl2591::new(cfg.sensor.i2c_bus, cfg.sensor.address).wrap_err("open light sensor")?;
    tracing::info!(
        backend = backend_name(&cfg.motion),
        i2c_bus = cfg.sensor.i2c_bus,
        address = cfg.sensor.address,
        "using hardware instrument"
    );
    Ok(Instrument {
        actuator: build_actuator(&cfg.motion, clock)?,
        light: Box::new(light),
        sensor: Box::new(sensor),
    })
}

pub fn backend_name(motion: &tumbler_config::MotionCfg) -> &'static str {
    match motion {
        tumbler_config::MotionCfg::Throttle(_) => "throttle",
        tumbler_config::MotionCfg::Stepper(_) => "stepper",
    }
}
