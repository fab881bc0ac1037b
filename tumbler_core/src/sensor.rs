use eyre::WrapErr;
use std::time::Duration;
use tumbler_traits::{Clock, LightSensor};

use crate::config::SensorCalibration;
use crate::error::Result;
use crate::hw_error::hw_report;

/// Delay after a calibration change before the first reading is valid.
pub const SENSOR_SETTLE: Duration = Duration::from_secs(1);

/// Apply gain and integration time, then wait out `SENSOR_SETTLE`.
///
/// Every path in this crate that configures the sensor goes through here, so
/// callers never sample inside the settle window.
pub fn configure_sensor<S: LightSensor + ?Sized>(
    sensor: &mut S,
    calibration: SensorCalibration,
    clock: &dyn Clock,
) -> Result<()> {
    sensor
        .configure(calibration.gain, calibration.integration)
        .map_err(hw_report)
        .wrap_err("configure light sensor")?;
    tracing::debug!(
        gain = %calibration.gain,
        integration = %calibration.integration,
        "light sensor configured"
    );
    clock.sleep(SENSOR_SETTLE);
    Ok(())
}
