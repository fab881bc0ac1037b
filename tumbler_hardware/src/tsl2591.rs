use rppal::i2c::I2c;
use tracing::trace;
use tumbler_traits::{Gain, HwResult, IntegrationTime, LightSensor};

use crate::error::{HwError, Result};

const COMMAND_BIT: u8 = 0xA0;
const REG_ENABLE: u8 = 0x00;
const REG_CONTROL: u8 = 0x01;
const REG_ID: u8 = 0x12;
const REG_C0_DATAL: u8 = 0x14;
const REG_C1_DATAL: u8 = 0x16;

const ENABLE_POWERON: u8 = 0x01;
const ENABLE_AEN: u8 = 0x02;
const DEVICE_ID: u8 = 0x50;

/// TSL2591 ambient light sensor on an I2C bus.
///
/// Reports visible light as full-spectrum minus infrared counts.
pub struct Tsl2591 {
    i2c: I2c,
}

fn i2c_err(e: rppal::i2c::Error) -> HwError {
    HwError::I2c(e.to_string())
}

impl Tsl2591 {
    pub fn new(bus: u8, address: u16) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(i2c_err)?;
        i2c.set_slave_address(address).map_err(i2c_err)?;
        let id = i2c
            .smbus_read_byte(COMMAND_BIT | REG_ID)
            .map_err(i2c_err)?;
        if id != DEVICE_ID {
            return Err(HwError::I2c(format!(
                "unexpected device id {id:#04x} at {address:#04x}"
            )));
        }
        i2c.smbus_write_byte(COMMAND_BIT | REG_ENABLE, ENABLE_POWERON | ENABLE_AEN)
            .map_err(i2c_err)?;
        Ok(Self { i2c })
    }

    fn gain_bits(gain: Gain) -> u8 {
        match gain {
            Gain::Low => 0x00,
            Gain::Medium => 0x10,
            Gain::High => 0x20,
            Gain::Max => 0x30,
        }
    }

    fn atime_bits(integration: IntegrationTime) -> u8 {
        // ATIME is (ms / 100) - 1
        (integration.as_millis() / 100 - 1) as u8
    }

    fn read_channels(&mut self) -> Result<(u16, u16)> {
        let full = self
            .i2c
            .smbus_read_word(COMMAND_BIT | REG_C0_DATAL)
            .map_err(i2c_err)?;
        let ir = self
            .i2c
            .smbus_read_word(COMMAND_BIT | REG_C1_DATAL)
            .map_err(i2c_err)?;
        Ok((full, ir))
    }
}

impl LightSensor for Tsl2591 {
    fn configure(&mut self, gain: Gain, integration: IntegrationTime) -> HwResult<()> {
        let control = Self::gain_bits(gain) | Self::atime_bits(integration);
        self.i2c
            .smbus_write_byte(COMMAND_BIT | REG_CONTROL, control)
            .map_err(i2c_err)?;
        trace!(control, "tsl2591 control written");
        Ok(())
    }

    fn sample(&mut self) -> HwResult<u32> {
        let (full, ir) = self.read_channels()?;
        let visible = u32::from(full.saturating_sub(ir));
        trace!(full, ir, visible, "tsl2591 raw read");
        Ok(visible)
    }
}
