#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the tumbling chamber instrument.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Durations are written in seconds (`*_s`) or milliseconds (`*_ms`/`*_us`)
//!   as the field name says.
//! - `OutputCfg::resolve_datafile` turns the configured prefix into the
//!   concrete CSV path for a run.
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Chamber motion backend. Selected by `backend = "throttle" | "stepper"`.
#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum MotionCfg {
    Throttle(ThrottleMotion),
    Stepper(StepperMotion),
}

/// Continuous-rotation servo driven for a fixed time per flip.
#[derive(Debug, Deserialize, Clone)]
pub struct ThrottleMotion {
    pub servo_pin: u8,
    #[serde(default = "default_forward_throttle")]
    pub forward_throttle: f32,
    #[serde(default = "default_reverse_throttle")]
    pub reverse_throttle: f32,
    /// Throttle that holds the servo still; trim it if the servo creeps at 0.0.
    #[serde(default)]
    pub stop_throttle: f32,
    /// How long the throttle is applied for one flip.
    pub flip_ms: u64,
}

fn default_forward_throttle() -> f32 {
    1.0
}

fn default_reverse_throttle() -> f32 {
    -1.0
}

/// Stepper motor driven for a fixed number of steps per flip.
#[derive(Debug, Deserialize, Clone)]
pub struct StepperMotion {
    pub step_pin: u8,
    pub dir_pin: u8,
    pub enable_pin: Option<u8>,
    pub flip_steps: u32,
    #[serde(default = "default_step_delay_us")]
    pub step_delay_us: u64,
}

fn default_step_delay_us() -> u64 {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LightCfg {
    pub pin: u8,
    /// Drive the pin low to switch the lamp on.
    #[serde(default)]
    pub active_low: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensorGain {
    Low,
    Medium,
    High,
    Max,
}

/// Light sensor bus and calibration. `gain` and `integration_ms` are required.
#[derive(Debug, Deserialize, Clone)]
pub struct SensorCfg {
    #[serde(default = "default_i2c_bus")]
    pub i2c_bus: u8,
    #[serde(default = "default_sensor_address")]
    pub address: u16,
    pub gain: SensorGain,
    /// One of 100, 200, 300, 400, 500, 600.
    pub integration_ms: u64,
}

fn default_i2c_bus() -> u8 {
    1
}

fn default_sensor_address() -> u16 {
    0x29
}

pub const INTEGRATION_MS_CHOICES: [u64; 6] = [100, 200, 300, 400, 500, 600];

/// Cycle timing, in seconds.
#[derive(Debug, Deserialize, Clone)]
pub struct TimingCfg {
    /// Period of one tumble (one flip plus the dwell after it).
    pub tumble_s: f64,
    /// Interval between measurements, spent tumbling.
    pub sample_s: f64,
    /// Time the contents are left to settle before a reading.
    pub settle_s: f64,
    /// Lamp warm-up before the reading is taken.
    pub lamp_s: f64,
    /// Whether forward motion ends in the measurement orientation.
    pub end_forward: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputCfg {
    /// Output CSV path, or a prefix when `timestamp` is set.
    pub datafile: String,
    /// Append `-YYYYmmdd-HHMMSS.csv` to `datafile`.
    #[serde(default)]
    pub timestamp: bool,
    /// Reserved. Parsed but not honored; runs stop only on cancellation.
    #[serde(default)]
    pub stopcondition: Option<String>,
}

impl OutputCfg {
    /// Concrete path for a run started at `started`.
    pub fn resolve_datafile<Tz>(&self, started: &chrono::DateTime<Tz>) -> PathBuf
    where
        Tz: chrono::TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if self.timestamp {
            let stamp = started.format("%Y%m%d-%H%M%S");
            PathBuf::from(format!("{}-{stamp}.csv", self.datafile))
        } else {
            PathBuf::from(&self.datafile)
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub motion: MotionCfg,
    pub light: LightCfg,
    pub sensor: SensorCfg,
    pub timing: TimingCfg,
    pub output: OutputCfg,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse, and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration: {e}"))?;
    cfg.validate()?;
    Ok(cfg)
}

fn check_seconds(name: &str, v: f64) -> eyre::Result<()> {
    if !v.is_finite() || v < 0.0 {
        eyre::bail!("{name} must be a finite number >= 0");
    }
    if v > 7.0 * 24.0 * 3600.0 {
        eyre::bail!("{name} is unreasonably large (>7 days)");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Motion
        match &self.motion {
            MotionCfg::Throttle(t) => {
                for (name, v) in [
                    ("motion.forward_throttle", t.forward_throttle),
                    ("motion.reverse_throttle", t.reverse_throttle),
                    ("motion.stop_throttle", t.stop_throttle),
                ] {
                    if !v.is_finite() || !(-1.0..=1.0).contains(&v) {
                        eyre::bail!("{name} must be in [-1.0, 1.0]");
                    }
                }
                if t.flip_ms == 0 {
                    eyre::bail!("motion.flip_ms must be >= 1");
                }
            }
            MotionCfg::Stepper(s) => {
                if s.flip_steps == 0 {
                    eyre::bail!("motion.flip_steps must be >= 1");
                }
                if s.step_pin == s.dir_pin {
                    eyre::bail!("motion.step_pin and motion.dir_pin must differ");
                }
            }
        }

        // Sensor
        if !INTEGRATION_MS_CHOICES.contains(&self.sensor.integration_ms) {
            eyre::bail!(
                "sensor.integration_ms must be one of 100, 200, 300, 400, 500, 600 (got {})",
                self.sensor.integration_ms
            );
        }
        if self.sensor.address > 0x7f {
            eyre::bail!("sensor.address must be a 7-bit I2C address");
        }

        // Timing
        let t = &self.timing;
        check_seconds("timing.tumble_s", t.tumble_s)?;
        check_seconds("timing.sample_s", t.sample_s)?;
        check_seconds("timing.settle_s", t.settle_s)?;
        check_seconds("timing.lamp_s", t.lamp_s)?;
        if t.tumble_s < 0.001 {
            eyre::bail!("timing.tumble_s must be > 0");
        }
        if t.sample_s < 0.001 {
            eyre::bail!("timing.sample_s must be > 0");
        }

        // Output
        if self.output.datafile.trim().is_empty() {
            eyre::bail!("output.datafile must not be empty");
        }

        Ok(())
    }

    /// Non-fatal findings worth logging at startup.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.timing.settle_s < self.timing.tumble_s {
            out.push(format!(
                "timing.settle_s ({}) is shorter than timing.tumble_s ({}); settle wait will be zero",
                self.timing.settle_s, self.timing.tumble_s
            ));
        }
        if self.output.stopcondition.is_some() {
            out.push("output.stopcondition is reserved and ignored".to_string());
        }
        out
    }
}
