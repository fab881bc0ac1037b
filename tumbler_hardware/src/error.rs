use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("light sensor timeout")]
    Timeout,
    #[error("light sensor sampled before configure")]
    NotConfigured,
}

pub type Result<T> = std::result::Result<T, HwError>;
