use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum DissociationError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for light sensor")]
    Timeout,
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),
    #[error("io error: {0}")]
    Io(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing chamber actuator")]
    MissingActuator,
    #[error("missing light")]
    MissingLight,
    #[error("missing light sensor")]
    MissingSensor,
    #[error("missing data recorder")]
    MissingRecorder,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
