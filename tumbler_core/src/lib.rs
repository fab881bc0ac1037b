#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Timed dissociation cycle (hardware-agnostic).
//!
//! All hardware goes through the `tumbler_traits` capability traits, and every
//! wait goes through `tumbler_traits::Clock`, so the whole cycle runs against
//! spies and a virtual clock in tests.
//!
//! ## Architecture
//!
//! - **Actuators**: throttle and stepper variants behind `ChamberActuator` (`actuator`)
//! - **Configuration**: runtime timing, calibration and motion structs (`config`)
//! - **Cycle**: tumble arithmetic, `Orientation` and `CycleState` (`cycle`)
//! - **Controller**: the settle/illuminate/measure/tumble state machine (`controller`, `builder`)
//! - **Persistence**: series types and atomic CSV rewrite (`recorder`, `atomic`)
//! - **Cancellation**: `Canceller`/`CancelToken` pair (`cancel`)
//! - **Entry points**: run, self-test, positioning, manual session, single shot (`runner`)

pub mod actuator;
pub mod atomic;
pub mod builder;
pub mod cancel;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod cycle;
pub mod error;
pub mod hw_error;
pub mod manual;
pub mod mocks;
pub mod recorder;
pub mod runner;
pub mod sensor;
pub mod status;
pub mod util;

pub use actuator::{StepActuator, ThrottleActuator};
pub use builder::ControllerBuilder;
pub use cancel::{CancelToken, Canceller, cancel_pair};
pub use config::{CycleCfg, MotionCfg, SensorCalibration, StepCfg, ThrottleCfg};
pub use controller::{DissociationController, StopPredicate};
pub use cycle::{CycleState, Orientation, num_tumbles};
pub use error::{BuildError, DissociationError, Report, Result};
pub use hw_error::map_hw_error;
pub use manual::{LabelSource, ManualReadController};
pub use recorder::{
    DataRecorder, LabeledSample, LabeledSeries, Sample, SampleSeries, read_labeled, read_series,
    write_labeled, write_series,
};
pub use runner::{
    Instrument, RunParams, RunReport, SelfTestReport, measure_once_to_file,
    move_to_eject_position, move_to_load_position, run_dissociation_cycle, run_manual_session,
    run_self_test,
};
pub use sensor::{SENSOR_SETTLE, configure_sensor};
pub use status::CycleStatus;
