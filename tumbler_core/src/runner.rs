//! Entry points the binary calls: the dissociation run, the self-test,
//! positioning, the manual session and the single-shot measurement.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::WrapErr;
use tumbler_traits::{ChamberActuator, Clock, Light, LightSensor};

use crate::cancel::CancelToken;
use crate::config::{CycleCfg, SensorCalibration};
use crate::controller::{DissociationController, StopPredicate};
use crate::cycle::Orientation;
use crate::error::{DissociationError, Result};
use crate::hw_error::hw_report;
use crate::manual::{LabelSource, ManualReadController};
use crate::recorder::{
    DataRecorder, LabeledSeries, Sample, SampleSeries, write_labeled, write_series,
};
use crate::sensor::configure_sensor;
use crate::status::CycleStatus;

/// The three hardware collaborators of one instrument.
pub struct Instrument<A, L, S> {
    pub actuator: A,
    pub light: L,
    pub sensor: S,
}

/// Parameters of one dissociation run.
pub struct RunParams {
    pub cycle: CycleCfg,
    pub calibration: SensorCalibration,
    pub output: PathBuf,
    pub cancel: Option<CancelToken>,
    pub stop_when: Option<StopPredicate>,
}

/// Outcome of `run_dissociation_cycle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: CycleStatus,
    pub series: SampleSeries,
    pub orientation: Orientation,
}

/// Run the timed cycle until cancelled or stopped.
pub fn run_dissociation_cycle<A, L, S>(
    instrument: Instrument<A, L, S>,
    params: RunParams,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Result<RunReport>
where
    A: ChamberActuator,
    L: Light,
    S: LightSensor,
{
    let mut builder = DissociationController::builder()
        .with_actuator(instrument.actuator)
        .with_light(instrument.light)
        .with_sensor(instrument.sensor)
        .with_recorder(DataRecorder::new(params.output))
        .with_cycle(params.cycle)
        .with_calibration(params.calibration)
        .with_clock(clock);
    if let Some(token) = params.cancel {
        builder = builder.with_cancel(token);
    }
    if let Some(stop) = params.stop_when {
        builder = builder.with_stop_when(stop);
    }
    let mut ctrl = builder.try_build()?;
    let status = ctrl.run()?;
    let orientation = ctrl.orientation();
    Ok(RunReport {
        status,
        series: ctrl.into_series(),
        orientation,
    })
}

/// Result of a self-test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfTestReport {
    /// Flips performed, including the anchoring flip.
    pub flips: u32,
    /// One reading taken with the lamp on.
    pub reading: u32,
}

/// Exercise every collaborator once.
///
/// Anchors at the measurement end, performs `rotations` round trips, blinks
/// the lamp, then configures the sensor and takes one illuminated reading.
/// The chamber ends at the measurement end.
pub fn run_self_test<A, L, S>(
    instrument: &mut Instrument<A, L, S>,
    cycle: &CycleCfg,
    calibration: SensorCalibration,
    clock: &dyn Clock,
    rotations: u32,
) -> Result<SelfTestReport>
where
    A: ChamberActuator,
    L: Light,
    S: LightSensor,
{
    let ef = cycle.end_forward;
    let mut flips = 0u32;
    let mut flip = |actuator: &mut A, forward: bool| -> Result<()> {
        actuator
            .flip(forward)
            .map_err(hw_report)
            .wrap_err("self-test flip")?;
        flips += 1;
        tracing::debug!(forward, flips, "self-test flip");
        Ok(())
    };

    flip(&mut instrument.actuator, ef)?;
    for _ in 0..rotations {
        flip(&mut instrument.actuator, !ef)?;
        clock.sleep(cycle.tumble_time);
        flip(&mut instrument.actuator, ef)?;
        clock.sleep(cycle.tumble_time);
    }

    set_light(&mut instrument.light, true)?;
    clock.sleep(cycle.lamp_time);
    set_light(&mut instrument.light, false)?;

    configure_sensor(&mut instrument.sensor, calibration, clock)?;
    let reading = illuminated_sample(instrument, cycle.lamp_time, clock)?;
    tracing::info!(flips, reading, "self-test complete");
    Ok(SelfTestReport { flips, reading })
}

/// Park the chamber at the load end.
pub fn move_to_load_position<A: ChamberActuator + ?Sized>(
    actuator: &mut A,
    end_forward: bool,
) -> Result<Orientation> {
    actuator
        .flip(!end_forward)
        .map_err(hw_report)
        .wrap_err("move to load position")?;
    Ok(Orientation::after_flip(!end_forward))
}

/// Move the chamber to the measurement end, where it is ejected and read.
pub fn move_to_eject_position<A: ChamberActuator + ?Sized>(
    actuator: &mut A,
    end_forward: bool,
) -> Result<Orientation> {
    actuator
        .flip(end_forward)
        .map_err(hw_report)
        .wrap_err("move to eject position")?;
    Ok(Orientation::measurement(end_forward))
}

/// Interactive session; the labeled series is written once at the end.
pub fn run_manual_session<A, L, S>(
    instrument: Instrument<A, L, S>,
    cycle: CycleCfg,
    calibration: SensorCalibration,
    clock: Arc<dyn Clock + Send + Sync>,
    labels: &mut dyn LabelSource,
    output: &Path,
) -> Result<LabeledSeries>
where
    A: ChamberActuator,
    L: Light,
    S: LightSensor,
{
    let mut ctrl = ManualReadController::new(
        instrument.actuator,
        instrument.light,
        instrument.sensor,
        cycle,
        calibration,
        clock,
    )?;
    let series = ctrl.run(labels)?;
    write_labeled(output, &series)?;
    tracing::info!(
        samples = series.len(),
        output = %output.display(),
        "manual session saved"
    );
    Ok(series)
}

/// Take one reading and write it as a one-row series.
///
/// Refuses to touch the hardware if `path` already exists.
pub fn measure_once_to_file<A, L, S>(
    instrument: &mut Instrument<A, L, S>,
    calibration: SensorCalibration,
    lamp_time: std::time::Duration,
    clock: &dyn Clock,
    path: &Path,
) -> Result<Sample>
where
    L: Light,
    S: LightSensor,
{
    if path.exists() {
        return Err(eyre::Report::new(DissociationError::OutputExists(
            path.to_path_buf(),
        )));
    }
    let epoch = clock.now();
    configure_sensor(&mut instrument.sensor, calibration, clock)?;
    let intensity = illuminated_sample(instrument, lamp_time, clock)?;
    let sample = Sample {
        elapsed_ms: clock.ms_since(epoch),
        intensity,
    };
    let series: SampleSeries = std::iter::once(sample).collect();
    write_series(path, &series)?;
    tracing::info!(intensity, output = %path.display(), "single measurement saved");
    Ok(sample)
}

fn set_light<L: Light + ?Sized>(light: &mut L, on: bool) -> Result<()> {
    light
        .set_light(on)
        .map_err(hw_report)
        .wrap_err(if on { "light on" } else { "light off" })
}

/// Lamp on, warm up, sample, lamp off. The lamp is switched off even when the
/// sample fails.
fn illuminated_sample<A, L, S>(
    instrument: &mut Instrument<A, L, S>,
    lamp_time: std::time::Duration,
    clock: &dyn Clock,
) -> Result<u32>
where
    L: Light,
    S: LightSensor,
{
    set_light(&mut instrument.light, true)?;
    clock.sleep(lamp_time);
    let reading = instrument.sensor.sample().map_err(hw_report);
    set_light(&mut instrument.light, false)?;
    reading.wrap_err("sample light sensor")
}
