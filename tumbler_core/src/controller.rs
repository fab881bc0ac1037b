//! The timed dissociation cycle (`DissociationController`).
//!
//! One call to `step()` performs exactly one phase of the cycle:
//!
//! - `Settling`: wait out what is left of the settle window.
//! - `Illuminating`: lamp on, wait `lamp_time`.
//! - `Measuring`: one reading, lamp off, full rewrite of the output file, then
//!   the stop predicate.
//! - `Tumbling`: one flip per call until the block of `num_tumbles` flips is
//!   done. Cancellation is polled before each flip and nowhere else.

use std::sync::Arc;
use std::time::Instant;

use eyre::WrapErr;
use tumbler_traits::{ChamberActuator, Clock, Light, LightSensor};

use crate::cancel::CancelToken;
use crate::config::CycleCfg;
use crate::cycle::{CycleState, Orientation};
use crate::error::Result;
use crate::hw_error::hw_report;
use crate::recorder::{DataRecorder, Sample, SampleSeries};
use crate::status::CycleStatus;

/// Decides after each persisted reading whether the run is finished.
pub type StopPredicate = Box<dyn FnMut(&SampleSeries) -> bool>;

pub struct DissociationController<A: ChamberActuator, L: Light, S: LightSensor> {
    pub(crate) actuator: A,
    pub(crate) light: L,
    pub(crate) sensor: S,
    pub(crate) cycle: CycleCfg,
    pub(crate) recorder: DataRecorder,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) cancel: Option<CancelToken>,
    pub(crate) stop_when: Option<StopPredicate>,
    pub(crate) state: CycleState,
    pub(crate) orientation: Orientation,
    pub(crate) num_tumbles: u32,
    pub(crate) epoch: Instant,
}

impl<A: ChamberActuator, L: Light, S: LightSensor> core::fmt::Debug
    for DissociationController<A, L, S>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DissociationController")
            .field("state", &self.state)
            .field("orientation", &self.orientation)
            .field("num_tumbles", &self.num_tumbles)
            .field("samples", &self.recorder.series().len())
            .field("output", &self.recorder.path())
            .finish()
    }
}

impl<A: ChamberActuator, L: Light, S: LightSensor> DissociationController<A, L, S> {
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn series(&self) -> &SampleSeries {
        self.recorder.series()
    }

    pub fn num_tumbles(&self) -> u32 {
        self.num_tumbles
    }

    pub fn cycle(&self) -> &CycleCfg {
        &self.cycle
    }

    pub fn output_path(&self) -> &std::path::Path {
        self.recorder.path()
    }

    /// Restart the run clock and go back to the top of the cycle.
    ///
    /// Samples already recorded are kept.
    pub fn begin(&mut self) {
        self.epoch = self.clock.now();
        self.state = CycleState::Settling;
    }

    /// Drive `step()` until the stop predicate fires or cancellation is seen.
    pub fn run(&mut self) -> Result<CycleStatus> {
        self.begin();
        tracing::info!(
            output = %self.recorder.path().display(),
            num_tumbles = self.num_tumbles,
            "dissociation run started"
        );
        loop {
            match self.step()? {
                CycleStatus::Running => {}
                done => {
                    tracing::info!(
                        status = ?done,
                        samples = self.recorder.series().len(),
                        orientation = ?self.orientation,
                        "dissociation run finished"
                    );
                    return Ok(done);
                }
            }
        }
    }

    /// Give up the controller and keep the recorded series.
    pub fn into_series(self) -> SampleSeries {
        self.recorder.into_series()
    }

    /// Perform one phase of the cycle.
    pub fn step(&mut self) -> Result<CycleStatus> {
        match self.state {
            CycleState::Settling => {
                self.clock.sleep(self.cycle.settle_wait());
                self.state = CycleState::Illuminating;
                Ok(CycleStatus::Running)
            }
            CycleState::Illuminating => {
                self.set_light(true)?;
                self.clock.sleep(self.cycle.lamp_time);
                self.state = CycleState::Measuring;
                Ok(CycleStatus::Running)
            }
            CycleState::Measuring => self.measure(),
            CycleState::Tumbling { completed } => self.tumble(completed),
        }
    }

    fn set_light(&mut self, on: bool) -> Result<()> {
        self.light
            .set_light(on)
            .map_err(hw_report)
            .wrap_err(if on { "light on" } else { "light off" })
    }

    fn measure(&mut self) -> Result<CycleStatus> {
        let intensity = match self.sensor.sample() {
            Ok(v) => v,
            Err(e) => {
                if let Err(off) = self.set_light(false) {
                    tracing::warn!(error = %off, "light off failed after sensor error");
                }
                return Err(hw_report(e)).wrap_err("sample light sensor");
            }
        };
        let elapsed_ms = self.clock.ms_since(self.epoch);
        self.set_light(false)?;

        self.recorder.append(Sample {
            elapsed_ms,
            intensity,
        })?;
        tracing::info!(
            sample = self.recorder.series().len(),
            elapsed_ms,
            intensity,
            "sample recorded"
        );

        self.state = CycleState::Tumbling { completed: 0 };
        let stop = match self.stop_when.as_mut() {
            Some(f) => f(self.recorder.series()),
            None => false,
        };
        if stop {
            return Ok(CycleStatus::Stopped);
        }
        Ok(CycleStatus::Running)
    }

    fn tumble(&mut self, completed: u32) -> Result<CycleStatus> {
        if completed >= self.num_tumbles {
            self.state = CycleState::Settling;
            return Ok(CycleStatus::Running);
        }
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            tracing::info!(completed, "cancellation observed before tumble");
            return Ok(CycleStatus::Cancelled);
        }

        let started = self.clock.now();
        let forward = self.orientation.next_flip();
        self.actuator
            .flip(forward)
            .map_err(hw_report)
            .wrap_err("flip chamber")?;
        self.orientation = Orientation::after_flip(forward);
        tracing::debug!(
            flip = completed + 1,
            of = self.num_tumbles,
            forward,
            "tumble"
        );
        self.clock.sleep_until(started + self.cycle.tumble_time);

        self.state = CycleState::Tumbling {
            completed: completed + 1,
        };
        Ok(CycleStatus::Running)
    }
}
