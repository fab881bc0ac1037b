//! Subcommand handlers: config mapping, hardware assembly and result output.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::WrapErr;
use serde_json::json;
use tumbler_config::Config;
use tumbler_core::{
    CycleCfg, CycleStatus, DissociationError, Orientation, RunParams, SampleSeries,
    SensorCalibration, cancel_pair,
};
use tumbler_traits::{Clock, Light, LightSensor};

use crate::hw::{DynInstrument, build_instrument};

/// Everything a handler needs from the invocation.
pub struct Ctx {
    pub cfg: Config,
    pub json: bool,
    pub clock: Arc<dyn Clock + Send + Sync>,
}

impl Ctx {
    fn cycle(&self) -> CycleCfg {
        (&self.cfg.timing).into()
    }

    fn calibration(&self) -> SensorCalibration {
        (&self.cfg.sensor).into()
    }

    fn instrument(&self) -> eyre::Result<DynInstrument> {
        build_instrument(&self.cfg, self.clock.clone())
    }

    /// Print a result line: JSON object in `--json` mode, text otherwise.
    fn emit(&self, text: &str, value: serde_json::Value) {
        if self.json {
            println!("{value}");
        } else {
            println!("{text}");
        }
    }
}

pub fn orientation_name(o: Orientation) -> &'static str {
    match o {
        Orientation::Forward => "forward",
        Orientation::Reverse => "reverse",
    }
}

pub fn status_name(s: CycleStatus) -> &'static str {
    match s {
        CycleStatus::Running => "running",
        CycleStatus::Stopped => "stopped",
        CycleStatus::Cancelled => "cancelled",
    }
}

fn ensure_parent_dir(path: &Path) -> eyre::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("create output directory {}", parent.display()))?;
    }
    Ok(())
}

fn refuse_existing(path: &Path) -> eyre::Result<()> {
    if path.exists() {
        return Err(eyre::Report::new(DissociationError::OutputExists(
            path.to_path_buf(),
        )));
    }
    Ok(())
}

pub fn run(ctx: &Ctx, output: Option<PathBuf>, max_samples: Option<u64>) -> eyre::Result<()> {
    let output = output.unwrap_or_else(|| ctx.cfg.output.resolve_datafile(&chrono::Local::now()));
    ensure_parent_dir(&output)?;
    if output.exists() {
        tracing::warn!(output = %output.display(), "output file exists and will be replaced");
    }

    let (canceller, token) = cancel_pair();
    ctrlc::set_handler(move || {
        tracing::warn!("interrupt received; stopping before the next tumble");
        canceller.cancel();
    })
    .wrap_err("install Ctrl-C handler")?;

    let stop_when = max_samples.map(|n| {
        let n = usize::try_from(n).unwrap_or(usize::MAX);
        Box::new(move |s: &SampleSeries| s.len() >= n) as tumbler_core::StopPredicate
    });

    let instrument = ctx.instrument()?;
    let report = tumbler_core::run_dissociation_cycle(
        instrument,
        RunParams {
            cycle: ctx.cycle(),
            calibration: ctx.calibration(),
            output: output.clone(),
            cancel: Some(token),
            stop_when,
        },
        ctx.clock.clone(),
    )?;

    let samples = report.series.len();
    let last = report.series.last().map(|s| s.intensity);
    ctx.emit(
        &format!(
            "Run {} after {samples} samples; data in {}",
            status_name(report.status),
            output.display()
        ),
        json!({
            "status": status_name(report.status),
            "samples": samples,
            "last_intensity": last,
            "orientation": orientation_name(report.orientation),
            "output": output.display().to_string(),
        }),
    );
    Ok(())
}

pub fn self_test(ctx: &Ctx, rotations: u32) -> eyre::Result<()> {
    let mut instrument = ctx.instrument()?;
    let report = tumbler_core::run_self_test(
        &mut instrument,
        &ctx.cycle(),
        ctx.calibration(),
        &*ctx.clock,
        rotations,
    )?;
    ctx.emit(
        &format!(
            "Self-test OK: {} flips, reading {}",
            report.flips, report.reading
        ),
        json!({ "ok": true, "flips": report.flips, "reading": report.reading }),
    );
    Ok(())
}

pub fn load(ctx: &Ctx) -> eyre::Result<()> {
    let mut instrument = ctx.instrument()?;
    let o = tumbler_core::move_to_load_position(
        &mut instrument.actuator,
        ctx.cfg.timing.end_forward,
    )?;
    ctx.emit(
        "Chamber at load position",
        json!({ "position": "load", "orientation": orientation_name(o) }),
    );
    Ok(())
}

pub fn eject(ctx: &Ctx) -> eyre::Result<()> {
    let mut instrument = ctx.instrument()?;
    let o = tumbler_core::move_to_eject_position(
        &mut instrument.actuator,
        ctx.cfg.timing.end_forward,
    )?;
    ctx.emit(
        "Chamber at eject position",
        json!({ "position": "eject", "orientation": orientation_name(o) }),
    );
    Ok(())
}

pub fn manual(ctx: &Ctx, output: &Path) -> eyre::Result<()> {
    refuse_existing(output)?;
    ensure_parent_dir(output)?;

    let stdin = std::io::stdin();
    let mut labels = move || -> tumbler_core::Result<Option<String>> {
        eprint!("Sample label (empty to finish): ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        let n = stdin.lock().read_line(&mut line).wrap_err("read label")?;
        Ok((n > 0).then_some(line))
    };

    let instrument = ctx.instrument()?;
    let series = tumbler_core::run_manual_session(
        instrument,
        ctx.cycle(),
        ctx.calibration(),
        ctx.clock.clone(),
        &mut labels,
        output,
    )?;
    ctx.emit(
        &format!("Saved {} samples to {}", series.len(), output.display()),
        json!({ "samples": series.len(), "output": output.display().to_string() }),
    );
    Ok(())
}

pub fn measure(ctx: &Ctx, output: &Path) -> eyre::Result<()> {
    refuse_existing(output)?;
    ensure_parent_dir(output)?;
    let mut instrument = ctx.instrument()?;
    let sample = tumbler_core::measure_once_to_file(
        &mut instrument,
        ctx.calibration(),
        ctx.cycle().lamp_time,
        &*ctx.clock,
        output,
    )?;
    ctx.emit(
        &format!("Reading {} saved to {}", sample.intensity, output.display()),
        json!({
            "intensity": sample.intensity,
            "elapsed_ms": sample.elapsed_ms,
            "output": output.display().to_string(),
        }),
    );
    Ok(())
}

/// Open every collaborator and take one dark reading.
pub fn self_check(ctx: &Ctx) -> eyre::Result<()> {
    let mut instrument = ctx.instrument()?;
    tumbler_core::configure_sensor(&mut instrument.sensor, ctx.calibration(), &*ctx.clock)?;
    let dark = instrument
        .sensor
        .sample()
        .map_err(|e| eyre::Report::new(tumbler_core::map_hw_error(&*e)))
        .wrap_err("sample light sensor")?;
    instrument
        .light
        .set_light(false)
        .map_err(|e| eyre::Report::new(tumbler_core::map_hw_error(&*e)))
        .wrap_err("light off")?;
    ctx.emit(
        &format!("OK (dark reading {dark})"),
        json!({ "ok": true, "dark_reading": dark }),
    );
    Ok(())
}
