use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tumbler_core::mocks::{Event, EventLog, SpyActuator, SpyLight, SpySensor};
use tumbler_core::{
    CycleCfg, CycleStatus, DissociationError, Instrument, LabeledSample, Orientation, Result,
    RunParams, SampleSeries, SensorCalibration, cancel_pair, measure_once_to_file, move_to_eject_position,
    move_to_load_position, read_labeled, read_series, run_dissociation_cycle, run_manual_session,
    run_self_test,
};
use tumbler_traits::clock::test_clock::TestClock;

fn instrument(clock: &TestClock, log: &EventLog) -> Instrument<SpyActuator, SpyLight, SpySensor> {
    Instrument {
        actuator: SpyActuator::new(log.clone(), clock.clone()),
        light: SpyLight::new(log.clone()),
        sensor: SpySensor::new(log.clone(), 4_200, 100),
    }
}

fn rig() -> (TestClock, EventLog) {
    let clock = TestClock::new();
    let log = EventLog::new(clock.clone());
    (clock, log)
}

#[test]
fn measure_once_refuses_existing_output_without_touching_hardware() {
    let (clock, log) = rig();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taken.csv");
    std::fs::write(&path, "keep me").unwrap();

    let mut inst = instrument(&clock, &log);
    let err = measure_once_to_file(
        &mut inst,
        SensorCalibration::default(),
        Duration::from_secs(2),
        &clock,
        &path,
    )
    .expect_err("existing file");

    match err.downcast_ref::<DissociationError>() {
        Some(DissociationError::OutputExists(p)) => assert_eq!(p, &path),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(log.count(|e| *e == Event::Configure), 0);
    assert_eq!(log.count(|e| matches!(e, Event::Sample { .. })), 0);
    assert!(log.events().is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
}

#[test]
fn measure_once_writes_single_row() {
    let (clock, log) = rig();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one.csv");

    let mut inst = instrument(&clock, &log);
    let sample = measure_once_to_file(
        &mut inst,
        SensorCalibration::default(),
        Duration::from_secs(2),
        &clock,
        &path,
    )
    .unwrap();

    assert_eq!(sample.intensity, 4_200);
    assert_eq!(sample.elapsed_ms, 3_000);
    assert_eq!(read_series(&path).unwrap().as_slice(), &[sample]);
    assert_eq!(
        log.events(),
        vec![
            Event::Configure,
            Event::Light { on: true },
            Event::Sample { value: 4_200 },
            Event::Light { on: false },
        ]
    );
}

#[test]
fn self_test_round_trips_and_reads_once() {
    let (clock, log) = rig();
    let mut inst = instrument(&clock, &log);
    let cycle = CycleCfg {
        end_forward: true,
        ..CycleCfg::default()
    };
    let report = run_self_test(&mut inst, &cycle, SensorCalibration::default(), &clock, 2).unwrap();

    assert_eq!(report.flips, 5);
    assert_eq!(report.reading, 4_200);
    assert_eq!(log.flips(), vec![true, false, true, false, true]);
    // Blink, then the illuminated reading.
    assert_eq!(log.count(|e| *e == Event::Light { on: true }), 2);
    assert_eq!(log.events().last(), Some(&Event::Light { on: false }));

    let snapshot = log.snapshot();
    let configured = snapshot.iter().find(|(_, e)| *e == Event::Configure).unwrap().0;
    let sampled = snapshot
        .iter()
        .find(|(_, e)| matches!(e, Event::Sample { .. }))
        .unwrap()
        .0;
    assert!(sampled - configured >= Duration::from_secs(1));
}

#[test]
fn positioning_follows_end_forward() {
    let (clock, log) = rig();
    let mut act = SpyActuator::new(log.clone(), clock.clone());

    assert_eq!(move_to_load_position(&mut act, false).unwrap(), Orientation::Forward);
    assert_eq!(move_to_eject_position(&mut act, false).unwrap(), Orientation::Reverse);
    assert_eq!(move_to_load_position(&mut act, true).unwrap(), Orientation::Reverse);
    assert_eq!(move_to_eject_position(&mut act, true).unwrap(), Orientation::Forward);
    assert_eq!(log.flips(), vec![true, false, false, true]);
}

#[test]
fn manual_session_reads_each_label_and_writes_once() {
    let (clock, log) = rig();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manual.csv");
    let mut labels: VecDeque<String> = ["blank", " tube 1 ", "", "never read"]
        .into_iter()
        .map(String::from)
        .collect();
    let mut source = move || -> Result<Option<String>> { Ok(labels.pop_front()) };

    let series = run_manual_session(
        instrument(&clock, &log),
        CycleCfg::default(),
        SensorCalibration::default(),
        Arc::new(clock.clone()),
        &mut source,
        &path,
    )
    .unwrap();

    assert_eq!(
        series,
        vec![
            LabeledSample {
                label: "blank".into(),
                intensity: 4_200
            },
            LabeledSample {
                label: "tube 1".into(),
                intensity: 4_300
            },
        ]
    );
    // Load, then read/return per label.
    assert_eq!(log.flips(), vec![false, true, false, true, false]);
    assert_eq!(read_labeled(&path).unwrap(), series);
}

#[test]
fn manual_session_with_no_labels_writes_header_only() {
    let (clock, log) = rig();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    let mut source = || -> Result<Option<String>> { Ok(None) };

    let series = run_manual_session(
        instrument(&clock, &log),
        CycleCfg::default(),
        SensorCalibration::default(),
        Arc::new(clock.clone()),
        &mut source,
        &path,
    )
    .unwrap();
    assert!(series.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "label,intensity\n");
}

#[test]
fn run_entry_point_reports_final_state() {
    let (clock, log) = rig();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.csv");
    let (canceller, token) = cancel_pair();
    let params = RunParams {
        cycle: CycleCfg {
            tumble_time: Duration::from_secs(3),
            sample_time: Duration::from_secs(6),
            settle_time: Duration::from_secs(3),
            lamp_time: Duration::from_secs(1),
            end_forward: false,
        },
        calibration: SensorCalibration::default(),
        output: path.clone(),
        cancel: Some(token),
        stop_when: Some(Box::new(move |s: &SampleSeries| {
            if s.len() == 2 {
                canceller.cancel();
            }
            false
        })),
    };

    let report = run_dissociation_cycle(instrument(&clock, &log), params, Arc::new(clock.clone()))
        .unwrap();
    assert_eq!(report.status, CycleStatus::Cancelled);
    assert_eq!(report.series.len(), 2);
    assert_eq!(report.orientation, Orientation::Reverse);
    assert_eq!(read_series(&path).unwrap(), report.series);
}
