use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;
use tumbler_core::error::BuildError;
use tumbler_core::mocks::{Event, EventLog, NoopLight, SpyActuator, SpyLight, SpySensor};
use tumbler_core::{CycleCfg, DataRecorder, DissociationController, Report, SensorCalibration};
use tumbler_traits::clock::test_clock::TestClock;
use tumbler_traits::{Gain, IntegrationTime};

type Builder = tumbler_core::ControllerBuilder<SpyActuator, SpyLight, SpySensor>;

fn parts() -> (TestClock, EventLog) {
    let clock = TestClock::new();
    let log = EventLog::new(clock.clone());
    (clock, log)
}

fn build_err(b: Builder) -> Report {
    match b.try_build() {
        Err(e) => e,
        Ok(_) => panic!("build should fail"),
    }
}

#[test]
fn missing_collaborators_are_reported() {
    let (clock, log) = parts();

    let err = build_err(
        Builder::default()
            .with_light(SpyLight::new(log.clone()))
            .with_sensor(SpySensor::new(log.clone(), 0, 0))
            .with_recorder(DataRecorder::new("unused.csv")),
    );
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingActuator)
    ));

    let err = build_err(
        Builder::default()
            .with_actuator(SpyActuator::new(log.clone(), clock.clone()))
            .with_sensor(SpySensor::new(log.clone(), 0, 0))
            .with_recorder(DataRecorder::new("unused.csv")),
    );
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingLight)
    ));

    let err = build_err(
        Builder::default()
            .with_actuator(SpyActuator::new(log.clone(), clock.clone()))
            .with_light(SpyLight::new(log.clone()))
            .with_recorder(DataRecorder::new("unused.csv")),
    );
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingSensor)
    ));

    let err = build_err(
        Builder::default()
            .with_actuator(SpyActuator::new(log.clone(), clock.clone()))
            .with_light(SpyLight::new(log.clone()))
            .with_sensor(SpySensor::new(log.clone(), 0, 0)),
    );
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingRecorder)
    ));

    // Nothing touched the hardware.
    assert!(log.events().is_empty());
}

#[rstest]
#[case(Duration::ZERO, Duration::from_secs(300), "tumble_time")]
#[case(Duration::from_micros(999), Duration::from_secs(300), "tumble_time")]
#[case(Duration::from_secs(3), Duration::ZERO, "sample_time")]
fn invalid_timing_is_rejected_before_hardware(
    #[case] tumble: Duration,
    #[case] sample: Duration,
    #[case] field: &str,
) {
    let (clock, log) = parts();
    let err = build_err(
        Builder::default()
            .with_actuator(SpyActuator::new(log.clone(), clock.clone()))
            .with_light(SpyLight::new(log.clone()))
            .with_sensor(SpySensor::new(log.clone(), 0, 0))
            .with_recorder(DataRecorder::new("unused.csv"))
            .with_clock(Arc::new(clock.clone()))
            .with_cycle(CycleCfg {
                tumble_time: tumble,
                sample_time: sample,
                ..CycleCfg::default()
            }),
    );
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(field), "{msg}"),
        other => panic!("unexpected {other:?}"),
    }
    assert!(log.events().is_empty());
}

#[test]
fn short_settle_builds_with_zero_settle_wait() {
    let (clock, log) = parts();
    let cycle = CycleCfg {
        tumble_time: Duration::from_secs(5),
        settle_time: Duration::from_secs(2),
        ..CycleCfg::default()
    };
    let ctrl = DissociationController::builder()
        .with_actuator(SpyActuator::new(log.clone(), clock.clone()))
        .with_light(NoopLight)
        .with_sensor(SpySensor::new(log.clone(), 0, 0))
        .with_recorder(DataRecorder::new("unused.csv"))
        .with_clock(Arc::new(clock.clone()))
        .with_cycle(cycle)
        .try_build()
        .unwrap();
    assert_eq!(ctrl.cycle().settle_wait(), Duration::ZERO);
    assert_eq!(ctrl.num_tumbles(), 60);
}

#[test]
fn build_configures_sensor_then_anchors() {
    let (clock, log) = parts();
    let calibration = SensorCalibration {
        gain: Gain::High,
        integration: IntegrationTime::Ms300,
    };
    let ctrl = DissociationController::builder()
        .with_actuator(SpyActuator::new(log.clone(), clock.clone()))
        .with_light(SpyLight::new(log.clone()))
        .with_sensor(SpySensor::new(log.clone(), 0, 0))
        .with_recorder(DataRecorder::new("unused.csv"))
        .with_clock(Arc::new(clock.clone()))
        .with_calibration(calibration)
        .with_cycle(CycleCfg {
            end_forward: false,
            ..CycleCfg::default()
        })
        .try_build()
        .unwrap();

    assert_eq!(
        log.snapshot(),
        vec![
            (Duration::ZERO, Event::Configure),
            (Duration::from_secs(1), Event::Flip { forward: false }),
        ]
    );
    assert_eq!(ctrl.orientation(), tumbler_core::Orientation::Reverse);
    assert_eq!(ctrl.num_tumbles(), 100);
}
