use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tumbler_core::mocks::{EventLog, NoopLight, SpyActuator, SpySensor};
use tumbler_core::{CycleCfg, DataRecorder, DissociationController, Orientation, num_tumbles};
use tumbler_traits::clock::test_clock::TestClock;

proptest! {
    #[test]
    fn tumble_count_is_even_and_covers_sample_time(
        sample_ms in 0u64..10_000_000,
        tumble_ms in 1u64..100_000,
    ) {
        let n = num_tumbles(Duration::from_millis(sample_ms), Duration::from_millis(tumble_ms));
        let minimum = sample_ms.div_ceil(tumble_ms);
        prop_assert_eq!(n % 2, 0);
        prop_assert!(u64::from(n) >= minimum);
        prop_assert!(u64::from(n) <= minimum + 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_reading_is_taken_at_the_measurement_end(
        sample_ms in 1u64..20_000,
        tumble_ms in 1u64..2_000,
        end_forward in any::<bool>(),
        readings in 1usize..4,
    ) {
        let clock = TestClock::new();
        let log = EventLog::new(clock.clone());
        let dir = tempfile::tempdir().unwrap();
        let cycle = CycleCfg {
            tumble_time: Duration::from_millis(tumble_ms),
            sample_time: Duration::from_millis(sample_ms),
            settle_time: Duration::ZERO,
            lamp_time: Duration::ZERO,
            end_forward,
        };
        let mut ctrl = DissociationController::builder()
            .with_actuator(SpyActuator::new(log.clone(), clock.clone()))
            .with_light(NoopLight)
            .with_sensor(SpySensor::new(log.clone(), 0, 1))
            .with_recorder(DataRecorder::new(dir.path().join("p.csv")))
            .with_cycle(cycle)
            .with_clock(Arc::new(clock.clone()))
            .with_stop_when(move |s| s.len() >= readings)
            .try_build()
            .unwrap();

        ctrl.run().unwrap();
        let n = ctrl.num_tumbles() as usize;
        prop_assert_eq!(ctrl.orientation(), Orientation::measurement(end_forward));
        prop_assert_eq!(log.flips().len(), 1 + n * (readings - 1));
        let elapsed: Vec<u64> = ctrl.series().iter().map(|s| s.elapsed_ms).collect();
        prop_assert!(elapsed.windows(2).all(|w| w[0] < w[1]));
    }
}
