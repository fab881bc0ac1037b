//! Cycle arithmetic and the state values the controller moves through.

use std::time::Duration;

/// Number of flips in one tumble block: `ceil(sample / tumble)` rounded up to
/// the next even number.
///
/// Every flip toggles orientation, so an even count returns the chamber to the
/// measurement end before the next reading. A zero `tumble` is treated as one
/// nanosecond.
pub fn num_tumbles(sample: Duration, tumble: Duration) -> u32 {
    let per = tumble.as_nanos().max(1);
    let n = sample.as_nanos().div_ceil(per);
    let even = n + (n % 2);
    // u32::MAX is odd; clamp to the largest even value.
    u32::try_from(even).unwrap_or(u32::MAX - 1)
}

/// Which end position the chamber occupies.
///
/// Named after the flip direction that reaches it: `flip(true)` ends at
/// `Forward`, `flip(false)` ends at `Reverse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    /// Position reached by a flip in the given direction.
    pub fn after_flip(forward: bool) -> Self {
        if forward {
            Orientation::Forward
        } else {
            Orientation::Reverse
        }
    }

    /// The end where readings are taken.
    pub fn measurement(end_forward: bool) -> Self {
        Self::after_flip(end_forward)
    }

    pub fn is_forward(self) -> bool {
        matches!(self, Orientation::Forward)
    }

    /// Direction of the flip that leaves this position.
    pub fn next_flip(self) -> bool {
        !self.is_forward()
    }

    pub fn flipped(self) -> Self {
        Self::after_flip(self.next_flip())
    }
}

/// Phase of the dissociation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// Waiting for the contents to settle before a reading.
    Settling,
    /// Lamp on, waiting for the light level to stabilize.
    Illuminating,
    /// Taking and persisting one reading.
    Measuring,
    /// Inside the tumble block; `completed` flips done so far.
    Tumbling { completed: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(300, 3, 100)]
    #[case(301, 3, 102)]
    #[case(180, 5, 36)]
    #[case(10, 3, 4)]
    #[case(1, 60, 2)]
    #[case(0, 3, 0)]
    fn num_tumbles_examples(#[case] sample_s: u64, #[case] tumble_s: u64, #[case] expected: u32) {
        let n = num_tumbles(Duration::from_secs(sample_s), Duration::from_secs(tumble_s));
        assert_eq!(n, expected);
    }

    #[test]
    fn num_tumbles_uses_sub_second_precision() {
        // 1.0 / 0.3 = 3.33 -> 4
        let n = num_tumbles(Duration::from_secs(1), Duration::from_millis(300));
        assert_eq!(n, 4);
    }

    #[test]
    fn orientation_toggles() {
        let o = Orientation::measurement(true);
        assert_eq!(o, Orientation::Forward);
        assert!(!o.next_flip());
        assert_eq!(o.flipped(), Orientation::Reverse);
        assert_eq!(o.flipped().flipped(), o);
    }
}
