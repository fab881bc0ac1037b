//! Light sensor calibration values shared by config, core, and drivers.

use std::fmt;

/// Analog gain of the light sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    Low,
    #[default]
    Medium,
    High,
    Max,
}

impl fmt::Display for Gain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gain::Low => "low",
            Gain::Medium => "medium",
            Gain::High => "high",
            Gain::Max => "max",
        };
        f.write_str(s)
    }
}

/// Integration (exposure) window of the light sensor, 100 ms to 600 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationTime {
    #[default]
    Ms100,
    Ms200,
    Ms300,
    Ms400,
    Ms500,
    Ms600,
}

impl IntegrationTime {
    pub const ALL: [IntegrationTime; 6] = [
        IntegrationTime::Ms100,
        IntegrationTime::Ms200,
        IntegrationTime::Ms300,
        IntegrationTime::Ms400,
        IntegrationTime::Ms500,
        IntegrationTime::Ms600,
    ];

    /// Map a millisecond value onto one of the supported windows.
    pub fn from_millis(ms: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|it| it.as_millis() == ms)
    }

    pub fn as_millis(self) -> u64 {
        match self {
            IntegrationTime::Ms100 => 100,
            IntegrationTime::Ms200 => 200,
            IntegrationTime::Ms300 => 300,
            IntegrationTime::Ms400 => 400,
            IntegrationTime::Ms500 => 500,
            IntegrationTime::Ms600 => 600,
        }
    }
}

impl fmt::Display for IntegrationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_millis())
    }
}
