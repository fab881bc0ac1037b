//! Hardware-free collaborators for tests and dry runs.
//!
//! Each spy appends to a shared `EventLog`, stamped with the virtual time of a
//! `TestClock`, so a test can assert the exact interleaving of flips, lamp
//! switches and readings.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tumbler_traits::clock::test_clock::TestClock;
use tumbler_traits::{ChamberActuator, Clock, Gain, HwResult, IntegrationTime, Light, LightSensor};

/// One observed hardware call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Flip { forward: bool },
    Light { on: bool },
    Configure,
    Sample { value: u32 },
}

/// Shared, timestamped call log.
#[derive(Debug, Clone)]
pub struct EventLog {
    clock: TestClock,
    events: Arc<Mutex<Vec<(Duration, Event)>>>,
}

impl EventLog {
    pub fn new(clock: TestClock) -> Self {
        Self {
            clock,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Duration, Event)>> {
        self.events.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn record(&self, ev: Event) {
        let at = self.clock.elapsed();
        self.lock().push((at, ev));
    }

    pub fn snapshot(&self) -> Vec<(Duration, Event)> {
        self.lock().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().iter().map(|(_, e)| *e).collect()
    }

    pub fn flips(&self) -> Vec<bool> {
        self.lock()
            .iter()
            .filter_map(|(_, e)| match e {
                Event::Flip { forward } => Some(*forward),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.lock().iter().filter(|(_, e)| pred(e)).count()
    }
}

/// Actuator spy. Each flip takes `motion` of virtual time. Optionally invokes a
/// hook after every flip with the running flip count.
pub struct SpyActuator {
    log: EventLog,
    clock: TestClock,
    motion: Duration,
    flips: u32,
    fail_after: Option<u32>,
    on_flip: Option<Box<dyn FnMut(u32)>>,
}

impl SpyActuator {
    pub fn new(log: EventLog, clock: TestClock) -> Self {
        Self {
            log,
            clock,
            motion: Duration::ZERO,
            flips: 0,
            fail_after: None,
            on_flip: None,
        }
    }

    pub fn with_motion(mut self, d: Duration) -> Self {
        self.motion = d;
        self
    }

    /// Fail every flip after `n` successful ones.
    pub fn failing_after(mut self, n: u32) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn on_flip(mut self, f: impl FnMut(u32) + 'static) -> Self {
        self.on_flip = Some(Box::new(f));
        self
    }
}

impl ChamberActuator for SpyActuator {
    fn flip(&mut self, forward: bool) -> HwResult<()> {
        if self.fail_after.is_some_and(|n| self.flips >= n) {
            return Err(Box::new(std::io::Error::other("actuator jammed")));
        }
        self.log.record(Event::Flip { forward });
        self.clock.sleep(self.motion);
        self.flips += 1;
        if let Some(hook) = self.on_flip.as_mut() {
            hook(self.flips);
        }
        Ok(())
    }
}

pub struct SpyLight {
    log: EventLog,
}

impl SpyLight {
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl Light for SpyLight {
    fn set_light(&mut self, on: bool) -> HwResult<()> {
        self.log.record(Event::Light { on });
        Ok(())
    }
}

/// Sensor spy returning `start`, `start + step`, ...
pub struct SpySensor {
    log: EventLog,
    next: u32,
    step: u32,
    configured: Option<(Gain, IntegrationTime)>,
    fail: bool,
}

impl SpySensor {
    pub fn new(log: EventLog, start: u32, step: u32) -> Self {
        Self {
            log,
            next: start,
            step,
            configured: None,
            fail: false,
        }
    }

    /// A sensor whose every reading fails.
    pub fn failing(log: EventLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log, 0, 0)
        }
    }

    pub fn configured(&self) -> Option<(Gain, IntegrationTime)> {
        self.configured
    }
}

impl LightSensor for SpySensor {
    fn configure(&mut self, gain: Gain, integration: IntegrationTime) -> HwResult<()> {
        self.configured = Some((gain, integration));
        self.log.record(Event::Configure);
        Ok(())
    }

    fn sample(&mut self) -> HwResult<u32> {
        if self.fail {
            return Err(Box::new(std::io::Error::other("sensor timeout")));
        }
        let value = self.next;
        self.next = self.next.saturating_add(self.step);
        self.log.record(Event::Sample { value });
        Ok(value)
    }
}

/// Light that does nothing.
pub struct NoopLight;

impl Light for NoopLight {
    fn set_light(&mut self, _on: bool) -> HwResult<()> {
        Ok(())
    }
}
