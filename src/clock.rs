//! Millisecond-granularity monotonic clock, injected into [`crate::world::World::tick`]
//! for profiling rather than reached for as a process-global singleton
//! (§9's "profiler and log sinks as injected interfaces" note). The
//! engine never reads wall-clock time itself; this is the sole seam.

use std::time::Instant;

/// A source of monotonic milliseconds. Implementations must never go
/// backwards; the default [`SystemClock`] wraps [`std::time::Instant`].
pub trait Clock {
    /// Milliseconds elapsed since some unspecified, fixed epoch.
    fn now_millis(&self) -> u64;
}

/// The default [`Clock`], backed by [`std::time::Instant`].
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Builds a clock whose epoch is the moment of construction.
    pub fn new() -> Self {
        SystemClock { epoch: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

#[cfg(test)]
pub(crate) struct ScriptedClock {
    pub ticks: std::cell::Cell<usize>,
    pub values: Vec<u64>,
}

#[cfg(test)]
impl Clock for ScriptedClock {
    fn now_millis(&self) -> u64 {
        let i = self.ticks.get();
        self.ticks.set(i + 1);
        self.values[i.min(self.values.len() - 1)]
    }
}
