/// Monotonic millisecond clock and interval timers.
///
/// The frame loop never sleeps on a subsystem's behalf: each timer-gated
/// subsystem asks its `Timer` whether `now - last >= interval` this frame.

use std::cell::Cell;
use std::time::Instant;

pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin. Never decreases.
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by `Instant`.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Test clock, advanced by hand.
#[allow(dead_code)]
#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock { now: Cell::new(start_ms) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, ms: u64) {
        if ms > self.now.get() {
            self.now.set(ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// "Time since last fire >= interval" gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timer {
    pub interval_ms: u64,
    pub last_ms: u64,
}

impl Timer {
    pub fn new(interval_ms: u64, now_ms: u64) -> Self {
        Timer { interval_ms, last_ms: now_ms }
    }

    /// True (and re-armed at `now`) once the interval has elapsed.
    /// A zero interval fires every call.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) >= self.interval_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Restart the interval from `now` without firing.
    pub fn rearm(&mut self, now_ms: u64) {
        self.last_ms = now_ms;
    }

    /// Shift the reference point forward, e.g. after a pause.
    pub fn shift(&mut self, by_ms: u64) {
        self.last_ms = self.last_ms.saturating_add(by_ms);
    }
}
