// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! This module represents the time during a simulation.
//!
//! Every component in the model shares a single clock, so time is simply the
//! number of ticks that have completed.

use std::cell::Cell;
use std::rc::Rc;

/// ClockTick structure for representing a number of Clock ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTick {
    /// Clock ticks.
    tick: u64,
}

impl ClockTick {
    #[must_use]
    pub fn new(tick: u64) -> Self {
        Self { tick }
    }

    /// Get the current clock tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

impl std::fmt::Display for ClockTick {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.tick)
    }
}

struct ClockState {
    freq_mhz: f64,
    now: Cell<u64>,
}

/// A handle to the global clock.
///
/// Clones share the same underlying tick count, which only the
/// [`Engine`](crate::engine::Engine) advances.
#[derive(Clone)]
pub struct Clock {
    shared_state: Rc<ClockState>,
}

impl Clock {
    #[must_use]
    pub fn new(freq_mhz: f64) -> Self {
        Self {
            shared_state: Rc::new(ClockState {
                freq_mhz,
                now: Cell::new(0),
            }),
        }
    }

    #[must_use]
    pub fn freq_mhz(&self) -> f64 {
        self.shared_state.freq_mhz
    }

    /// The tick currently being evaluated.
    #[must_use]
    pub fn tick_now(&self) -> ClockTick {
        ClockTick::new(self.shared_state.now.get())
    }

    #[must_use]
    pub fn to_ns(&self, clock_tick: &ClockTick) -> f64 {
        clock_tick.tick() as f64 / self.freq_mhz() * 1000.0
    }

    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.to_ns(&self.tick_now())
    }

    pub(crate) fn advance(&self) {
        self.shared_state.now.set(self.shared_state.now.get() + 1);
    }
}
