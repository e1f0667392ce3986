// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The simulation engine.
//!
//! The engine owns the top-level [`Entity`], the [`Tracker`] and the global
//! [`Clock`]. Each call to [`Engine::run_for`] or
//! [`Engine::run_until_finished`] evaluates a [`Simulate`] model once per tick
//! and then advances the clock.

use std::rc::Rc;

use systolic_track::entity::{Entity, toplevel};
use systolic_track::builder::{TrackerConfig, setup_trackers};
use systolic_track::tracker::dev_null_tracker;
use systolic_track::{Tracker, debug, set_tick};

use crate::sim_error;
use crate::time::clock::Clock;
use crate::traits::Simulate;
use crate::types::SimResult;

/// Use a default clock frequency of 1GHz.
const DEFAULT_CLOCK_MHZ: f64 = 1000.0;

pub struct Engine {
    toplevel: Rc<Entity>,
    tracker: Tracker,
    clock: Clock,
}

impl Engine {
    /// Create a standalone engine.
    #[must_use]
    pub fn new(tracker: &Tracker) -> Self {
        Self::new_with_clock_mhz(tracker, DEFAULT_CLOCK_MHZ)
    }

    #[must_use]
    pub fn new_with_clock_mhz(tracker: &Tracker, freq_mhz: f64) -> Self {
        let toplevel = toplevel(tracker, "top");
        Self {
            toplevel,
            tracker: tracker.clone(),
            clock: Clock::new(freq_mhz),
        }
    }

    /// Run the model for exactly `ticks` ticks.
    pub fn run_for(&mut self, model: &mut dyn Simulate, ticks: u64) -> SimResult {
        for _ in 0..ticks {
            self.step(model)?;
        }
        Ok(())
    }

    /// Run the model until it reports that it has finished.
    ///
    /// Returns an error if the model is still running after `max_ticks`
    /// ticks, which usually indicates a deadlock.
    pub fn run_until_finished(&mut self, model: &mut dyn Simulate, max_ticks: u64) -> SimResult {
        let start = self.clock.tick_now().tick();
        while !model.is_finished() {
            if self.clock.tick_now().tick() - start >= max_ticks {
                return sim_error!(format!(
                    "{}: model still running after {max_ticks} ticks",
                    self.toplevel
                ));
            }
            self.step(model)?;
        }
        debug!(self.toplevel ; "finished at tick {}", self.clock.tick_now());
        Ok(())
    }

    fn step(&mut self, model: &mut dyn Simulate) -> SimResult {
        model.tick(self.clock.tick_now())?;
        self.clock.advance();
        set_tick!(self.toplevel ; self.clock.tick_now().tick());
        Ok(())
    }

    #[must_use]
    pub fn default_clock(&self) -> Clock {
        self.clock.clone()
    }

    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.clock.time_now_ns()
    }

    #[must_use]
    pub fn top(&self) -> &Rc<Entity> {
        &self.toplevel
    }

    #[must_use]
    pub fn tracker(&self) -> Tracker {
        self.tracker.clone()
    }
}

/// An engine printing warnings and errors to stdout.
impl Default for Engine {
    fn default() -> Self {
        // The default configuration has no filter to reject.
        let tracker =
            setup_trackers(&TrackerConfig::default()).unwrap_or_else(|_| dev_null_tracker());
        Self::new(&tracker)
    }
}
