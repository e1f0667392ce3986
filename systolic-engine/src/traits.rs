// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A set of common traits used across the simulation.

use crate::time::clock::ClockTick;
use crate::types::SimResult;

/// A synchronous component that advances one tick per call to `step`.
///
/// `step` sees only the inputs sampled for the current tick and the
/// component's own registered state. Everything it changes becomes visible to
/// other components on the next tick. The returned outputs are the values the
/// component drove during this tick.
pub trait Clocked {
    type Inputs;
    type Outputs;

    fn step(&mut self, inputs: &Self::Inputs) -> Self::Outputs;

    /// Return every register to its power-on value.
    fn reset(&mut self);
}

/// A complete model that the [`Engine`](crate::engine::Engine) can run.
pub trait Simulate {
    /// Evaluate and commit one clock tick.
    fn tick(&mut self, now: ClockTick) -> SimResult;

    /// Whether the model has completed all of its work.
    fn is_finished(&self) -> bool {
        false
    }
}
