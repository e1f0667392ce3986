// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A single multiply-accumulate processing element.
//!
//! Each element latches a weight and an input every tick it is fed, adds
//! their product into a private accumulator and, while results are being
//! drained, passes values through a forward register one hop per tick.

use crate::types::{Accumulator, Operand};

/// What a processing element does on a given tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PeMode {
    /// Hold all state.
    #[default]
    Idle,

    /// Add the latched operands into the accumulator.
    Accumulate,

    /// Place the accumulator into the forward register.
    Emit,

    /// Take the forward register of the neighbouring element.
    Relay,

    /// Return to the power-on state.
    Clear,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessingElement {
    weight: Option<Operand>,
    input: Option<Operand>,
    accumulator: Accumulator,
    forward: Option<Accumulator>,
}

impl ProcessingElement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the operands for this tick. `None` means the operand bus was not
    /// driven.
    pub fn configure(&mut self, weight: Option<Operand>, input: Option<Operand>) {
        self.weight = weight;
        self.input = input;
    }

    /// Add `weight × input` into the accumulator.
    ///
    /// Nothing is added unless both operands are present and non-zero.
    pub fn accumulate(&mut self) {
        match (self.weight, self.input) {
            (Some(weight), Some(input)) if weight != 0 && input != 0 => {
                self.accumulator += Accumulator::from(weight) * Accumulator::from(input);
            }
            _ => {}
        }
    }

    /// Drive the accumulator out through the forward register.
    pub fn emit(&mut self) -> Accumulator {
        self.forward = Some(self.accumulator);
        self.accumulator
    }

    /// Load `incoming` into the forward register, returning the value it
    /// replaces (the value relayed onwards this tick).
    pub fn relay(&mut self, incoming: Option<Accumulator>) -> Option<Accumulator> {
        std::mem::replace(&mut self.forward, incoming)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn weight(&self) -> Option<Operand> {
        self.weight
    }

    #[must_use]
    pub fn input(&self) -> Option<Operand> {
        self.input
    }

    #[must_use]
    pub fn accumulator(&self) -> Accumulator {
        self.accumulator
    }

    #[must_use]
    pub fn forward(&self) -> Option<Accumulator> {
        self.forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_operands_are_gated() {
        let mut pe = ProcessingElement::new();
        pe.configure(Some(7), Some(9));
        pe.accumulate();
        assert_eq!(pe.accumulator(), 63);

        for (weight, input) in [(Some(0), Some(9)), (Some(7), Some(0)), (None, Some(9))] {
            pe.configure(weight, input);
            pe.accumulate();
            assert_eq!(pe.accumulator(), 63);
        }
    }

    #[test]
    fn repeated_accumulation() {
        let mut pe = ProcessingElement::new();
        pe.configure(Some(255), Some(255));
        for _ in 0..4 {
            pe.accumulate();
        }
        assert_eq!(pe.accumulator(), 4 * 255 * 255);
    }

    #[test]
    fn emit_and_relay() {
        let mut pe = ProcessingElement::new();
        pe.configure(Some(3), Some(4));
        pe.accumulate();
        assert_eq!(pe.emit(), 12);
        assert_eq!(pe.forward(), Some(12));

        assert_eq!(pe.relay(Some(40)), Some(12));
        assert_eq!(pe.relay(None), Some(40));
        assert_eq!(pe.forward(), None);
        assert_eq!(pe.accumulator(), 12);

        pe.clear();
        assert_eq!(pe, ProcessingElement::default());
    }
}
