// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! The engine that executes the synchronous systolic accelerator model.
//!
//! Every component in the model is driven from a single clock. On each tick
//! the [engine](crate::engine::Engine) calls the model's
//! [`tick`](crate::traits::Simulate::tick), which steps each
//! [`Clocked`](crate::traits::Clocked) component exactly once. A component's
//! new state only becomes visible to others on the following tick.
//!
//! # Simple Application
//!
//! ```rust
//! use systolic_engine::engine::Engine;
//! use systolic_engine::time::clock::ClockTick;
//! use systolic_engine::traits::Simulate;
//! use systolic_engine::types::SimResult;
//!
//! struct Counter {
//!     count: u64,
//! }
//!
//! impl Simulate for Counter {
//!     fn tick(&mut self, _now: ClockTick) -> SimResult {
//!         self.count += 1;
//!         Ok(())
//!     }
//!
//!     fn is_finished(&self) -> bool {
//!         self.count == 10
//!     }
//! }
//!
//! let mut engine = Engine::default();
//! let mut counter = Counter { count: 0 };
//! engine.run_until_finished(&mut counter, 100).unwrap();
//! assert_eq!(engine.default_clock().tick_now().tick(), 10);
//! ```

pub mod engine;
pub mod test_helpers;
pub mod time;
pub mod traits;
pub mod types;
