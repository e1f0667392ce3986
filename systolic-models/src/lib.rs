// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Models of a multi-core systolic array accelerator.
//!
//! An [`Accelerator`](accelerator::Accelerator) connects a number of
//! [cores](array_core::Core) to the host over a single shared bus. Each core holds
//! an N×N grid of processing elements sequenced by a
//! [`DataflowController`](controller::DataflowController) that loads operands,
//! streams them through the grid along a diagonal
//! [wavefront](wavefront::Wavefront), drains the results into output buffers
//! and unloads them.
//!
//! # Example
//!
//! ```
//! use systolic_engine::engine::Engine;
//! use systolic_models::accelerator::Accelerator;
//! use systolic_models::config::SystolicConfig;
//! use systolic_models::host::Job;
//! use systolic_models::reference::matmul;
//!
//! let mut engine = Engine::default();
//! let config = SystolicConfig {
//!     grid_size: 2,
//!     num_cores: 1,
//!     burst_write_len: 3,
//!     burst_read_len: 3,
//!     ..SystolicConfig::default()
//! };
//! let mut accel = Accelerator::new(engine.top(), "accel", &config).unwrap();
//!
//! let a = vec![vec![1, 2], vec![3, 4]];
//! let b = vec![vec![5, 6], vec![7, 8]];
//! accel.submit(0, Job::from_matrices(&a, &b).unwrap()).unwrap();
//! engine.run_until_finished(&mut accel, 1000).unwrap();
//!
//! assert_eq!(accel.results(0)[0], matmul(&a, &b));
//! ```

pub mod accelerator;
pub mod config;
pub mod controller;
pub mod array_core;
pub mod host;
pub mod reference;
pub mod wavefront;
