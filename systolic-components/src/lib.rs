// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The building blocks of a systolic accelerator.
//!
//! - [`ProcessingElement`](crate::pe::ProcessingElement): one cell of the
//!   multiply-accumulate grid.
//! - [`Storage`](crate::storage::Storage): addressable row storage used for
//!   operand memories and output buffers.
//! - [`Arbiter`](crate::arbiter::Arbiter): grants bursts on the bus that all
//!   cores share.

pub mod arbiter;
pub mod pe;
pub mod storage;
pub mod types;
