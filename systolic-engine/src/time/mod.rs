// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Simulation time.

pub mod clock;
