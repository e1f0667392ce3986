// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Policies that choose which pending core is granted the bus next.

use serde::{Deserialize, Serialize};

use crate::arbiter::Arbitrate;

pub mod fixed_priority;
pub mod round_robin;

pub use fixed_priority::FixedPriority;
pub use round_robin::RoundRobin;

/// The arbitration policies that can be selected by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Highest core index always wins.
    #[default]
    FixedPriority,

    /// Cores take turns in index order.
    RoundRobin,
}

impl PolicyKind {
    #[must_use]
    pub fn build(&self) -> Box<dyn Arbitrate> {
        match self {
            PolicyKind::FixedPriority => Box::new(FixedPriority),
            PolicyKind::RoundRobin => Box::new(RoundRobin::new()),
        }
    }
}
