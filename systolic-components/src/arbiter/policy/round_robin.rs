// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Round Robin arbitration policy

use std::rc::Rc;

use systolic_track::entity::Entity;
use systolic_track::trace;

use crate::arbiter::Arbitrate;
use crate::types::{CoreId, CoreSet};

pub struct RoundRobin {
    candidate: CoreId,
}

impl RoundRobin {
    #[must_use]
    pub fn new() -> Self {
        Self { candidate: 0 }
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl Arbitrate for RoundRobin {
    fn arbitrate(&mut self, entity: &Rc<Entity>, pending: CoreSet) -> Option<CoreId> {
        let winner = pending
            .first_from(self.candidate)
            .or_else(|| pending.first_from(0))?;
        trace!(entity ; "round robin: core{} wins from {} (candidate {})", winner, pending, self.candidate);
        self.candidate = winner + 1;
        Some(winner)
    }

    fn reset(&mut self) {
        self.candidate = 0;
    }
}

#[cfg(test)]
mod tests {
    use systolic_track::entity::toplevel;
    use systolic_track::tracker::dev_null_tracker;

    use super::*;

    #[test]
    fn takes_turns() {
        let top = toplevel(&dev_null_tracker(), "top");
        let mut policy = RoundRobin::new();

        let all: CoreSet = (0..4).collect();
        let order: Vec<_> = (0..6).filter_map(|_| policy.arbitrate(&top, all)).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn skips_idle_cores() {
        let top = toplevel(&dev_null_tracker(), "top");
        let mut policy = RoundRobin::new();

        let pending: CoreSet = [1, 3].into_iter().collect();
        assert_eq!(policy.arbitrate(&top, pending), Some(1));
        assert_eq!(policy.arbitrate(&top, pending), Some(3));
        assert_eq!(policy.arbitrate(&top, pending), Some(1));

        policy.reset();
        assert_eq!(policy.arbitrate(&top, [0, 3].into_iter().collect()), Some(0));
    }
}
