// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Fixed priority arbitration policy
//!
//! The pending core with the highest index is always chosen. Under sustained
//! load from high-index cores this can starve low-index cores.

use std::rc::Rc;

use systolic_track::entity::Entity;
use systolic_track::trace;

use crate::arbiter::Arbitrate;
use crate::types::{CoreId, CoreSet};

#[derive(Default)]
pub struct FixedPriority;

impl Arbitrate for FixedPriority {
    fn arbitrate(&mut self, entity: &Rc<Entity>, pending: CoreSet) -> Option<CoreId> {
        let winner = pending.highest();
        if let Some(core) = winner {
            trace!(entity ; "priority: core{} wins from {}", core, pending);
        }
        winner
    }
}

#[cfg(test)]
mod tests {
    use systolic_track::entity::toplevel;
    use systolic_track::tracker::dev_null_tracker;

    use super::*;

    #[test]
    fn highest_index_wins() {
        let top = toplevel(&dev_null_tracker(), "top");
        let mut policy = FixedPriority;

        let pending: CoreSet = [0, 2, 1].into_iter().collect();
        assert_eq!(policy.arbitrate(&top, pending), Some(2));
        assert_eq!(policy.arbitrate(&top, pending), Some(2));
        assert_eq!(policy.arbitrate(&top, CoreSet::empty()), None);
    }
}
