// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The diagonal wavefront schedule of an N×N grid.
//!
//! Every processing element belongs to the delay group `row + col`. Operands
//! enter at the top-left corner and reach group `g` after `g` ticks, so during
//! distribution a PE starts accepting operands on tick `row + col`.
//!
//! Draining reuses the same groups. On cleanup tick `t` group `t` emits its
//! accumulators into the forward registers, which shift up one row per tick
//! towards row 0. The output buffer of column `c` captures the value of row
//! `r` on tick `2r + c + 1`, after `r` relay hops. For N=4 this gives:
//!
//! ```text
//! tick    0  1  2  3  4  5  6  7  8  9 10 11
//! emit   g0 g1 g2 g3 g4 g5 g6
//! glb0       r0    r1    r2    r3
//! glb1          r0    r1    r2    r3
//! glb2             r0    r1    r2    r3
//! glb3                r0    r1    r2    r3
//! ```
//!
//! and completion is signalled on tick 11.

use itertools::iproduct;
use systolic_components::pe::PeMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wavefront {
    n: usize,
}

impl Wavefront {
    #[must_use]
    pub fn new(n: usize) -> Self {
        debug_assert!(n > 0);
        Self { n }
    }

    #[must_use]
    pub fn grid_size(&self) -> usize {
        self.n
    }

    #[must_use]
    pub fn delay_group(row: usize, col: usize) -> usize {
        row + col
    }

    /// Index of the last delay group, `2N - 2`.
    #[must_use]
    pub fn last_group(&self) -> usize {
        2 * self.n - 2
    }

    /// Number of PEs in delay group `group`.
    #[must_use]
    pub fn group_size(&self, group: usize) -> usize {
        if group > self.last_group() {
            0
        } else {
            group.min(self.last_group() - group) + 1
        }
    }

    /// Whether row unit `unit` has been activated by distribute tick `tick`.
    #[must_use]
    pub fn row_unit_active(unit: usize, tick: usize) -> bool {
        tick >= unit
    }

    /// Whether PE `(row, col)` accepts operands on distribute tick `tick`.
    #[must_use]
    pub fn accepting(row: usize, col: usize, tick: usize) -> bool {
        tick >= Self::delay_group(row, col)
    }

    /// Number of PEs accepting operands on distribute tick `tick`.
    #[must_use]
    pub fn active_count(&self, tick: usize) -> usize {
        (0..=tick.min(self.last_group()))
            .map(|group| self.group_size(group))
            .sum()
    }

    /// The mode of every PE (row-major) on distribute tick `tick`.
    #[must_use]
    pub fn distribute_modes(&self, tick: usize) -> Vec<PeMode> {
        self.grid()
            .map(|(row, col)| {
                if Self::accepting(row, col, tick) {
                    PeMode::Accumulate
                } else {
                    PeMode::Idle
                }
            })
            .collect()
    }

    /// Whether the distribute phase is complete on tick `tick`.
    #[must_use]
    pub fn distribute_done(&self, tick: usize) -> bool {
        tick >= self.last_group()
    }

    /// Mode of PE `(row, col)` on cleanup tick `tick`.
    #[must_use]
    pub fn drain_mode(&self, row: usize, col: usize, tick: usize) -> PeMode {
        let group = Self::delay_group(row, col);
        // The value emitted by the bottom row of this column passes this PE
        // last, on tick 2(N-1) + col - row.
        let last_relay = 2 * (self.n - 1) + col - row;
        if tick < group {
            PeMode::Accumulate
        } else if tick == group {
            PeMode::Emit
        } else if tick <= last_relay {
            PeMode::Relay
        } else {
            PeMode::Clear
        }
    }

    /// The mode of every PE (row-major) on cleanup tick `tick`.
    #[must_use]
    pub fn cleanup_modes(&self, tick: usize) -> Vec<PeMode> {
        self.grid()
            .map(|(row, col)| self.drain_mode(row, col, tick))
            .collect()
    }

    /// Cleanup tick on which output buffer `col` captures row `row`.
    #[must_use]
    pub fn capture_tick(row: usize, col: usize) -> usize {
        2 * row + col + 1
    }

    /// The row captured by output buffer `col` on cleanup tick `tick`, if any.
    #[must_use]
    pub fn capture_row(&self, col: usize, tick: usize) -> Option<usize> {
        if tick <= col || (tick - col - 1) % 2 != 0 {
            return None;
        }
        let row = (tick - col - 1) / 2;
        (row < self.n).then_some(row)
    }

    /// Number of ticks spent in cleanup.
    #[must_use]
    pub fn cleanup_ticks(&self) -> usize {
        3 * self.n
    }

    /// Whether cleanup completes on tick `tick`.
    #[must_use]
    pub fn cleanup_done(&self, tick: usize) -> bool {
        tick + 1 >= self.cleanup_ticks()
    }

    /// Every grid position in row-major order.
    pub fn grid(&self) -> impl Iterator<Item = (usize, usize)> + use<> {
        iproduct!(0..self.n, 0..self.n)
    }
}
