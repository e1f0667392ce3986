// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! One accelerator core: local memories, the PE grid and its controller.
//!
//! The [`DataflowController`] decides what happens each tick, the core
//! applies those decisions to its datapath. Within a tick the datapath is
//! updated in a fixed order:
//!
//!  1. row units read or write their memories,
//!  2. operands shift one hop (weights down, inputs right),
//!  3. every PE applies its mode,
//!  4. output buffers capture what row 0 forwarded on the previous tick, or
//!     drive a row onto the bus.
//!
//! Each PE reads its neighbours' registers as they were at the start of the
//! tick.

use std::rc::Rc;

use systolic_components::pe::{PeMode, ProcessingElement};
use systolic_components::storage::{Storage, UnitAccess};
use systolic_components::types::{Accumulator, BurstKind, CoreId, Operand};
use systolic_engine::traits::Clocked;
use systolic_track::entity::Entity;
use systolic_track::trace;

use crate::controller::{ControlSignals, ControllerInputs, ControllerState, DataflowController};
use crate::host::LoadRow;

/// The signals seen by a core on one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CoreInputs {
    pub enable: bool,
    pub grant: bool,
    pub burst: Option<usize>,
    pub direction: Option<BurstKind>,

    /// The load row on the bus, if the host is driving one.
    pub data: Option<LoadRow>,
}

/// A copy of every register in a core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreSnapshot {
    pub controller: ControllerState,
    pub weights: Vec<Storage<Operand>>,
    pub inputs: Vec<Storage<Operand>>,
    pub glbs: Vec<Storage<Accumulator>>,
    pub grid: Vec<ProcessingElement>,
}

pub struct Core {
    pub entity: Rc<Entity>,
    index: CoreId,
    n: usize,
    controller: DataflowController,
    weights: Vec<Storage<Operand>>,
    inputs: Vec<Storage<Operand>>,
    glbs: Vec<Storage<Accumulator>>,
    grid: Vec<ProcessingElement>,
}

impl Core {
    #[must_use]
    pub fn new(
        parent: &Rc<Entity>,
        index: CoreId,
        n: usize,
        mem_rows: usize,
        glb_rows: usize,
    ) -> Self {
        let entity = Rc::new(Entity::new(parent, &format!("core{index}")));
        let controller = DataflowController::new(&entity, "ctrl", n);
        Self {
            entity,
            index,
            n,
            controller,
            weights: vec![Storage::new(mem_rows); n],
            inputs: vec![Storage::new(mem_rows); n],
            glbs: vec![Storage::new(glb_rows); n],
            grid: vec![ProcessingElement::new(); n * n],
        }
    }

    #[must_use]
    pub fn index(&self) -> CoreId {
        self.index
    }

    /// The registered bus request line.
    #[must_use]
    pub fn request(&self) -> bool {
        self.controller.request()
    }

    #[must_use]
    pub fn controller(&self) -> &DataflowController {
        &self.controller
    }

    #[must_use]
    pub fn pe(&self, row: usize, col: usize) -> &ProcessingElement {
        &self.grid[row * self.n + col]
    }

    /// The contents of the output buffer of column `col`.
    #[must_use]
    pub fn output_buffer(&self, col: usize) -> &[Accumulator] {
        self.glbs[col].contents()
    }

    #[must_use]
    pub fn snapshot(&self) -> CoreSnapshot {
        CoreSnapshot {
            controller: self.controller.state().clone(),
            weights: self.weights.clone(),
            inputs: self.inputs.clone(),
            glbs: self.glbs.clone(),
            grid: self.grid.clone(),
        }
    }

    fn clear(&mut self) {
        for mem in self.weights.iter_mut().chain(self.inputs.iter_mut()) {
            mem.clear_all();
        }
        for glb in &mut self.glbs {
            glb.clear_all();
        }
        for pe in &mut self.grid {
            pe.clear();
        }
    }

    /// Apply the row unit controls, returning the operands read at the top
    /// and left edges of the grid.
    fn drive_rows(
        &mut self,
        rows: &[UnitAccess],
        data: Option<&LoadRow>,
    ) -> (Vec<Option<Operand>>, Vec<Option<Operand>>) {
        let mut weight_edge = vec![None; self.n];
        let mut input_edge = vec![None; self.n];
        for (unit, access) in rows.iter().enumerate() {
            match *access {
                UnitAccess::Read(addr) => {
                    weight_edge[unit] = Some(self.weights[unit].read(addr));
                    input_edge[unit] = Some(self.inputs[unit].read(addr));
                }
                UnitAccess::Write(addr) => {
                    if let Some(row) = data {
                        debug_assert_eq!(row.width(), self.n);
                        self.weights[unit].write(addr, row.weights[unit]);
                        self.inputs[unit].write(addr, row.inputs[unit]);
                    }
                }
                UnitAccess::Off | UnitAccess::Stalled => {}
            }
        }
        (weight_edge, input_edge)
    }

    fn shift_operands(&mut self, weight_edge: &[Option<Operand>], input_edge: &[Option<Operand>]) {
        let n = self.n;
        let old: Vec<_> = self.grid.iter().map(|pe| (pe.weight(), pe.input())).collect();
        for (index, pe) in self.grid.iter_mut().enumerate() {
            let (row, col) = (index / n, index % n);
            let weight = if row == 0 {
                weight_edge[col]
            } else {
                old[index - n].0
            };
            let input = if col == 0 {
                input_edge[row]
            } else {
                old[index - 1].1
            };
            pe.configure(weight, input);
        }
    }

    /// Apply the PE modes. Returns the forward registers of row 0 as they
    /// were before this tick.
    fn apply_modes(&mut self, modes: &[PeMode]) -> Vec<Option<Accumulator>> {
        let n = self.n;
        let forwards: Vec<_> = self.grid.iter().map(ProcessingElement::forward).collect();
        for (index, (pe, mode)) in self.grid.iter_mut().zip(modes).enumerate() {
            match mode {
                PeMode::Idle => {}
                PeMode::Accumulate => pe.accumulate(),
                PeMode::Emit => {
                    let value = pe.emit();
                    trace!(self.entity ; "pe({},{}) emits {}", index / n, index % n, value);
                }
                PeMode::Relay => {
                    let below = forwards.get(index + n).copied().flatten();
                    pe.relay(below);
                }
                PeMode::Clear => pe.clear(),
            }
        }
        forwards[..n].to_vec()
    }

    fn drive_glbs(
        &mut self,
        glbs: &[UnitAccess],
        drained: &[Option<Accumulator>],
    ) -> Vec<Option<Accumulator>> {
        let mut out = vec![None; self.n];
        for (col, access) in glbs.iter().enumerate() {
            match *access {
                UnitAccess::Write(addr) => {
                    debug_assert!(drained[col].is_some(), "glb{col} capture with nothing drained");
                    if let Some(value) = drained[col] {
                        trace!(self.entity ; "glb{} captures {} at {}", col, value, addr);
                        self.glbs[col].write_accumulate(addr, value);
                    }
                }
                UnitAccess::Read(addr) => out[col] = Some(self.glbs[col].read(addr)),
                UnitAccess::Off | UnitAccess::Stalled => {}
            }
        }
        out
    }

    fn apply(&mut self, signals: &ControlSignals, data: Option<&LoadRow>) -> Option<Vec<Accumulator>> {
        if signals.clear {
            self.clear();
            return None;
        }

        let (weight_edge, input_edge) = self.drive_rows(&signals.rows, data);
        if signals.shift_operands {
            self.shift_operands(&weight_edge, &input_edge);
        }
        let drained = self.apply_modes(&signals.pes);
        let out = self.drive_glbs(&signals.glbs, &drained);

        if signals.drive_bus {
            out.into_iter().collect()
        } else {
            None
        }
    }
}

impl Clocked for Core {
    type Inputs = CoreInputs;

    /// The output buffer row driven onto the bus, if any.
    type Outputs = Option<Vec<Accumulator>>;

    fn step(&mut self, inputs: &CoreInputs) -> Option<Vec<Accumulator>> {
        let signals = self.controller.step(&ControllerInputs {
            enable: inputs.enable,
            grant: inputs.grant,
            burst: inputs.burst,
            direction: inputs.direction,
        });
        self.apply(&signals, inputs.data.as_ref())
    }

    fn reset(&mut self) {
        self.controller.reset();
        self.clear();
    }
}
