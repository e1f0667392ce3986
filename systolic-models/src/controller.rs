// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The per-core dataflow controller.
//!
//! The controller sequences a core through a fixed cycle of phases:
//!
//! ```text
//! RESET -> LOAD -> DISTRIBUTE -> COMPUTE -> CLEANUP -> UNLOAD -> RESET
//! ```
//!
//! It owns only control registers. Each tick it returns the
//! [`ControlSignals`] that the [core datapath](crate::array_core::Core) applies to
//! its storage units and processing elements.
//!
//!  - `RESET`: the first tick returns every register to its power-on value
//!    and raises the bus request, which is held until a load burst is
//!    granted. The grant arrives with the burst header, whose row count is
//!    captured on the way into `LOAD`.
//!  - `LOAD`: each payload beat is written into every row unit at the row
//!    address.
//!  - `DISTRIBUTE`: the request is dropped. Row unit `i` starts reading on
//!    tick `i` and PEs join the computation one delay group per tick.
//!  - `COMPUTE`: all PEs accumulate until the last row unit has streamed its
//!    final row.
//!  - `CLEANUP`: results are drained into the output buffers along the
//!    reverse wavefront (see [`Wavefront`]).
//!  - `UNLOAD`: the request is raised and, once granted, one output buffer
//!    row is driven onto the bus per payload beat.
//!
//! `transfer_done` is a one-shot pulse that is high for the first tick of the
//! phase following a completed transfer.

use std::fmt;
use std::rc::Rc;

use systolic_components::pe::PeMode;
use systolic_components::storage::UnitAccess;
use systolic_components::types::BurstKind;
use systolic_engine::traits::Clocked;
use systolic_track::entity::Entity;
use systolic_track::{debug, trace, value};

use crate::wavefront::Wavefront;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Reset,
    Load,
    Distribute,
    Compute,
    Cleanup,
    Unload,
}

impl Phase {
    /// The numeric code of the phase as seen in traces.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            Phase::Reset => 0,
            Phase::Load => 1,
            Phase::Distribute => 2,
            Phase::Compute => 3,
            Phase::Cleanup => 4,
            Phase::Unload => 5,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Phase::Reset => "RESET",
            Phase::Load => "LOAD",
            Phase::Distribute => "DISTRIBUTE",
            Phase::Compute => "COMPUTE",
            Phase::Cleanup => "CLEANUP",
            Phase::Unload => "UNLOAD",
        };
        write!(f, "{name}")
    }
}

/// Sampled at the start of each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerInputs {
    pub enable: bool,

    /// This core owns the bus.
    pub grant: bool,

    /// Payload rows announced by the burst header.
    pub burst: Option<usize>,

    pub direction: Option<BurstKind>,
}

/// Everything the controller drives during one tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlSignals {
    /// Return all storage and PEs to their power-on state.
    pub clear: bool,

    /// Control of weight and input memory `i` (they share one control).
    pub rows: Vec<UnitAccess>,

    /// Control of output buffer `i`.
    pub glbs: Vec<UnitAccess>,

    /// Mode of each PE, row-major.
    pub pes: Vec<PeMode>,

    /// Shift operands one hop through the grid.
    pub shift_operands: bool,

    /// Drive the output buffer reads onto the bus.
    pub drive_bus: bool,

    pub transfer_done: bool,
}

impl ControlSignals {
    fn inactive(n: usize) -> Self {
        Self {
            clear: false,
            rows: vec![UnitAccess::Off; n],
            glbs: vec![UnitAccess::Off; n],
            pes: vec![PeMode::Idle; n * n],
            shift_operands: false,
            drive_bus: false,
            transfer_done: false,
        }
    }
}

/// All registers held by the [`DataflowController`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerState {
    pub phase: Phase,

    /// Ticks (or beats) spent in the current phase.
    pub counter: usize,

    /// Rows announced by the header of the current burst.
    pub expected_rows: Option<usize>,

    pub request: bool,

    pub transfer_done: bool,

    /// Read address of each row unit, `None` until the unit is activated.
    pub row_addr: Vec<Option<usize>>,

    /// Capture address of each output buffer.
    pub glb_addr: Vec<usize>,
}

impl ControllerState {
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            phase: Phase::Reset,
            counter: 0,
            expected_rows: None,
            request: false,
            transfer_done: false,
            row_addr: vec![None; n],
            glb_addr: vec![0; n],
        }
    }
}

pub struct DataflowController {
    pub entity: Rc<Entity>,
    wavefront: Wavefront,
    state: ControllerState,
}

impl DataflowController {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str, n: usize) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
            wavefront: Wavefront::new(n),
            state: ControllerState::new(n),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// The registered bus request line.
    #[must_use]
    pub fn request(&self) -> bool {
        self.state.request
    }

    #[must_use]
    pub fn wavefront(&self) -> &Wavefront {
        &self.wavefront
    }

    fn n(&self) -> usize {
        self.wavefront.grid_size()
    }

    fn enter(&mut self, phase: Phase) {
        debug!(self.entity ; "{} -> {}", self.state.phase, phase);
        value!(self.entity ; phase.code());
        self.state.phase = phase;
        self.state.counter = 0;
    }

    fn complete(&mut self, next: Phase) {
        self.state.transfer_done = true;
        self.enter(next);
    }

    fn expected_rows(&self) -> usize {
        self.state.expected_rows.unwrap_or(0)
    }

    fn reset_phase(&mut self, inputs: &ControllerInputs, signals: &mut ControlSignals) {
        signals.clear = true;
        if self.state.counter == 0 {
            self.state = ControllerState {
                counter: 1,
                request: true,
                ..ControllerState::new(self.n())
            };
            return;
        }

        // The burst length output is only driven on the header beat, so it is
        // latched here as the controller leaves RESET.
        if inputs.grant {
            debug_assert_eq!(inputs.direction, Some(BurstKind::Load));
            if let Some(rows) = inputs.burst {
                debug!(self.entity ; "load of {} rows granted", rows);
                self.state.expected_rows = Some(rows);
                self.enter(Phase::Load);
            }
        }
    }

    fn load_phase(&mut self, inputs: &ControllerInputs, signals: &mut ControlSignals) {
        if self.state.counter >= self.expected_rows() {
            self.state.request = false;
            self.complete(Phase::Distribute);
            return;
        }

        if inputs.grant {
            debug_assert_eq!(inputs.direction, Some(BurstKind::Load));
            signals.rows.fill(UnitAccess::Write(self.state.counter));
            self.state.counter += 1;
        }
    }

    /// Drive every activated row unit that has rows left to read.
    fn stream_rows(&mut self, signals: &mut ControlSignals) {
        let expected = self.expected_rows();
        for (unit, addr) in self.state.row_addr.iter_mut().enumerate() {
            match addr {
                Some(current) if *current < expected => {
                    signals.rows[unit] = UnitAccess::Read(*current);
                    *current += 1;
                }
                _ => signals.rows[unit] = UnitAccess::Off,
            }
        }
    }

    fn distribute_phase(&mut self, signals: &mut ControlSignals) {
        let tick = self.state.counter;
        for (unit, addr) in self.state.row_addr.iter_mut().enumerate() {
            if addr.is_none() && Wavefront::row_unit_active(unit, tick) {
                trace!(self.entity ; "row unit {} active", unit);
                *addr = Some(0);
            }
        }

        signals.pes = self.wavefront.distribute_modes(tick);
        signals.glbs.fill(UnitAccess::Stalled);
        signals.shift_operands = true;
        self.stream_rows(signals);

        if self.wavefront.distribute_done(tick) {
            self.complete(Phase::Compute);
        } else {
            self.state.counter += 1;
        }
    }

    fn compute_phase(&mut self, signals: &mut ControlSignals) {
        let expected = self.expected_rows();
        signals.pes.fill(PeMode::Accumulate);
        signals.glbs.fill(UnitAccess::Stalled);
        signals.shift_operands = true;

        // The last unit to be activated is the last to finish.
        let lagging = self.n() - 1;
        if self.state.row_addr[lagging].is_some_and(|addr| addr >= expected) {
            debug_assert!(
                self.state
                    .row_addr
                    .iter()
                    .all(|addr| addr.is_some_and(|addr| addr >= expected)),
                "row units out of step: {:?}",
                self.state.row_addr
            );
            self.complete(Phase::Cleanup);
            return;
        }

        self.stream_rows(signals);
        self.state.counter += 1;
    }

    fn cleanup_phase(&mut self, signals: &mut ControlSignals) {
        let tick = self.state.counter;
        signals.pes = self.wavefront.cleanup_modes(tick);
        signals.rows.fill(UnitAccess::Stalled);
        signals.shift_operands = true;

        for (col, addr) in self.state.glb_addr.iter_mut().enumerate() {
            signals.glbs[col] = match self.wavefront.capture_row(col, tick) {
                Some(row) => {
                    debug_assert_eq!(row, *addr);
                    let access = UnitAccess::Write(*addr);
                    *addr += 1;
                    access
                }
                None => UnitAccess::Stalled,
            };
        }

        if self.wavefront.cleanup_done(tick) {
            self.state.request = true;
            self.state.expected_rows = None;
            self.complete(Phase::Unload);
        } else {
            self.state.counter += 1;
        }
    }

    fn unload_phase(&mut self, inputs: &ControllerInputs, signals: &mut ControlSignals) {
        signals.glbs.fill(UnitAccess::Stalled);
        match self.state.expected_rows {
            None => {
                if inputs.grant {
                    debug_assert_eq!(inputs.direction, Some(BurstKind::Unload));
                    if let Some(rows) = inputs.burst {
                        debug!(self.entity ; "unload of {} rows granted", rows);
                        self.state.expected_rows = Some(rows);
                        self.state.counter = 0;
                    }
                }
            }
            Some(rows) => {
                if self.state.counter >= rows {
                    self.state.request = false;
                    self.complete(Phase::Reset);
                } else if inputs.grant {
                    debug_assert_eq!(inputs.direction, Some(BurstKind::Unload));
                    signals.glbs.fill(UnitAccess::Read(self.state.counter));
                    signals.drive_bus = true;
                    self.state.counter += 1;
                }
            }
        }
    }
}

impl Clocked for DataflowController {
    type Inputs = ControllerInputs;
    type Outputs = ControlSignals;

    fn step(&mut self, inputs: &ControllerInputs) -> ControlSignals {
        let mut signals = ControlSignals::inactive(self.n());

        if !inputs.enable {
            if self.state != ControllerState::new(self.n()) {
                debug!(self.entity ; "disabled in {}", self.state.phase);
            }
            self.reset();
            signals.clear = true;
            return signals;
        }

        signals.transfer_done = self.state.transfer_done;
        self.state.transfer_done = false;

        match self.state.phase {
            Phase::Reset => self.reset_phase(inputs, &mut signals),
            Phase::Load => self.load_phase(inputs, &mut signals),
            Phase::Distribute => self.distribute_phase(&mut signals),
            Phase::Compute => self.compute_phase(&mut signals),
            Phase::Cleanup => self.cleanup_phase(&mut signals),
            Phase::Unload => self.unload_phase(inputs, &mut signals),
        }
        signals
    }

    fn reset(&mut self) {
        self.state = ControllerState::new(self.n());
    }
}
