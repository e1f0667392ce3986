// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Grant bursts on the shared bus to a number of cores.
//!
//! The arbiter cycles through `RESET → IDLE → LOCK → SELECT → TRANSFER`:
//!  - `IDLE` samples every asserted request line into the pending set in one
//!    tick, so requests that arrive together are serviced as one round.
//!  - `LOCK` moves to `SELECT` while the round still has pending cores.
//!    Otherwise it waits for the cores serviced this round to release their
//!    request lines and then returns to `IDLE`.
//!  - `SELECT` uses the [`Arbitrate`] policy to choose one pending core. The
//!    core's bit in the load mask decides whether the burst is a load (bit
//!    clear) or an unload (bit set), and the bit is toggled.
//!  - `TRANSFER` drives the bus for the fixed length of the burst and then
//!    removes the core from the pending set, returning to `SELECT` if there
//!    are more pending cores or `LOCK` if there are none.
//!
//! A core that has just been serviced is not sampled again until it has
//! deasserted its request line for at least one tick.
//!
//! # Bus signals
//!
//! During the `L` ticks of a transfer the arbiter drives the grant, the
//! direction and an address counting beats from 0. Beat 0 is the header: it
//! is the only beat on which the burst-length output is driven, carrying the
//! number of payload rows (`L - 1`) that follow. On every other tick the bus
//! signals are not driven.

use std::rc::Rc;

use systolic_engine::traits::Clocked;
use systolic_track::entity::Entity;
use systolic_track::{debug, trace, warn};

use crate::types::{BurstKind, BurstLengths, BurstRequest, BusControl, CoreId, CoreSet};

pub mod policy;

/// Choose the next core to be granted.
pub trait Arbitrate {
    /// Pick one core from the `pending` set.
    fn arbitrate(&mut self, entity: &Rc<Entity>, pending: CoreSet) -> Option<CoreId>;

    /// Forget any history the policy keeps.
    fn reset(&mut self) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArbiterPhase {
    #[default]
    Reset,
    Idle,
    Lock,
    Select,
    Transfer,
}

/// All registers held by the [`Arbiter`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArbiterState {
    pub phase: ArbiterPhase,

    /// Cores whose next burst is an unload.
    pub load_mask: CoreSet,

    /// Cores sampled in `IDLE` that have not yet been serviced this round.
    pub pending_requests: CoreSet,

    /// Cores that have been serviced and have not yet released their
    /// request.
    pub serviced: CoreSet,

    pub active_grant: Option<BurstRequest>,

    /// Beats of the active grant completed so far.
    pub beat: usize,
}

/// Sampled at the start of each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArbiterInputs {
    pub enable: bool,
    pub requests: CoreSet,
}

pub struct Arbiter {
    pub entity: Rc<Entity>,
    num_cores: usize,
    lengths: BurstLengths,
    policy: Box<dyn Arbitrate>,
    state: ArbiterState,
}

impl Arbiter {
    #[must_use]
    pub fn new(
        parent: &Rc<Entity>,
        name: &str,
        num_cores: usize,
        lengths: BurstLengths,
        policy: Box<dyn Arbitrate>,
    ) -> Self {
        debug_assert!(num_cores <= CoreSet::MAX_CORES);
        debug_assert!(lengths.write > 0 && lengths.read > 0);
        Self {
            entity: Rc::new(Entity::new(parent, name)),
            num_cores,
            lengths,
            policy,
            state: ArbiterState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ArbiterState {
        &self.state
    }

    /// The bus signals driven from the current state.
    #[must_use]
    pub fn outputs(&self) -> BusControl {
        match (self.state.phase, self.state.active_grant) {
            (ArbiterPhase::Transfer, Some(grant)) => BusControl {
                grant: Some(grant.core_id),
                burst: (self.state.beat == 0).then(|| grant.length - 1),
                addr: Some(self.state.beat),
                direction: Some(grant.kind),
            },
            _ => BusControl::default(),
        }
    }

    fn enter(&mut self, phase: ArbiterPhase) {
        trace!(self.entity ; "{:?} -> {:?}", self.state.phase, phase);
        self.state.phase = phase;
    }

    fn sample(&mut self, requests: CoreSet) {
        let fresh = requests.difference(self.state.serviced);
        if !fresh.is_empty() {
            debug!(self.entity ; "sampled requests {}", fresh);
            self.state.pending_requests = fresh;
            self.enter(ArbiterPhase::Lock);
        }
    }

    fn select(&mut self) {
        let pending = self.state.pending_requests;
        let Some(core_id) = self.policy.arbitrate(&self.entity, pending) else {
            warn!(self.entity ; "policy chose nothing from {}", pending);
            self.enter(ArbiterPhase::Lock);
            return;
        };
        debug_assert!(pending.contains(core_id), "core{core_id} was not pending");

        let kind = if self.state.load_mask.contains(core_id) {
            self.state.load_mask.remove(core_id);
            BurstKind::Unload
        } else {
            self.state.load_mask.insert(core_id);
            BurstKind::Load
        };
        let grant = BurstRequest {
            core_id,
            kind,
            length: self.lengths.length_of(kind),
        };
        debug!(self.entity ; "grant {}", grant);

        self.state.active_grant = Some(grant);
        self.state.beat = 0;
        self.enter(ArbiterPhase::Transfer);
    }

    fn transfer(&mut self) {
        let Some(grant) = self.state.active_grant else {
            self.enter(ArbiterPhase::Lock);
            return;
        };

        trace!(self.entity ; "core{} {} beat {}", grant.core_id, grant.kind, self.state.beat);
        self.state.beat += 1;
        if self.state.beat < grant.length {
            return;
        }

        debug!(self.entity ; "core{} {} complete", grant.core_id, grant.kind);
        self.state.pending_requests.remove(grant.core_id);
        self.state.serviced.insert(grant.core_id);
        self.state.active_grant = None;
        self.state.beat = 0;
        if self.state.pending_requests.is_empty() {
            self.enter(ArbiterPhase::Lock);
        } else {
            self.enter(ArbiterPhase::Select);
        }
    }
}

impl Clocked for Arbiter {
    type Inputs = ArbiterInputs;
    type Outputs = BusControl;

    fn step(&mut self, inputs: &ArbiterInputs) -> BusControl {
        if !inputs.enable {
            if self.state != ArbiterState::default() {
                debug!(self.entity ; "disabled");
            }
            self.reset();
            return BusControl::default();
        }

        let driven = self.outputs();
        let requests = inputs.requests;
        debug_assert!(
            requests.iter().all(|core| core < self.num_cores),
            "request from unknown core in {requests}"
        );

        self.state.serviced = self.state.serviced.intersection(requests);

        match self.state.phase {
            ArbiterPhase::Reset => self.enter(ArbiterPhase::Idle),
            ArbiterPhase::Idle => self.sample(requests),
            ArbiterPhase::Lock => {
                if !self.state.pending_requests.is_empty() {
                    self.enter(ArbiterPhase::Select);
                } else if self.state.serviced.is_empty() {
                    self.enter(ArbiterPhase::Idle);
                }
            }
            ArbiterPhase::Select => self.select(),
            ArbiterPhase::Transfer => self.transfer(),
        }
        driven
    }

    fn reset(&mut self) {
        self.state = ArbiterState::default();
        self.policy.reset();
    }
}
