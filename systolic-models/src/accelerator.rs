// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The top level of the accelerator: the bus arbiter, the host memory and a
//! number of cores.
//!
//! Every tick is composed in a fixed order:
//!
//!  1. sample each core's registered request line,
//!  2. step the arbiter, which drives the bus from its state at the start of
//!     the tick,
//!  3. the host drives the load row addressed by the bus, if any,
//!  4. step every core,
//!  5. the host captures the unload row driven by the granted core, if any.
//!
//! No component sees another's update before the end of the tick.

use std::rc::Rc;

use systolic_components::arbiter::{Arbiter, ArbiterInputs};
use systolic_components::types::{BurstKind, BusControl, CoreId, CoreSet};
use systolic_engine::sim_error;
use systolic_engine::time::clock::ClockTick;
use systolic_engine::traits::{Clocked, Simulate};
use systolic_engine::types::{SimError, SimResult};
use systolic_track::entity::Entity;
use systolic_track::{debug, trace};

use crate::array_core::{Core, CoreInputs};
use crate::config::SystolicConfig;
use crate::host::{HostMemory, Job, Tile};

/// One beat seen on the shared bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusBeat {
    pub tick: u64,
    pub core: CoreId,
    pub kind: BurstKind,
    pub addr: usize,

    /// Payload rows announced on a header beat.
    pub burst: Option<usize>,
}

pub struct Accelerator {
    pub entity: Rc<Entity>,
    config: SystolicConfig,
    arbiter: Arbiter,
    host: HostMemory,
    cores: Vec<Core>,
    enable: bool,
    bus_log: Vec<BusBeat>,
}

impl Accelerator {
    pub fn new(parent: &Rc<Entity>, name: &str, config: &SystolicConfig) -> Result<Self, SimError> {
        config.validate()?;

        let entity = Rc::new(Entity::new(parent, name));
        let arbiter = Arbiter::new(
            &entity,
            "arbiter",
            config.num_cores,
            config.burst_lengths(),
            config.policy.build(),
        );
        let host = HostMemory::new(
            &entity,
            "host",
            config.num_cores,
            config.grid_size,
            config.load_rows(),
        );
        let cores = (0..config.num_cores)
            .map(|index| {
                Core::new(
                    &entity,
                    index,
                    config.grid_size,
                    config.mem_rows,
                    config.glb_rows,
                )
            })
            .collect();

        Ok(Self {
            entity,
            config: config.clone(),
            arbiter,
            host,
            cores,
            enable: true,
            bus_log: Vec::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &SystolicConfig {
        &self.config
    }

    /// Queue a job to be run on a core.
    pub fn submit(&mut self, core: CoreId, job: Job) -> SimResult {
        self.host.submit(core, job)
    }

    /// Drive the global enable. While low every component is held in reset
    /// and any transfer in flight is abandoned.
    pub fn set_enable(&mut self, enable: bool) {
        if self.enable != enable {
            debug!(self.entity ; "enable {}", enable);
        }
        self.enable = enable;
    }

    #[must_use]
    pub fn arbiter(&self) -> &Arbiter {
        &self.arbiter
    }

    #[must_use]
    pub fn core(&self, index: CoreId) -> &Core {
        &self.cores[index]
    }

    #[must_use]
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    #[must_use]
    pub fn host(&self) -> &HostMemory {
        &self.host
    }

    #[must_use]
    pub fn results(&self, core: CoreId) -> &[Tile] {
        self.host.results(core)
    }

    /// Every beat driven on the bus so far.
    #[must_use]
    pub fn bus_log(&self) -> &[BusBeat] {
        &self.bus_log
    }

    fn record(&mut self, now: ClockTick, bus: &BusControl) {
        if let (Some(core), Some(kind), Some(addr)) = (bus.grant, bus.direction, bus.addr) {
            trace!(self.entity ; "bus core{} {} beat {}", core, kind, addr);
            self.bus_log.push(BusBeat {
                tick: now.tick(),
                core,
                kind,
                addr,
                burst: bus.burst,
            });
        }
    }

    fn core_inputs(&self, index: CoreId, bus: &BusControl) -> CoreInputs {
        let granted = bus.grant == Some(index);
        if !granted {
            return CoreInputs {
                enable: self.enable,
                ..CoreInputs::default()
            };
        }
        CoreInputs {
            enable: self.enable,
            grant: true,
            burst: bus.burst,
            direction: bus.direction,
            data: bus
                .payload_row(BurstKind::Load)
                .and_then(|row| self.host.load_row(index, row)),
        }
    }
}

impl Simulate for Accelerator {
    fn tick(&mut self, now: ClockTick) -> SimResult {
        let requests: CoreSet = self
            .cores
            .iter()
            .filter(|core| core.request())
            .map(Core::index)
            .collect();

        let bus = self.arbiter.step(&ArbiterInputs {
            enable: self.enable,
            requests,
        });
        if !self.enable {
            self.host.abort_transfers();
        }
        self.record(now, &bus);

        let inputs: Vec<_> = (0..self.cores.len())
            .map(|index| self.core_inputs(index, &bus))
            .collect();
        for (core, inputs) in self.cores.iter_mut().zip(&inputs) {
            let Some(row) = core.step(inputs) else {
                continue;
            };
            let index = core.index();
            match bus.payload_row(BurstKind::Unload) {
                Some(addr) if bus.grant == Some(index) => self.host.store_row(index, addr, row),
                _ => {
                    return sim_error!(format!(
                        "{}: core{index} drove the bus without an unload grant",
                        self.entity
                    ));
                }
            }
        }

        if let (Some(core), Some(kind), Some(addr)) = (bus.grant, bus.direction, bus.addr) {
            if addr + 1 == self.config.burst_lengths().length_of(kind) {
                match kind {
                    BurstKind::Load => self.host.finish_load(core),
                    BurstKind::Unload => self.host.finish_unload(core),
                }
            }
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.host.all_complete()
    }
}
