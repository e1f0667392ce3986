// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! The host side of the shared bus.
//!
//! The host keeps a queue of [`Job`]s for every core. It answers the payload
//! beats of each load burst with the next row of the job at the head of the
//! core's queue, and collects the rows of each unload burst into a result
//! [`Tile`].
//!
//! A core that requests a load while its queue is empty is loaded with
//! nothing and computes zeros. The unload of such a pass is discarded.

use std::collections::VecDeque;
use std::rc::Rc;

use systolic_components::types::{Accumulator, CoreId, Operand};
use systolic_engine::sim_error;
use systolic_engine::types::{SimError, SimResult};
use systolic_track::entity::Entity;
use systolic_track::{debug, info, trace};

/// The operands carried by one payload beat of a load burst.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRow {
    /// One weight per column.
    pub weights: Vec<Operand>,

    /// One input per row.
    pub inputs: Vec<Operand>,
}

impl LoadRow {
    #[must_use]
    pub fn new(weights: Vec<Operand>, inputs: Vec<Operand>) -> Self {
        Self { weights, inputs }
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.weights.len()
    }
}

/// The rows read back by one unload burst, each one value per column.
pub type Tile = Vec<Vec<Accumulator>>;

/// One compute pass worth of operands for a core.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Job {
    rows: Vec<LoadRow>,
}

impl Job {
    #[must_use]
    pub fn new(rows: Vec<LoadRow>) -> Self {
        Self { rows }
    }

    /// Build the job computing `a × b` where `a` is N×K and `b` is K×N.
    ///
    /// Row `k` of the job carries column `k` of `a` as inputs and row `k` of
    /// `b` as weights.
    pub fn from_matrices(a: &[Vec<Operand>], b: &[Vec<Operand>]) -> Result<Self, SimError> {
        let n = a.len();
        let depth = b.len();
        if let Some(bad) = a.iter().position(|row| row.len() != depth) {
            return sim_error!(format!(
                "row {bad} of A has {} columns, B has {depth} rows",
                a[bad].len()
            ));
        }
        if let Some(bad) = b.iter().position(|row| row.len() != n) {
            return sim_error!(format!(
                "row {bad} of B has {} columns, A has {n} rows",
                b[bad].len()
            ));
        }

        let rows = b
            .iter()
            .enumerate()
            .map(|(k, weights)| LoadRow::new(weights.clone(), a.iter().map(|row| row[k]).collect()))
            .collect();
        Ok(Self { rows })
    }

    #[must_use]
    pub fn rows(&self) -> &[LoadRow] {
        &self.rows
    }

    /// Number of rows in the job.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.rows.len()
    }
}

pub struct HostMemory {
    pub entity: Rc<Entity>,
    n: usize,
    load_rows: usize,
    queues: Vec<VecDeque<Job>>,

    /// The job whose operands are currently held by each core.
    in_core: Vec<Option<Job>>,

    unloading: Vec<Tile>,
    results: Vec<Vec<Tile>>,
    submitted: Vec<usize>,
}

impl HostMemory {
    #[must_use]
    pub fn new(parent: &Rc<Entity>, name: &str, num_cores: usize, n: usize, load_rows: usize) -> Self {
        Self {
            entity: Rc::new(Entity::new(parent, name)),
            n,
            load_rows,
            queues: vec![VecDeque::new(); num_cores],
            in_core: vec![None; num_cores],
            unloading: vec![Vec::new(); num_cores],
            results: vec![Vec::new(); num_cores],
            submitted: vec![0; num_cores],
        }
    }

    /// Queue a job for a core.
    pub fn submit(&mut self, core: CoreId, job: Job) -> SimResult {
        if core >= self.queues.len() {
            return sim_error!(format!(
                "{}: no core{core} (there are {} cores)",
                self.entity,
                self.queues.len()
            ));
        }
        if job.depth() > self.load_rows {
            return sim_error!(format!(
                "{}: job of {} rows does not fit in a load burst of {} rows",
                self.entity,
                job.depth(),
                self.load_rows
            ));
        }
        if let Some(bad) = job
            .rows()
            .iter()
            .position(|row| row.weights.len() != self.n || row.inputs.len() != self.n)
        {
            return sim_error!(format!(
                "{}: row {bad} of job is not {} wide",
                self.entity, self.n
            ));
        }

        debug!(self.entity ; "core{} job of {} rows queued", core, job.depth());
        self.queues[core].push_back(job);
        self.submitted[core] += 1;
        Ok(())
    }

    /// The operands for payload row `row` of a load burst to `core`.
    ///
    /// Rows beyond the depth of the job are not driven.
    #[must_use]
    pub fn load_row(&self, core: CoreId, row: usize) -> Option<LoadRow> {
        self.queues[core]
            .front()
            .and_then(|job| job.rows.get(row).cloned())
    }

    pub fn finish_load(&mut self, core: CoreId) {
        let job = self.queues[core].pop_front();
        if job.is_none() {
            debug!(self.entity ; "core{} loaded with no job queued", core);
        }
        self.in_core[core] = job;
    }

    pub fn store_row(&mut self, core: CoreId, row: usize, data: Vec<Accumulator>) {
        trace!(self.entity ; "core{} row {}: {:?}", core, row, data);
        debug_assert_eq!(self.unloading[core].len(), row);
        self.unloading[core].push(data);
    }

    pub fn finish_unload(&mut self, core: CoreId) {
        let tile = std::mem::take(&mut self.unloading[core]);
        if self.in_core[core].take().is_some() {
            self.results[core].push(tile);
            info!(self.entity ; "core{} job {} complete", core, self.results[core].len());
        } else {
            debug!(self.entity ; "core{} idle pass discarded", core);
        }
    }

    /// Return jobs held by cores to the front of their queues and drop any
    /// partially unloaded rows.
    pub fn abort_transfers(&mut self) {
        for (core, job) in self.in_core.iter_mut().enumerate() {
            if let Some(job) = job.take() {
                debug!(self.entity ; "core{} job requeued", core);
                self.queues[core].push_front(job);
            }
        }
        for tile in &mut self.unloading {
            tile.clear();
        }
    }

    #[must_use]
    pub fn results(&self, core: CoreId) -> &[Tile] {
        &self.results[core]
    }

    /// Whether every submitted job has been unloaded.
    #[must_use]
    pub fn all_complete(&self) -> bool {
        self.results
            .iter()
            .zip(&self.submitted)
            .all(|(results, submitted)| results.len() == *submitted)
    }
}
