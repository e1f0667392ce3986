// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Run random matrix multiplies through a configured accelerator.
//!
//! Every core is given `--jobs` jobs of random depth. Once all results have
//! been unloaded they are checked against a reference multiply.

use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use systolic_components::types::{Accumulator, Operand};
use systolic_engine::engine::Engine;
use systolic_engine::sim_error;
use systolic_engine::types::SimError;
use systolic_models::accelerator::Accelerator;
use systolic_models::config::SystolicConfig;
use systolic_models::host::Job;
use systolic_models::reference::matmul;
use systolic_track::builder::{TrackerConfig, setup_trackers};
use systolic_track::entity::Entity;
use systolic_track::{error, info};

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Systolic accelerator evaluation application")]
struct Cli {
    /// Enable logging to the console.
    #[arg(long, default_value = "false")]
    stdout: bool,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    stdout_filter_regex: String,

    /// A TOML file of accelerator configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// The number of jobs to run on each core.
    #[arg(long, default_value = "4")]
    jobs: usize,

    /// Seed for the random operands.
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Tick limit after which the simulation is considered deadlocked.
    #[arg(long, default_value = "1000000")]
    max_ticks: u64,
}

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Vec<Vec<Operand>> {
    (0..rows)
        .map(|_| (0..cols).map(|_| rng.r#gen()).collect())
        .collect()
}

fn check_results(
    top: &Rc<Entity>,
    accel: &Accelerator,
    expected: &[Vec<Vec<Vec<Accumulator>>>],
) -> usize {
    let mut failures = 0;
    for (core, tiles) in expected.iter().enumerate() {
        for (job, (actual, expected)) in accel.results(core).iter().zip(tiles).enumerate() {
            if actual != expected {
                error!(top ; "core{} job {}: got {:?}, expected {:?}", core, job, actual, expected);
                failures += 1;
            }
        }
    }
    failures
}

fn main() -> Result<(), SimError> {
    let args = Cli::parse();
    let tracker = setup_trackers(&TrackerConfig {
        enable: args.stdout,
        level: args.stdout_level,
        filter_regex: &args.stdout_filter_regex,
        file: None,
    })
    .map_err(|e| SimError(e.to_string()))?;

    let config = SystolicConfig::load(args.config.as_deref())?;
    let mut engine = Engine::new(&tracker);
    let top = engine.top().clone();
    let mut accel = Accelerator::new(&top, "accel", &config)?;

    let n = config.grid_size;
    if config.load_rows() == 0 {
        return sim_error!("load bursts must carry at least one row");
    }
    let unload_rows = config.unload_rows();
    if unload_rows < n {
        info!(top ; "Unload bursts carry {} of {} result rows", unload_rows, n);
    }

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut expected = vec![Vec::new(); config.num_cores];
    for _ in 0..args.jobs {
        for (core, tiles) in expected.iter_mut().enumerate() {
            let depth = rng.gen_range(1..=config.load_rows());
            let a = random_matrix(&mut rng, n, depth);
            let b = random_matrix(&mut rng, depth, n);
            accel.submit(core, Job::from_matrices(&a, &b)?)?;

            let mut tile = matmul(&a, &b);
            tile.resize(unload_rows, vec![0; n]);
            tiles.push(tile);
        }
    }
    info!(top ;
        "Running {} jobs on each of {} cores: {}x{} grid, {:?} arbitration",
        args.jobs, config.num_cores, n, n, config.policy
    );

    engine.run_until_finished(&mut accel, args.max_ticks)?;

    let failures = check_results(&top, &accel, &expected);
    let beats = accel.bus_log().len();
    info!(top ;
        "Completed in {:.2}ns with {} bus beats",
        engine.time_now_ns(),
        beats
    );
    tracker.shutdown();

    if failures > 0 {
        return sim_error!(format!("{failures} results did not match"));
    }
    println!(
        "Pass: {} jobs in {:.2}ns ({} bus beats)",
        args.jobs * config.num_cores,
        engine.time_now_ns(),
        beats
    );
    Ok(())
}
