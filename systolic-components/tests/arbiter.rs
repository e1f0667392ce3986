// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use systolic_components::arbiter::policy::PolicyKind;
use systolic_components::arbiter::{Arbiter, ArbiterInputs, ArbiterPhase, ArbiterState};
use systolic_components::types::{BurstKind, BurstLengths, BusControl, CoreSet};
use systolic_engine::test_helpers::start_test;
use systolic_engine::traits::Clocked;

const LENGTHS: BurstLengths = BurstLengths { write: 3, read: 2 };

fn requests(cores: &[usize]) -> ArbiterInputs {
    ArbiterInputs {
        enable: true,
        requests: cores.iter().copied().collect(),
    }
}

/// Cores that keep requesting, dropping their request for one tick after
/// each of their bursts completes.
struct Requesters {
    lengths: BurstLengths,
    released: CoreSet,
    num_cores: usize,
}

impl Requesters {
    fn new(num_cores: usize) -> Self {
        Self {
            lengths: LENGTHS,
            released: CoreSet::empty(),
            num_cores,
        }
    }

    fn inputs(&self) -> ArbiterInputs {
        ArbiterInputs {
            enable: true,
            requests: (0..self.num_cores)
                .filter(|core| !self.released.contains(*core))
                .collect(),
        }
    }

    fn observe(&mut self, bus: &BusControl) {
        self.released = CoreSet::empty();
        if let (Some(core), Some(kind), Some(addr)) = (bus.grant, bus.direction, bus.addr) {
            if addr + 1 == self.lengths.length_of(kind) {
                self.released.insert(core);
            }
        }
    }
}

/// Run the arbiter and return the (core, kind, rows) of every burst header.
fn headers(arbiter: &mut Arbiter, num_cores: usize, ticks: usize) -> Vec<(usize, BurstKind, usize)> {
    let mut cores = Requesters::new(num_cores);
    let mut seen = Vec::new();
    for _ in 0..ticks {
        let bus = arbiter.step(&cores.inputs());
        if let (Some(core), Some(kind), Some(rows)) = (bus.grant, bus.direction, bus.burst) {
            seen.push((core, kind, rows));
        }
        cores.observe(&bus);
    }
    seen
}

#[test]
fn single_core_load_then_unload() {
    let engine = start_test(file!());
    let mut arbiter = Arbiter::new(engine.top(), "arbiter", 1, LENGTHS, PolicyKind::FixedPriority.build());

    // Reset, Idle (sample), Lock, Select
    for _ in 0..4 {
        assert_eq!(arbiter.step(&requests(&[0])), BusControl::default());
    }
    assert_eq!(arbiter.state().phase, ArbiterPhase::Transfer);

    let beats: Vec<_> = (0..3).map(|_| arbiter.step(&requests(&[0]))).collect();
    for (addr, beat) in beats.iter().enumerate() {
        assert_eq!(beat.grant, Some(0));
        assert_eq!(beat.addr, Some(addr));
        assert_eq!(beat.direction, Some(BurstKind::Load));
    }
    assert_eq!(beats[0].burst, Some(2));
    assert_eq!(beats[1].burst, None);
    assert!(arbiter.state().load_mask.contains(0));

    // Still requesting: the serviced core is not granted again.
    for _ in 0..5 {
        assert_eq!(arbiter.step(&requests(&[0])), BusControl::default());
        assert_eq!(arbiter.state().phase, ArbiterPhase::Lock);
    }

    // Releasing the request lets the arbiter return to idle.
    arbiter.step(&requests(&[]));
    assert_eq!(arbiter.state().phase, ArbiterPhase::Idle);

    // Idle, Lock, Select, then the unload burst.
    for _ in 0..3 {
        assert_eq!(arbiter.step(&requests(&[0])), BusControl::default());
    }
    let header = arbiter.step(&requests(&[0]));
    assert_eq!(header.direction, Some(BurstKind::Unload));
    assert_eq!(header.burst, Some(1));
    let last = arbiter.step(&requests(&[0]));
    assert_eq!(last.addr, Some(1));
    assert!(!arbiter.state().load_mask.contains(0));
}

#[test]
fn fixed_priority_serves_highest_first() {
    let engine = start_test(file!());
    let mut arbiter = Arbiter::new(engine.top(), "arbiter", 4, LENGTHS, PolicyKind::FixedPriority.build());

    let seen = headers(&mut arbiter, 4, 60);
    let expected: Vec<_> = [3, 2, 1, 0]
        .into_iter()
        .map(|core| (core, BurstKind::Load, 2))
        .chain([3, 2, 1, 0].into_iter().map(|core| (core, BurstKind::Unload, 1)))
        .collect();
    assert_eq!(seen[..8], expected[..]);
}

#[test]
fn round_robin_takes_turns() {
    let engine = start_test(file!());
    let mut arbiter = Arbiter::new(engine.top(), "arbiter", 3, LENGTHS, PolicyKind::RoundRobin.build());

    let seen = headers(&mut arbiter, 3, 60);
    let cores: Vec<_> = seen.iter().map(|(core, _, _)| *core).take(6).collect();
    assert_eq!(cores, vec![0, 1, 2, 0, 1, 2]);
}

#[test]
fn bursts_are_exclusive_and_alternate() {
    let engine = start_test(file!());
    let num_cores = 4;
    let mut arbiter = Arbiter::new(engine.top(), "arbiter", num_cores, LENGTHS, PolicyKind::FixedPriority.build());
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let mut next_kind = vec![BurstKind::Load; num_cores];
    let mut in_flight: Option<(usize, BurstKind, usize)> = None;
    let mut grants = 0;

    for _ in 0..5000 {
        let inputs = ArbiterInputs {
            enable: true,
            requests: (0..num_cores).filter(|_| rng.gen_bool(0.6)).collect(),
        };
        let bus = arbiter.step(&inputs);

        match (in_flight, bus.grant) {
            (None, None) => {}
            (None, Some(core)) => {
                // A new burst always starts with its header.
                let kind = bus.direction.unwrap();
                assert_eq!(bus.addr, Some(0));
                assert_eq!(kind, next_kind[core]);
                // The mask was toggled when the core was selected.
                assert_eq!(arbiter.state().load_mask.contains(core), kind == BurstKind::Load);
                assert_eq!(bus.burst, Some(LENGTHS.length_of(kind) - 1));
                next_kind[core] = match kind {
                    BurstKind::Load => BurstKind::Unload,
                    BurstKind::Unload => BurstKind::Load,
                };
                grants += 1;
                in_flight = Some((core, kind, 1));
            }
            (Some((core, kind, beat)), grant) => {
                // No other core may take the bus mid-burst.
                assert_eq!(grant, Some(core));
                assert_eq!(bus.direction, Some(kind));
                assert_eq!(bus.addr, Some(beat));
                assert_eq!(bus.burst, None);
                in_flight = if beat + 1 == LENGTHS.length_of(kind) {
                    None
                } else {
                    Some((core, kind, beat + 1))
                };
            }
        }
    }
    assert!(grants > 100);
}

#[test]
fn disable_resets_mid_transfer() {
    let engine = start_test(file!());
    let mut arbiter = Arbiter::new(engine.top(), "arbiter", 2, LENGTHS, PolicyKind::RoundRobin.build());

    for _ in 0..5 {
        arbiter.step(&requests(&[0, 1]));
    }
    assert_eq!(arbiter.state().phase, ArbiterPhase::Transfer);

    let bus = arbiter.step(&ArbiterInputs {
        enable: false,
        requests: [0, 1].into_iter().collect(),
    });
    assert_eq!(bus, BusControl::default());
    assert_eq!(*arbiter.state(), ArbiterState::default());

    // The round robin history is forgotten too, so core 0 is granted first.
    let seen = headers(&mut arbiter, 2, 20);
    assert_eq!(seen[0], (0, BurstKind::Load, 2));
}
