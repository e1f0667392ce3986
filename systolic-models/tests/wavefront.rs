// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

use itertools::iproduct;
use systolic_components::pe::PeMode;
use systolic_models::wavefront::Wavefront;

#[test]
fn activation_is_monotonic() {
    for n in 1..=8 {
        let wavefront = Wavefront::new(n);
        for tick in 0..3 * n {
            let expected = iproduct!(0..n, 0..n)
                .filter(|(row, col)| row + col <= tick)
                .count();
            assert_eq!(wavefront.active_count(tick), expected, "N={n} tick {tick}");

            let modes = wavefront.distribute_modes(tick);
            for ((row, col), mode) in wavefront.grid().zip(&modes) {
                let accepting = *mode == PeMode::Accumulate;
                assert_eq!(accepting, tick >= row + col, "N={n} ({row},{col}) tick {tick}");
            }
            assert_eq!(
                modes.iter().filter(|mode| **mode == PeMode::Accumulate).count(),
                expected
            );
        }
        assert!(wavefront.distribute_done(2 * n - 2));
        assert!(n == 1 || !wavefront.distribute_done(2 * n - 3));
    }
}

/// The 12 tick drain of a 4×4 grid. Each entry lists the (row, col) captured
/// by output buffers 0..4 on that tick.
#[test]
fn four_by_four_drain_table() {
    let wavefront = Wavefront::new(4);
    let table: [[Option<usize>; 4]; 12] = [
        [None, None, None, None],
        [Some(0), None, None, None],
        [None, Some(0), None, None],
        [Some(1), None, Some(0), None],
        [None, Some(1), None, Some(0)],
        [Some(2), None, Some(1), None],
        [None, Some(2), None, Some(1)],
        [Some(3), None, Some(2), None],
        [None, Some(3), None, Some(2)],
        [None, None, Some(3), None],
        [None, None, None, Some(3)],
        [None, None, None, None],
    ];
    for (tick, expected) in table.iter().enumerate() {
        let captured: Vec<_> = (0..4).map(|col| wavefront.capture_row(col, tick)).collect();
        assert_eq!(captured, expected, "tick {tick}");
    }

    assert_eq!(wavefront.cleanup_ticks(), 12);
    assert!(!wavefront.cleanup_done(10));
    assert!(wavefront.cleanup_done(11));

    // Groups emit in order, one per tick.
    for tick in 0..=6 {
        let emitting: Vec<_> = wavefront
            .grid()
            .filter(|(row, col)| wavefront.drain_mode(*row, *col, tick) == PeMode::Emit)
            .collect();
        assert!(!emitting.is_empty());
        assert!(emitting.iter().all(|(row, col)| row + col == tick));
        assert_eq!(emitting.len(), wavefront.group_size(tick));
    }
}

#[test]
fn drain_latency_is_one_tick_per_hop() {
    for n in 1..=6 {
        let wavefront = Wavefront::new(n);
        for (row, col) in wavefront.grid() {
            let emit = Wavefront::delay_group(row, col);
            assert_eq!(wavefront.drain_mode(row, col, emit), PeMode::Emit);

            // The value climbs one row per tick and is captured the tick after
            // it reaches row 0.
            for hop in 1..=row {
                let tick = emit + hop;
                assert_eq!(wavefront.drain_mode(row - hop, col, tick), PeMode::Relay);
            }
            let capture = Wavefront::capture_tick(row, col);
            assert_eq!(capture, emit + row + 1);
            assert_eq!(wavefront.capture_row(col, capture), Some(row));
            assert!(capture < wavefront.cleanup_ticks());
        }
    }
}

#[test]
fn drained_pes_are_cleared_after_their_last_relay() {
    let n = 4;
    let wavefront = Wavefront::new(n);
    for (row, col) in wavefront.grid() {
        let modes: Vec<_> = (0..wavefront.cleanup_ticks())
            .map(|tick| wavefront.drain_mode(row, col, tick))
            .collect();

        // Accumulate, one emit, relays, then clear, in that order.
        let first_clear = modes.iter().position(|mode| *mode == PeMode::Clear);
        let Some(first_clear) = first_clear else {
            panic!("pe({row},{col}) never cleared");
        };
        assert!(modes[first_clear..].iter().all(|mode| *mode == PeMode::Clear));
        assert_eq!(modes.iter().filter(|mode| **mode == PeMode::Emit).count(), 1);
        assert_eq!(
            modes.iter().filter(|mode| **mode == PeMode::Relay).count(),
            2 * (n - 1) - 2 * row
        );
    }
}
