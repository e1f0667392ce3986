// Copyright (c) 2020 Graphcore Ltd. All rights reserved.

//! Ensure that all version of each macro can be used

use std::rc::Rc;

use systolic_track::entity::{Entity, toplevel};
use systolic_track::{
    Id, debug, error, info, set_tick, test_helpers, test_init, trace, value, warn,
};

macro_rules! build_with_entity {
    ($name:ident, $macro:ident, $slvl:expr) => (
        #[test]
        fn $name() {
            let (test_tracker, tracker) = test_init!(100);

            let top = toplevel(&tracker, "top");
            test_helpers::check_and_clear(&test_tracker, &["0: created 100, top"]);
            assert_eq!(top.id, Id(100));

            $macro!(top ; "Loc with no args");
            test_helpers::check_and_clear(&test_tracker, &[concat!("100:", $slvl, ": Loc with no args")]);

            $macro!(top ; "Loc with {} argument", 1);
            test_helpers::check_and_clear(&test_tracker, &[concat!("100:", $slvl, ": Loc with 1 argument")]);

            $macro!(top ; "Loc with {}, {} arguments", 1, 1 + 1);
            test_helpers::check_and_clear(&test_tracker, &[concat!("100:", $slvl,": Loc with 1, 2 arguments")]);

            drop(top);
            test_helpers::check_and_clear(&test_tracker, &["0: destroyed 100"]);
        }
    );
}

build_with_entity!(trace_with_entity, trace, "TRACE");
build_with_entity!(info_with_entity, info, "INFO");
build_with_entity!(debug_with_entity, debug, "DEBUG");
build_with_entity!(warn_with_entity, warn, "WARN");
build_with_entity!(error_with_entity, error, "ERROR");

#[test]
fn create_destroy_children() {
    let (test_tracker, tracker) = test_init!(10);

    let top = toplevel(&tracker, "top");
    let arbiter = Entity::new(&top, "arbiter");
    test_helpers::check_and_clear(
        &test_tracker,
        &[
            "0: created 10, top",
            "10: created 11, top::arbiter",
        ],
    );
    assert_eq!(arbiter.id, Id(11));

    drop(arbiter);
    test_helpers::check_and_clear(&test_tracker, &["10: destroyed 11"]);

    drop(top);
    test_helpers::check_and_clear(&test_tracker, &["0: destroyed 10"]);
}

#[test]
fn values_and_ticks() {
    let (test_tracker, tracker) = test_init!(40);

    let top = Rc::new(Entity::new(&toplevel(&tracker, "top"), "ctrl"));
    test_helpers::check_and_clear(
        &test_tracker,
        &[
            "0: created 40, top",
            "40: created 41, top::ctrl",
        ],
    );

    value!(top ; 3);
    set_tick!(top ; 2);
    test_helpers::check_and_clear(&test_tracker, &["41: value 3", "41: tick 2"]);
}
