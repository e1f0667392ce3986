// Copyright (c) 2020 Graphcore Ltd. All rights reserved.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::tracker::{EntityManager, Track};
use crate::{Id, SharedWriter, Writer};

/// Writes one line per event.
///
/// Lines start with the ID of the entity that raised the event, so a trace
/// can be filtered down to one core or controller with `grep`.
pub struct TextTracker {
    entity_manager: EntityManager,
    writer: SharedWriter,
}

impl TextTracker {
    /// Create a tracker writing to `writer`.
    pub fn new(entity_manager: EntityManager, writer: Writer) -> Self {
        Self {
            entity_manager,
            writer: Rc::new(RefCell::new(writer)),
        }
    }

    fn write_line(&self, args: fmt::Arguments) {
        let _ = writeln!(self.writer.borrow_mut(), "{args}");
    }
}

impl Track for TextTracker {
    fn unique_id(&self) -> Id {
        self.entity_manager.unique_id()
    }

    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool {
        self.entity_manager.is_log_enabled_at_level(id, level)
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        self.entity_manager.add_entity(id, entity_name);
    }

    fn value(&self, id: Id, value: f64) {
        self.write_line(format_args!("{id}: value {value}"));
    }

    fn create(&self, parent: Id, id: Id, name: &str) {
        self.write_line(format_args!("{parent}: created {id}, {name}"));
    }

    fn destroy(&self, parent: Id, id: Id) {
        self.write_line(format_args!("{parent}: destroyed {id}"));
    }

    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments) {
        self.write_line(format_args!("{id}:{level}: {msg}"));
    }

    fn tick(&self, set_by: Id, tick: u64) {
        self.write_line(format_args!("{set_by}: tick {tick}"));
    }

    fn shutdown(&self) {
        let _ = self.writer.borrow_mut().flush();
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    /// A writer whose contents can be read back after the tracker has it.
    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            io::Write::write(&mut *self.0.borrow_mut(), buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn one_line_per_event() {
        let out = Shared::default();
        let tracker = TextTracker::new(EntityManager::new(log::Level::Info), Box::new(out.clone()));
        let id = tracker.unique_id();
        tracker.create(crate::NO_ID, id, "top");
        tracker.tick(id, 3);
        tracker.log(id, log::Level::Info, format_args!("phase {}", 2));
        tracker.shutdown();

        let text = String::from_utf8(out.0.borrow().clone()).unwrap();
        assert_eq!(text, "0: created 2, top\n2: tick 3\n2:INFO: phase 2\n");
    }
}
