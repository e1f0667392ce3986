// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The [`Track`] trait and the trackers that implement it.

/// A tracker writing one line of text per event.
pub mod text;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use regex::Regex;
pub use text::TextTracker;

use crate::{Id, ROOT};

/// A tracker could not be configured.
#[derive(Debug)]
pub struct TrackConfigError(pub String);

impl fmt::Display for TrackConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TrackConfigError {}

/// Receiver of all _log_ and _trace_ events.
pub trait Track {
    /// Allocate an [`Id`] for a new entity.
    fn unique_id(&self) -> Id;

    /// Whether events from entity `id` at `level` are wanted.
    fn is_entity_enabled(&self, id: Id, level: log::Level) -> bool;

    /// Register the full hierarchical name of entity `id`.
    fn add_entity(&self, id: Id, entity_name: &str);

    /// Entity `id` has a register taking a new value.
    fn value(&self, id: Id, value: f64);

    /// Entity `id` has been created as a child of `parent`.
    fn create(&self, parent: Id, id: Id, name: &str);

    /// Entity `id`, a child of `parent`, has been destroyed.
    fn destroy(&self, parent: Id, id: Id);

    /// A log message from entity `id`.
    fn log(&self, id: Id, level: log::Level, msg: fmt::Arguments);

    /// The clock has reached `tick`.
    fn tick(&self, set_by: Id, tick: u64);

    /// Flush any buffered output.
    fn shutdown(&self);
}

/// The type of a [`Tracker`] that is shared across entities.
pub type Tracker = Rc<dyn Track>;

/// A tracker that discards every event.
pub struct DevNullTracker;

impl Track for DevNullTracker {
    fn unique_id(&self) -> Id {
        Id(0)
    }

    fn is_entity_enabled(&self, _id: Id, _level: log::Level) -> bool {
        false
    }

    fn add_entity(&self, _id: Id, _entity_name: &str) {}
    fn value(&self, _id: Id, _value: f64) {}
    fn create(&self, _parent: Id, _id: Id, _name: &str) {}
    fn destroy(&self, _parent: Id, _id: Id) {}
    fn log(&self, _id: Id, _level: log::Level, _msg: fmt::Arguments) {}
    fn tick(&self, _set_by: Id, _tick: u64) {}
    fn shutdown(&self) {}
}

/// Create a [`Tracker`] that discards every event.
#[must_use]
pub fn dev_null_tracker() -> Tracker {
    Rc::new(DevNullTracker)
}

/// Allocates entity [`Id`]s and decides the level each entity logs at.
///
/// An entity's level is resolved once, when it is added, from the first
/// filter whose regular expression matches its full name. Only entities that
/// differ from the default level are remembered.
pub struct EntityManager {
    default_level: log::Level,
    filters: Vec<(Regex, log::Level)>,
    next_id: RefCell<u64>,
    levels: RefCell<HashMap<Id, log::Level>>,
}

impl EntityManager {
    /// Create a manager with no filters.
    #[must_use]
    pub fn new(default_level: log::Level) -> Self {
        Self {
            default_level,
            filters: Vec::new(),
            next_id: RefCell::new(ROOT.0 + 1),
            levels: RefCell::new(HashMap::new()),
        }
    }

    fn unique_id(&self) -> Id {
        let mut next = self.next_id.borrow_mut();
        let id = Id(*next);
        *next += 1;
        id
    }

    fn is_log_enabled_at_level(&self, id: Id, level: log::Level) -> bool {
        let enabled = self
            .levels
            .borrow()
            .get(&id)
            .copied()
            .unwrap_or(self.default_level);
        level <= enabled
    }

    fn add_entity(&self, id: Id, entity_name: &str) {
        let level = self.log_level_for(entity_name);
        if level == self.default_level {
            return;
        }
        let previous = self.levels.borrow_mut().insert(id, level);
        assert!(previous.is_none(), "entity {id} added twice ({entity_name})");
    }

    fn log_level_for(&self, entity_name: &str) -> log::Level {
        self.filters
            .iter()
            .find(|(regex, _)| regex.is_match(entity_name))
            .map_or(self.default_level, |(_, level)| *level)
    }

    /// Log entities whose full name matches `regex_str` at `level`.
    ///
    /// Filters are tried in the order they are added.
    ///
    /// # Example
    ///
    /// ```rust
    /// use systolic_track::tracker::EntityManager;
    /// let mut manager = EntityManager::new(log::Level::Warn);
    /// manager.add_entity_level_filter(".*arbiter", log::Level::Trace).unwrap();
    /// ```
    pub fn add_entity_level_filter(
        &mut self,
        regex_str: &str,
        level: log::Level,
    ) -> Result<(), TrackConfigError> {
        let regex = Regex::new(regex_str).map_err(|e| {
            TrackConfigError(format!("invalid entity filter {regex_str}: {e}"))
        })?;
        self.filters.push((regex, level));
        Ok(())
    }
}
