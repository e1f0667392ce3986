// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Log and trace events for the systolic accelerator model.
//!
//! Every component of the model owns an [`Entity`](crate::entity::Entity),
//! and every event names the entity that raised it:
//!
//!   - _log_ events are text messages at a [`log::Level`], raised with
//!     [`trace!`], [`debug!`], [`info!`], [`warn!`] and [`error!`].
//!   - _trace_ events record the model itself: entities being created and
//!     destroyed ([`create!`], [`destroy!`]), registers changing value
//!     ([`value!`]) and the clock advancing ([`set_tick!`]).
//!
//! An event is only formatted when the [`Tracker`] has the entity enabled at
//! the level of the event. Trace events are emitted at `Trace` level.

#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

pub use log;

pub mod builder;
pub mod entity;
pub mod id;
pub mod test_helpers;
pub mod tracker;

pub use id::Id;
pub use tracker::{Track, Tracker};

/// Destination of text trackers.
pub type Writer = Box<dyn std::io::Write>;
type SharedWriter = Rc<RefCell<Writer>>;

/// The parent of the top-level entity.
pub const NO_ID: Id = Id(0);

/// The first ID handed out by an [`EntityManager`](tracker::EntityManager).
pub const ROOT: Id = Id(1);

/// Record an entity joining the hierarchy.
#[macro_export]
macro_rules! create {
    ($entity:expr) => {{
        if $entity
            .tracker
            .is_entity_enabled($entity.id, $crate::log::Level::Trace)
        {
            let parent = $entity.parent.as_ref().map_or($crate::NO_ID, |p| p.id);
            $entity
                .tracker
                .create(parent, $entity.id, $entity.full_name().as_str());
        }
    }};
}

/// Record an entity leaving the hierarchy.
#[macro_export]
macro_rules! destroy {
    ($entity:expr) => {{
        if $entity
            .tracker
            .is_entity_enabled($entity.id, $crate::log::Level::Trace)
        {
            let parent = $entity.parent.as_ref().map_or($crate::NO_ID, |p| p.id);
            $entity.tracker.destroy(parent, $entity.id);
        }
    }};
}

/// Record a new value of a register held by an entity, such as a
/// controller's phase code.
#[macro_export]
macro_rules! value {
    ($entity:expr ; $value:expr) => {{
        if $entity
            .tracker
            .is_entity_enabled($entity.id, $crate::log::Level::Trace)
        {
            $entity.tracker.value($entity.id, $value as f64);
        }
    }};
}

/// Record the clock reaching a new tick.
#[macro_export]
macro_rules! set_tick {
    ($entity:expr ; $tick:expr) => {{
        if $entity
            .tracker
            .is_entity_enabled($entity.id, $crate::log::Level::Trace)
        {
            $entity.tracker.tick($entity.id, $tick);
        }
    }};
}

/// Emit a log message from `$entity` at level `$lvl`.
///
/// This expands to a statement, so it cannot be used as an expression.
#[macro_export]
macro_rules! log_base {
    ($entity:expr ; $lvl:expr, $($arg:tt)+) => (
        if $entity.tracker.is_entity_enabled($entity.id, $lvl) {
            $entity.tracker.log($entity.id, $lvl, format_args!($($arg)+));
        }
    );
}

/// Log at `Trace` level: per-beat bus activity and datapath captures.
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Trace, $($arg)+);
    );
}

/// Log at `Debug` level: phase transitions and grants.
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Debug, $($arg)+);
    );
}

/// Log at `Info` level.
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Info, $($arg)+);
    );
}

/// Log at `Warn` level.
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Warn, $($arg)+);
    );
}

/// Log at `Error` level.
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::log_base!($entity ; $crate::log::Level::Error, $($arg)+);
    );
}
