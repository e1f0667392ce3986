// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Addressable row storage.
//!
//! Used for the per-row weight and input memories and for the per-column
//! output buffers. A storage unit does not track its own address; the
//! controller that drives it supplies one with every access.

use std::ops::AddAssign;

/// The control applied to a storage unit on a given tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnitAccess {
    /// Not ready. Outputs are not driven.
    #[default]
    Off,

    /// Ready but inert. Neither reads nor writes.
    Stalled,

    /// Drive the contents of a row.
    Read(usize),

    /// Capture into a row.
    Write(usize),
}

impl UnitAccess {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !matches!(self, UnitAccess::Off)
    }

    #[must_use]
    pub fn address(&self) -> Option<usize> {
        match self {
            UnitAccess::Read(addr) | UnitAccess::Write(addr) => Some(*addr),
            UnitAccess::Off | UnitAccess::Stalled => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Storage<T> {
    rows: Vec<T>,
}

impl<T> Storage<T>
where
    T: Copy + Default + AddAssign,
{
    #[must_use]
    pub fn new(num_rows: usize) -> Self {
        Self {
            rows: vec![T::default(); num_rows],
        }
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// # Panics
    ///
    /// The address must be within the storage.
    #[must_use]
    pub fn read(&self, address: usize) -> T {
        self.rows[address]
    }

    /// # Panics
    ///
    /// The address must be within the storage.
    pub fn write(&mut self, address: usize, value: T) {
        self.rows[address] = value;
    }

    /// Add `value` to the existing contents of a row.
    ///
    /// # Panics
    ///
    /// The address must be within the storage.
    pub fn write_accumulate(&mut self, address: usize, value: T) {
        self.rows[address] += value;
    }

    pub fn clear_all(&mut self) {
        self.rows.fill(T::default());
    }

    #[must_use]
    pub fn contents(&self) -> &[T] {
        &self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_accumulate() {
        let mut glb: Storage<u32> = Storage::new(4);
        glb.write(1, 10);
        glb.write_accumulate(1, 5);
        glb.write_accumulate(3, 7);
        assert_eq!(glb.contents(), &[0, 15, 0, 7]);

        glb.clear_all();
        assert_eq!(glb.contents(), &[0, 0, 0, 0]);
    }

    #[test]
    #[should_panic]
    fn out_of_range() {
        let mem: Storage<u8> = Storage::new(2);
        let _ = mem.read(2);
    }

    #[test]
    fn access_helpers() {
        assert!(!UnitAccess::Off.is_ready());
        assert!(UnitAccess::Stalled.is_ready());
        assert_eq!(UnitAccess::Read(3).address(), Some(3));
        assert_eq!(UnitAccess::Stalled.address(), None);
    }
}
