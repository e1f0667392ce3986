// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::fmt;

/// The type of the operands streamed through the grid.
pub type Operand = u8;

/// The type of a processing element's running sum.
///
/// Wide enough for 2×8-bit products summed over a burst of up to 2^16 rows.
pub type Accumulator = u32;

/// Index of a core on the shared bus.
pub type CoreId = usize;

/// A set of cores, one bit per core.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CoreSet(u64);

impl CoreSet {
    /// The largest number of cores a set can describe.
    pub const MAX_CORES: usize = u64::BITS as usize;

    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, core: CoreId) {
        debug_assert!(core < Self::MAX_CORES, "core{core} out of range");
        self.0 |= 1 << core;
    }

    pub fn remove(&mut self, core: CoreId) {
        debug_assert!(core < Self::MAX_CORES, "core{core} out of range");
        self.0 &= !(1 << core);
    }

    #[must_use]
    pub fn contains(&self, core: CoreId) -> bool {
        core < Self::MAX_CORES && self.0 & (1 << core) != 0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// The member with the highest index.
    #[must_use]
    pub fn highest(&self) -> Option<CoreId> {
        if self.0 == 0 {
            None
        } else {
            Some(Self::MAX_CORES - 1 - self.0.leading_zeros() as usize)
        }
    }

    /// The member with the lowest index that is at least `from`.
    #[must_use]
    pub fn first_from(&self, from: CoreId) -> Option<CoreId> {
        if from >= Self::MAX_CORES {
            return None;
        }
        let masked = self.0 & (u64::MAX << from);
        if masked == 0 {
            None
        } else {
            Some(masked.trailing_zeros() as usize)
        }
    }

    #[must_use]
    pub fn intersection(&self, other: CoreSet) -> CoreSet {
        CoreSet(self.0 & other.0)
    }

    #[must_use]
    pub fn difference(&self, other: CoreSet) -> CoreSet {
        CoreSet(self.0 & !other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = CoreId> + '_ {
        (0..Self::MAX_CORES).filter(|core| self.contains(*core))
    }
}

impl FromIterator<CoreId> for CoreSet {
    fn from_iter<I: IntoIterator<Item = CoreId>>(iter: I) -> Self {
        let mut set = CoreSet::empty();
        for core in iter {
            set.insert(core);
        }
        set
    }
}

impl fmt::Display for CoreSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, core) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{core}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for CoreSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Direction of a burst on the shared bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BurstKind {
    /// Operands flow from main memory into a core.
    Load,
    /// Results flow out of a core into main memory.
    Unload,
}

impl fmt::Display for BurstKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BurstKind::Load => write!(f, "load"),
            BurstKind::Unload => write!(f, "unload"),
        }
    }
}

/// The fixed number of beats in each kind of burst.
///
/// The first beat of every burst is a header, so a burst of length `L`
/// carries `L - 1` payload rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurstLengths {
    pub write: usize,
    pub read: usize,
}

impl BurstLengths {
    #[must_use]
    pub fn length_of(&self, kind: BurstKind) -> usize {
        match kind {
            BurstKind::Load => self.write,
            BurstKind::Unload => self.read,
        }
    }
}

/// A burst that has been granted to a core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurstRequest {
    pub core_id: CoreId,
    pub kind: BurstKind,
    pub length: usize,
}

impl fmt::Display for BurstRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "core{} {} burst of {} beats",
            self.core_id, self.kind, self.length
        )
    }
}

/// The bus control signals driven by the arbiter during one tick.
///
/// `None` means the signal is not driven.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BusControl {
    /// The core that owns the bus.
    pub grant: Option<CoreId>,

    /// Number of payload rows in the burst. Only driven on the header beat.
    pub burst: Option<usize>,

    /// Beat index within the burst.
    pub addr: Option<usize>,

    pub direction: Option<BurstKind>,
}

impl BusControl {
    /// Whether this tick carries a payload row for the given direction.
    #[must_use]
    pub fn payload_row(&self, kind: BurstKind) -> Option<usize> {
        match (self.direction, self.addr) {
            (Some(direction), Some(addr)) if direction == kind && addr > 0 => Some(addr - 1),
            _ => None,
        }
    }
}
