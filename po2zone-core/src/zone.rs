// vim: tw=80
//! Zone descriptors, as reported by a zoned device

use std::fmt;

use crate::types::*;

/// Write constraints of a zone
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ZoneType {
    /// Random writes are allowed.  No write pointer.
    Conventional,
    SeqWriteRequired,
    SeqWritePreferred,
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoneType::Conventional => "conventional",
            ZoneType::SeqWriteRequired => "seq-write-required",
            ZoneType::SeqWritePreferred => "seq-write-preferred",
        };
        f.write_str(s)
    }
}

/// Condition of a zone, as defined by the ZBC and ZNS command sets
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ZoneCond {
    /// Conventional zones have no write pointer
    NotWp,
    Empty,
    ImplicitOpen,
    ExplicitOpen,
    Closed,
    ReadOnly,
    Full,
    Offline,
}

impl ZoneCond {
    /// Is the zone open, whether explicitly or implicitly?
    pub fn is_open(self) -> bool {
        matches!(self, ZoneCond::ImplicitOpen | ZoneCond::ExplicitOpen)
    }

    /// Can the zone accept any more writes?
    pub fn is_writable(self) -> bool {
        !matches!(self, ZoneCond::ReadOnly | ZoneCond::Full | ZoneCond::Offline)
    }
}

impl fmt::Display for ZoneCond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ZoneCond::NotWp => "not-wp",
            ZoneCond::Empty => "empty",
            ZoneCond::ImplicitOpen => "imp-open",
            ZoneCond::ExplicitOpen => "exp-open",
            ZoneCond::Closed => "closed",
            ZoneCond::ReadOnly => "read-only",
            ZoneCond::Full => "full",
            ZoneCond::Offline => "offline",
        };
        f.write_str(s)
    }
}

/// One zone descriptor.
///
/// All values are in sectors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Zone {
    /// First sector of the zone
    pub start: SectorT,
    /// Size of the zone
    pub len: SectorT,
    /// Write pointer
    pub wp: SectorT,
    /// Number of writable sectors, starting at `start`.  May be less than
    /// `len`.
    pub capacity: SectorT,
    pub zone_type: ZoneType,
    pub cond: ZoneCond,
}

impl Zone {
    /// First sector after the end of the zone
    pub fn end(&self) -> SectorT {
        self.start + self.len
    }
}

// LCOV_EXCL_STOP
