// vim: tw=80
//! Block I/O requests

use crate::{
    types::*,
    util::*
};

/// The operation requested by a `Bio`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Op {
    Read,
    Write,
    /// Write at the zone's write pointer.  The device chooses the landing
    /// sector, and reports it on completion.
    ZoneAppend,
    ZoneReset,
    ZoneResetAll,
    ZoneOpen,
    ZoneClose,
    ZoneFinish,
    Flush,
    Discard,
}

impl Op {
    /// Is this a zone management operation?
    pub fn is_zone_mgmt(self) -> bool {
        matches!(self, Op::ZoneReset | Op::ZoneResetAll | Op::ZoneOpen |
                       Op::ZoneClose | Op::ZoneFinish)
    }

    /// Does this operation modify data on the device?
    pub fn is_write(self) -> bool {
        matches!(self, Op::Write | Op::ZoneAppend)
    }
}

/// The data buffer attached to a `Bio`, if any
#[derive(Debug)]
pub enum Payload {
    None,
    /// Destination for read data
    Read(IoVecMut),
    /// Source of written data
    Write(IoVec),
}

/// A single block I/O request.
///
/// Lengths and addresses are always in sectors.
#[derive(Debug)]
pub struct Bio {
    pub op: Op,
    /// Address of the first sector
    pub sector: SectorT,
    nr_sectors: SectorT,
    payload: Payload,
}

impl Bio {
    /// Discard a range of sectors
    pub fn discard(sector: SectorT, nr_sectors: SectorT) -> Self {
        Bio { op: Op::Discard, sector, nr_sectors, payload: Payload::None }
    }

    /// Flush the device's volatile write cache
    pub fn flush() -> Self {
        Bio { op: Op::Flush, sector: 0, nr_sectors: 0, payload: Payload::None }
    }

    /// Read into `buf`, which must be a whole number of sectors
    pub fn read(buf: IoVecMut, sector: SectorT) -> Self {
        let nr_sectors = bytes2sectors(buf.len());
        Bio { op: Op::Read, sector, nr_sectors, payload: Payload::Read(buf) }
    }

    /// Write `buf`, which must be a whole number of sectors
    pub fn write(buf: IoVec, sector: SectorT) -> Self {
        let nr_sectors = bytes2sectors(buf.len());
        Bio { op: Op::Write, sector, nr_sectors, payload: Payload::Write(buf) }
    }

    /// Append `buf` to the zone that starts at `sector`
    pub fn zone_append(buf: IoVec, sector: SectorT) -> Self {
        let nr_sectors = bytes2sectors(buf.len());
        Bio {
            op: Op::ZoneAppend,
            sector,
            nr_sectors,
            payload: Payload::Write(buf)
        }
    }

    /// A zone management operation on the zone that starts at `sector`.
    ///
    /// For `Op::ZoneResetAll`, `sector` is ignored.
    ///
    /// # Panics
    ///
    /// If `op` is not a zone management operation
    pub fn zone_mgmt(op: Op, sector: SectorT) -> Self {
        assert!(op.is_zone_mgmt(), "{op:?} is not a zone management op");
        Bio { op, sector, nr_sectors: 0, payload: Payload::None }
    }

    /// First sector after the end of the request
    pub fn end_sector(&self) -> SectorT {
        self.sector + self.nr_sectors
    }

    pub fn nr_sectors(&self) -> SectorT {
        self.nr_sectors
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The destination buffer, for reads
    pub fn read_buf_mut(&mut self) -> Option<&mut IoVecMut> {
        if let Payload::Read(buf) = &mut self.payload {
            Some(buf)
        } else {
            None
        }
    }

    /// Detach the destination buffer of a read, so it may be filled
    /// elsewhere.
    ///
    /// Put it back with [`restore_read_buf`](Self::restore_read_buf).
    pub fn take_read_buf(&mut self) -> Option<IoVecMut> {
        match std::mem::replace(&mut self.payload, Payload::None) {
            Payload::Read(buf) => Some(buf),
            other => {
                self.payload = other;
                None
            }
        }
    }

    pub fn restore_read_buf(&mut self, buf: IoVecMut) {
        debug_assert!(matches!(self.payload, Payload::None));
        self.payload = Payload::Read(buf);
    }

    /// Split the `Bio` in two at `at` sectors.
    ///
    /// Afterwards `self` will contain the first `at` sectors, and the returned
    /// value will contain the remainder, including its share of the payload.
    ///
    /// # Panics
    ///
    /// If `at` is not within the request
    pub fn split_off(&mut self, at: SectorT) -> Bio {
        assert!(at <= self.nr_sectors, "split point beyond end of Bio");
        let bytes = sectors2bytes(at);
        let payload = match &mut self.payload {
            Payload::None => Payload::None,
            Payload::Read(buf) => Payload::Read(buf.split_off(bytes)),
            Payload::Write(buf) => Payload::Write(buf.split_off(bytes)),
        };
        let tail = Bio {
            op: self.op,
            sector: self.sector + at,
            nr_sectors: self.nr_sectors - at,
            payload
        };
        self.nr_sectors = at;
        tail
    }

    /// The source buffer, for writes and appends
    pub fn write_buf(&self) -> Option<&IoVec> {
        if let Payload::Write(buf) = &self.payload {
            Some(buf)
        } else {
            None
        }
    }

    /// Fill a read `Bio`'s buffer with zeros, as if it had been read from an
    /// unwritten region.
    pub fn zero_fill(&mut self) {
        if let Some(buf) = self.read_buf_mut() {
            buf[..].fill(0);
        }
    }
}

/// A `Bio` returned by the device, along with its final status
#[derive(Debug)]
pub struct Completion {
    pub bio: Bio,
    pub status: Result<()>,
}

impl Completion {
    pub fn new(bio: Bio, status: Result<()>) -> Self {
        Completion { bio, status }
    }

    pub fn ok(bio: Bio) -> Self {
        Completion { bio, status: Ok(()) }
    }

    pub fn err(bio: Bio, e: Error) -> Self {
        Completion { bio, status: Err(e) }
    }
}

// LCOV_EXCL_STOP
