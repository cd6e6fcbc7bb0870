// vim: tw=80
//! A virtual block device built from a single `po2zoned` target
//!
//! `MappedDevice` plays the part of the block target framework: it splits
//! requests at the target's I/O boundaries, maps each piece, resubmits the
//! pieces that the target only partially accepted, and runs the completion
//! hook.

use std::collections::VecDeque;

use tracing::instrument;

use crate::{
    bio::{Bio, Op},
    report::ZoneReport,
    target::{MapOutcome, Po2Target},
    types::*,
    vdev::Vdev
};

pub struct MappedDevice {
    target: Po2Target,
}

impl MappedDevice {
    /// Discard a range of sectors
    #[instrument(skip(self))]
    pub async fn discard(&self, sector: SectorT, nr_sectors: SectorT)
        -> Result<()>
    {
        self.issue(Bio::discard(sector, nr_sectors)).await.map(drop)
    }

    /// Release the target, so it may be destructed.
    pub fn into_target(self) -> Po2Target {
        self.target
    }

    /// Flush the physical device's write cache
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<()> {
        self.issue(Bio::flush()).await.map(drop)
    }

    /// Reject requests that lie outside of the virtual device
    fn check_range(&self, bio: &Bio) -> Result<()> {
        let begin = self.target.geometry().begin();
        let end = begin + self.target.len();
        if bio.op == Op::Flush || bio.op == Op::ZoneResetAll {
            Ok(())
        } else if bio.sector < begin || bio.sector >= end ||
            bio.end_sector() > end
        {
            Err(Error::EIO)
        } else {
            Ok(())
        }
    }

    /// Carry a request through to completion.
    ///
    /// Returns the sector at which the request's first piece completed.  For a
    /// zone append, that's the virtual sector where the data landed.
    async fn issue(&self, bio: Bio) -> Result<SectorT> {
        self.check_range(&bio)?;
        let begin = self.target.geometry().begin();
        let max_io_len = self.target.max_io_len();
        let mut landing = None;
        let mut queue = VecDeque::from([bio]);
        while let Some(mut bio) = queue.pop_front() {
            // Appends may never be split, lest they land in separate zones.
            if matches!(bio.op, Op::Read | Op::Write | Op::Discard) {
                let offset = (bio.sector - begin) % max_io_len;
                if offset + bio.nr_sectors() > max_io_len {
                    let tail = bio.split_off(max_io_len - offset);
                    queue.push_front(tail);
                }
            }
            match self.target.map(bio) {
                MapOutcome::Remapped { bio, remainder } => {
                    if let Some(r) = remainder {
                        queue.push_front(r);
                    }
                    let completion = self.target.device().submit(bio).await;
                    let completion = self.target.end_io(completion);
                    completion.status?;
                    landing.get_or_insert(completion.bio.sector);
                }
                MapOutcome::Synthesized(bio) => {
                    landing.get_or_insert(bio.sector);
                }
                MapOutcome::Rejected(e) => return Err(e.into())
            }
        }
        // The queue always begins non-empty
        Ok(landing.unwrap_or(begin))
    }

    pub fn new(target: Po2Target) -> Self {
        MappedDevice { target }
    }

    /// Read a contiguous range of sectors.  Padding reads as zeros.
    #[instrument(skip(self, buf), fields(len = buf.len()))]
    pub async fn read_at(&self, buf: IoVecMut, sector: SectorT) -> Result<()> {
        self.issue(Bio::read(buf, sector)).await.map(drop)
    }

    /// Report up to `nr_zones` zones, beginning with the one containing
    /// `sector`.
    pub fn report_zones(&self, sector: SectorT, nr_zones: u32) -> ZoneReport {
        self.target.report_zones(sector, nr_zones)
    }

    pub fn target(&self) -> &Po2Target {
        &self.target
    }

    /// Write a contiguous range of sectors, at a zone's write pointer.
    #[instrument(skip(self, buf), fields(len = buf.len()))]
    pub async fn write_at(&self, buf: IoVec, sector: SectorT) -> Result<()> {
        self.issue(Bio::write(buf, sector)).await.map(drop)
    }

    /// Append data to the zone beginning at `sector`.
    ///
    /// Returns the virtual sector at which the data landed.
    #[instrument(skip(self, buf), fields(len = buf.len()))]
    pub async fn zone_append(&self, buf: IoVec, sector: SectorT)
        -> Result<SectorT>
    {
        self.issue(Bio::zone_append(buf, sector)).await
    }

    /// Apply a zone management operation to the zone beginning at `sector`.
    ///
    /// For `Op::ZoneResetAll`, `sector` is ignored.
    #[instrument(skip(self))]
    pub async fn zone_mgmt(&self, op: Op, sector: SectorT) -> Result<()> {
        if !op.is_zone_mgmt() {
            return Err(Error::EINVAL);
        }
        let sector = if op == Op::ZoneResetAll {
            self.target.geometry().begin()
        } else {
            sector
        };
        self.issue(Bio::zone_mgmt(op, sector)).await.map(drop)
    }
}

impl Vdev for MappedDevice {
    fn sector2zone(&self, sector: SectorT) -> Option<ZoneT> {
        let g = self.target.geometry();
        let offset = g.target_offset(sector)?;
        if offset >= g.virtual_length() {
            return None;
        }
        if g.zone_offset_virtual(offset) >= g.real_zone_size() {
            None
        } else {
            Some(g.zone_index_virtual(offset) as ZoneT)
        }
    }

    fn size(&self) -> SectorT {
        self.target.len()
    }

    fn zone_limits(&self, zone: ZoneT) -> (SectorT, SectorT) {
        let g = self.target.geometry();
        let start = g.begin() + u64::from(zone) * g.virtual_zone_size();
        (start, start + g.real_zone_size())
    }

    fn zones(&self) -> ZoneT {
        self.target.geometry().zone_count()
    }
}

// LCOV_EXCL_STOP
