// vim: tw=80
//! Translation of zone reports into the emulated geometry

use std::pin::Pin;

use futures::{
    Stream,
    task::{Context, Poll}
};
use pin_project::pin_project;

use crate::{
    geometry::ZoneGeometry,
    types::*,
    zone::Zone,
    zoned_device::BoxZoneStream
};

/// Stream type of [`Po2Target::report_zones`](crate::target::Po2Target::report_zones)
///
/// Yields each of the physical device's zones, rewritten into virtual space,
/// along with its index within the report.  It ends after the requested number
/// of zones, when the device's report ends, or after the first error,
/// whichever comes first.
#[pin_project]
pub struct ZoneReport<S = BoxZoneStream> {
    #[pin]
    inner: S,
    geometry: ZoneGeometry,
    /// Zones still wanted by the caller
    remaining: u32,
    /// Index to assign to the next zone yielded
    idx: u32,
    /// First virtual sector after the last zone yielded
    next_sector: SectorT,
}

impl<S> ZoneReport<S> {
    /// Wrap a physical device's report, which begins at virtual sector
    /// `sector`.
    pub fn new(inner: S, geometry: ZoneGeometry, sector: SectorT, nr_zones: u32)
        -> Self
    {
        ZoneReport {
            inner,
            geometry,
            remaining: nr_zones,
            idx: 0,
            next_sector: sector
        }
    }

    /// Number of zones reported so far
    pub fn reported(&self) -> u32 {
        self.idx
    }

    /// The virtual sector at which a subsequent report should resume
    pub fn next_sector(&self) -> SectorT {
        self.next_sector
    }
}

impl<S> Stream for ZoneReport<S>
    where S: Stream<Item = Result<Zone>>
{
    type Item = Result<(u32, Zone)>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>)
        -> Poll<Option<Self::Item>>
    {
        let pinned = self.project();
        if *pinned.remaining == 0 {
            return Poll::Ready(None);
        }
        match futures::ready!(pinned.inner.poll_next(cx)) {
            Some(Ok(mut zone)) => {
                let g = pinned.geometry;
                zone.start = g.physical_to_virtual(zone.start);
                zone.wp = g.physical_to_virtual(zone.wp);
                zone.len = g.virtual_zone_size();
                let idx = *pinned.idx;
                *pinned.idx += 1;
                *pinned.remaining -= 1;
                *pinned.next_sector = zone.end();
                Poll::Ready(Some(Ok((idx, zone))))
            }
            Some(Err(e)) => {
                *pinned.remaining = 0;
                Poll::Ready(Some(Err(e)))
            }
            None => {
                *pinned.remaining = 0;
                Poll::Ready(None)
            }
        }
    }
}

// LCOV_EXCL_STOP
