// vim: tw=80
//! The interface to a physical zoned block device

use std::pin::Pin;

use futures::{Future, Stream};
#[cfg(test)] use mockall::mock;

use crate::{
    bio::{Bio, Completion},
    types::*,
    vdev::Vdev,
    zone::Zone
};

/// Future representing a `Bio` in flight.  It always resolves to a
/// `Completion`, whether or not the operation succeeded.
pub type BoxCompletionFut = Pin<Box<dyn Future<Output = Completion> + Send>>;

/// A device's zone report
pub type BoxZoneStream = Pin<Box<dyn Stream<Item = Result<Zone>> + Send>>;

/// A zoned block device that can service `Bio`s.
///
/// All addresses are in the device's own sector space.
pub trait ZonedDevice: Vdev + Send + Sync {
    /// The identifier by which the device is known to its `DevManager`
    fn name(&self) -> &str;

    /// Is the device zone-aware at all?
    fn is_zoned(&self) -> bool;

    /// Sectors per zone.  Uniform across the device.
    fn zone_sectors(&self) -> SectorT;

    /// Begin servicing a request.
    fn submit(&self, bio: Bio) -> BoxCompletionFut;

    /// Report up to `nr_zones` zones, beginning with the one containing
    /// `sector`, in ascending order.
    fn report_zones(&self, sector: SectorT, nr_zones: u32) -> BoxZoneStream;
}

#[cfg(test)]
mock!{
    pub ZonedDevice {}
    impl Vdev for ZonedDevice {
        fn sector2zone(&self, sector: SectorT) -> Option<ZoneT>;
        fn size(&self) -> SectorT;
        fn zone_limits(&self, zone: ZoneT) -> (SectorT, SectorT);
        fn zones(&self) -> ZoneT;
    }
    impl ZonedDevice for ZonedDevice {
        fn name(&self) -> &str;
        fn is_zoned(&self) -> bool;
        fn zone_sectors(&self) -> SectorT;
        fn submit(&self, bio: Bio) -> BoxCompletionFut;
        fn report_zones(&self, sector: SectorT, nr_zones: u32)
            -> BoxZoneStream;
    }
}
