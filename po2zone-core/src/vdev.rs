// vim: tw=80

use crate::types::*;

/// Vdev: Virtual Device
///
/// A zoned block device, as seen from above.  Both the physical devices and
/// the emulated devices built upon them implement this trait.  The methods
/// here describe the device's layout.  The data plane differs at each level,
/// so it isn't part of the trait.
pub trait Vdev {
    /// Return the zone number at which the given sector resides
    ///
    /// There may be unused space in between the zones.  A return value of
    /// `None` indicates that the sector is unused.
    fn sector2zone(&self, sector: SectorT) -> Option<ZoneT>;

    /// Return the size of the Vdev in sectors, including any unused space.
    ///
    /// May not change within the lifetime of a Vdev.
    fn size(&self) -> SectorT;

    /// Return the first and last sectors of a zone's usable space.
    ///
    /// The end sector is *exclusive*; it is the first sector that is *not* in
    /// the requested zone.  Note that there may be some unused sectors in
    /// between adjacent zones.
    fn zone_limits(&self, zone: ZoneT) -> (SectorT, SectorT);

    /// Return the number of zones in the Vdev
    fn zones(&self) -> ZoneT;
}
