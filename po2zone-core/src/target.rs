// vim: tw=80
//! The `po2zoned` target
//!
//! Remaps I/O from a virtual device, whose zones are all a power of two in
//! size, onto a physical device whose zones are not.  See
//! [`geometry`](crate::geometry) for the address mapping.

use std::sync::Arc;

use futures::stream;
use tracing::{debug, error, warn};

use crate::{
    bio::{Bio, Completion, Op},
    device_manager::DevManager,
    geometry::ZoneGeometry,
    registry::{Features, Registry, TargetType},
    report::ZoneReport,
    types::*,
    zoned_device::{BoxZoneStream, ZonedDevice}
};

pub const TARGET_TYPE: TargetType = TargetType {
    name: "po2zoned",
    version: [1, 0, 0],
    features: Features::ZONED_HM.union(Features::EMULATED_ZONES)
        .union(Features::NOWAIT),
};

/// Install the `po2zoned` target type into `registry`
pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(TARGET_TYPE)
}

/// Remove the `po2zoned` target type from `registry`
pub fn unregister(registry: &mut Registry) -> Result<()> {
    registry.unregister(TARGET_TYPE.name).map(drop)
}

/// What became of a `Bio` submitted to [`Po2Target::map`]
#[derive(Debug)]
pub enum MapOutcome {
    /// The `Bio` has been translated into physical space, and should be sent
    /// to the device.
    Remapped {
        bio: Bio,
        /// The tail of a read that was cut short at the end of a zone's backed
        /// region.  It is still in virtual space, and must be resubmitted.
        remainder: Option<Bio>
    },
    /// A read entirely within the padding region, already completed with
    /// zeros.  The device was never involved.
    Synthesized(Bio),
    /// The `Bio` can never succeed.  The device was never involved.
    Rejected(IoError),
}

/// Limits on the requests that upper layers should send
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueueLimits {
    /// Requests should not cross boundaries of this many sectors
    pub chunk_sectors: SectorT,
}

/// Which flavor of status to report
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatusType {
    /// Runtime information
    Info,
    /// The arguments needed to reconstruct the target
    Table,
    /// Measurement data for integrity subsystems.  We have none.
    Ima,
}

/// A constructed `po2zoned` target, holding its physical device
pub struct Po2Target {
    dev: Arc<dyn ZonedDevice>,
    geometry: ZoneGeometry,
}

impl Po2Target {
    /// Construct a target from its table arguments.
    ///
    /// # Arguments
    ///
    /// - `devices`:    Source of device handles
    /// - `args`:       Must be exactly one argument: the device identifier
    /// - `begin`:      First virtual sector of the mapping
    /// - `len`:        Requested length of the mapping, in sectors.  Must be
    ///                 the physical device's entire capacity.
    ///
    /// On failure, no device handle remains held.
    pub fn construct(
        devices: &DevManager,
        args: &[&str],
        begin: SectorT,
        len: SectorT
    ) -> std::result::Result<Self, ConfigError>
    {
        if args.len() != 1 {
            error!("Invalid argument count: {}", args.len());
            return Err(ConfigError::InvalidArgumentCount(args.len()));
        }
        let dev = devices.open(args[0])
            .map_err(|e| {
                error!("Device lookup failed: {e}");
                ConfigError::DeviceLookup(e)
            })?;
        Po2Target::new(dev.clone(), begin, len)
            .inspect_err(|_| devices.put(dev))
    }

    /// Release the target's device handle
    pub fn destruct(self, devices: &DevManager) {
        devices.put(self.dev)
    }

    /// Physical device underlying the target
    pub fn device(&self) -> &Arc<dyn ZonedDevice> {
        &self.dev
    }

    /// Status line.
    pub fn describe(&self) -> String {
        self.status(StatusType::Info)
    }

    /// Fix up a request after the device has completed it.
    ///
    /// Only a successful zone append needs any help: the device chose where
    /// it landed, and reported that in physical space.
    pub fn end_io(&self, mut completion: Completion) -> Completion {
        if completion.status.is_ok() && completion.bio.op == Op::ZoneAppend {
            completion.bio.sector =
                self.geometry.physical_to_virtual(completion.bio.sector);
        }
        completion
    }

    pub fn geometry(&self) -> &ZoneGeometry {
        &self.geometry
    }

    /// The natural I/O alignment of the virtual device: one virtual zone
    pub fn hint_alignment(&self) -> SectorT {
        self.geometry.virtual_zone_size()
    }

    pub fn io_hints(&self, limits: &mut QueueLimits) {
        limits.chunk_sectors = self.geometry.virtual_zone_size();
    }

    /// Visit each of the target's underlying devices, along with the range of
    /// its sectors that the target uses.
    pub fn iterate_devices<F, R>(&self, f: F) -> R
        where F: FnOnce(&dyn ZonedDevice, SectorT, SectorT) -> R
    {
        f(&*self.dev, 0, self.geometry.physical_length())
    }

    /// Length of the virtual device, including the padding
    pub fn len(&self) -> SectorT {
        self.geometry.virtual_length()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Translate a request from virtual into physical space.
    ///
    /// Requests must not cross a virtual zone boundary.  Use
    /// [`max_io_len`](Self::max_io_len) to split them first.
    pub fn map(&self, mut bio: Bio) -> MapOutcome {
        let g = &self.geometry;
        if bio.op == Op::Flush {
            // Flushes carry no address
            return MapOutcome::Remapped { bio, remainder: None };
        }
        let vsector = bio.sector;
        let Some(offset) = g.target_offset(bio.sector) else {
            debug!("rejecting {:?} at {} before the mapping", bio.op, vsector);
            return MapOutcome::Rejected(IoError::OutOfRange);
        };
        bio.sector = offset;
        if !bio.op.is_zone_mgmt() && bio.nr_sectors() > 0 {
            let offset = g.zone_offset_virtual(bio.sector);
            if offset + bio.nr_sectors() > g.real_zone_size() {
                if bio.op != Op::Read {
                    debug!("rejecting {:?} of {} sectors at {}", bio.op,
                        bio.nr_sectors(), vsector);
                    return MapOutcome::Rejected(
                        IoError::PaddingRegionNotWritable);
                }
                if offset < g.real_zone_size() {
                    let mut remainder =
                        bio.split_off(g.real_zone_size() - offset);
                    remainder.sector += g.begin();
                    bio.sector = g.virtual_to_physical(bio.sector);
                    return MapOutcome::Remapped {
                        bio,
                        remainder: Some(remainder)
                    };
                }
                bio.zero_fill();
                bio.sector = vsector;
                return MapOutcome::Synthesized(bio);
            }
        }
        bio.sector = g.virtual_to_physical(bio.sector);
        MapOutcome::Remapped { bio, remainder: None }
    }

    /// Largest request that may be mapped at once.  Requests must also not
    /// cross a multiple of this value.
    pub fn max_io_len(&self) -> SectorT {
        self.geometry.virtual_zone_size()
    }

    /// Build a target on top of an already-opened device.
    ///
    /// See [`construct`](Self::construct) for the arguments.
    #[tracing::instrument(skip(dev), fields(dev = dev.name()))]
    pub fn new(dev: Arc<dyn ZonedDevice>, begin: SectorT, len: SectorT)
        -> std::result::Result<Self, ConfigError>
    {
        if !dev.is_zoned() {
            error!("{} is not a zoned device", dev.name());
            return Err(ConfigError::NotZoned);
        }
        let geometry = ZoneGeometry::new(dev.zone_sectors(), dev.size(), begin,
                                         len)
            .inspect_err(|e| error!("{}: {e}", dev.name()))?;
        if let Some(w) = geometry.warning() {
            warn!("{}: {w}", dev.name());
        }
        Ok(Po2Target { dev, geometry })
    }

    /// Report up to `nr_zones` zones, beginning with the one containing
    /// virtual sector `sector`.
    pub fn report_zones(&self, sector: SectorT, nr_zones: u32) -> ZoneReport {
        let g = &self.geometry;
        let inner: BoxZoneStream = match g.target_offset(sector) {
            Some(offset) => {
                let zone = g.zone_index_virtual(offset);
                self.dev.report_zones(zone * g.real_zone_size(), nr_zones)
            }
            None => Box::pin(stream::iter([Err(Error::EINVAL)]))
        };
        ZoneReport::new(inner, *g, sector, nr_zones)
    }

    pub fn status(&self, status_type: StatusType) -> String {
        match status_type {
            StatusType::Info => format!("{} {}", self.dev.name(),
                                        self.geometry.real_zone_size()),
            StatusType::Table => self.dev.name().to_owned(),
            StatusType::Ima => String::new(),
        }
    }
}

// LCOV_EXCL_STOP
