// vim: tw=80
//! Emulated zone geometry, and translation between address spaces
//!
//! There are two sector address spaces.  The *physical* space is that of the
//! underlying device, whose zones are `real_zone_size` sectors each.  The
//! *virtual* space is the one we present, whose zones are `virtual_zone_size`
//! sectors each, the next power of two.  The last `padding_len` sectors of each
//! virtual zone have no physical backing.
//!
//! ```text
//! physical: |  zone 0  |  zone 1  |  zone 2  |
//! virtual:  |  zone 0  ..|  zone 1  ..|  zone 2  ..|
//! ```

use std::fmt;

use crate::types::*;

/// Non-fatal conditions detected while computing a `ZoneGeometry`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Warning {
    /// The device's zone size is already a power of two.  Emulation is
    /// unnecessary, but harmless: every translation is the identity.
    AlreadyPowerOfTwo,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::AlreadyPowerOfTwo => f.write_str(
                "underlying device has a power-of-2 number of sectors per zone")
        }
    }
}

/// Immutable description of the emulated zones.
///
/// Computed once when the target is constructed, and never modified after.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ZoneGeometry {
    /// First virtual sector of the mapping
    begin: SectorT,
    /// Zone size of the physical device
    real_zone_size: SectorT,
    /// `real_zone_size` rounded up to a power of two
    virtual_zone_size: SectorT,
    /// log2 of `virtual_zone_size`
    shift: u32,
    /// Unbacked sectors at the tail of each virtual zone
    padding_len: SectorT,
    zone_count: ZoneT,
}

impl ZoneGeometry {
    /// Compute the emulated geometry for a physical device.
    ///
    /// # Arguments
    ///
    /// - `real_zone_size`: Sectors per zone on the physical device
    /// - `capacity`:       Total sectors of the physical device
    /// - `begin`:          First virtual sector of the mapping.  Usually 0.
    /// - `len`:            Requested length of the mapping.  Only the whole
    ///                     device may be mapped, so this must equal
    ///                     `capacity`.
    pub fn new(
        real_zone_size: SectorT,
        capacity: SectorT,
        begin: SectorT,
        len: SectorT
    ) -> std::result::Result<Self, ConfigError>
    {
        if len != capacity {
            return Err(ConfigError::PartialMappingUnsupported);
        }
        if real_zone_size == 0 {
            return Err(ConfigError::InvalidZoneSize);
        }
        let virtual_zone_size = real_zone_size.checked_next_power_of_two()
            .ok_or(ConfigError::InvalidZoneSize)?;
        let shift = virtual_zone_size.trailing_zeros();
        let padding_len = virtual_zone_size - real_zone_size;
        if capacity % real_zone_size != 0 {
            return Err(ConfigError::UnalignedCapacity);
        }
        let zone_count = ZoneT::try_from(capacity / real_zone_size)
            .map_err(|_| ConfigError::TooManyZones)?;
        u64::from(zone_count).checked_mul(virtual_zone_size)
            .and_then(|vlen| vlen.checked_add(begin))
            .ok_or(ConfigError::TooManyZones)?;
        Ok(ZoneGeometry {
            begin,
            real_zone_size,
            virtual_zone_size,
            shift,
            padding_len,
            zone_count
        })
    }

    /// First virtual sector of the mapping
    pub fn begin(&self) -> SectorT {
        self.begin
    }

    /// Sectors of unwritable padding at the end of every virtual zone
    pub fn padding_len(&self) -> SectorT {
        self.padding_len
    }

    /// Total sectors of the physical device
    pub fn physical_length(&self) -> SectorT {
        u64::from(self.zone_count) * self.real_zone_size
    }

    pub fn real_zone_size(&self) -> SectorT {
        self.real_zone_size
    }

    /// log2 of the virtual zone size
    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Total sectors presented to upper layers, padding included
    pub fn virtual_length(&self) -> SectorT {
        u64::from(self.zone_count) * self.virtual_zone_size
    }

    pub fn virtual_zone_size(&self) -> SectorT {
        self.virtual_zone_size
    }

    /// Any non-fatal problem with this geometry
    pub fn warning(&self) -> Option<Warning> {
        if self.real_zone_size.is_power_of_two() {
            Some(Warning::AlreadyPowerOfTwo)
        } else {
            None
        }
    }

    pub fn zone_count(&self) -> ZoneT {
        self.zone_count
    }

    /// Index of the zone containing a physical sector
    pub fn zone_index_physical(&self, sector: SectorT) -> u64 {
        sector / self.real_zone_size
    }

    /// Index of the zone containing a target-relative virtual sector
    pub fn zone_index_virtual(&self, sector: SectorT) -> u64 {
        sector >> self.shift
    }

    /// Offset of a target-relative virtual sector within its zone
    pub fn zone_offset_virtual(&self, sector: SectorT) -> SectorT {
        sector & (self.virtual_zone_size - 1)
    }

    /// Translate a physical sector into the virtual space.
    ///
    /// The result includes the mapping's `begin` offset.
    pub fn physical_to_virtual(&self, sector: SectorT) -> SectorT {
        sector + self.zone_index_physical(sector) * self.padding_len +
            self.begin
    }

    /// Translate a target-relative virtual sector into the physical space.
    ///
    /// The result is meaningless for sectors within the padding region.
    pub fn virtual_to_physical(&self, sector: SectorT) -> SectorT {
        sector - self.zone_index_virtual(sector) * self.padding_len
    }

    /// Convert a virtual sector to one relative to the start of the mapping.
    ///
    /// Returns `None` for sectors that precede the mapping.
    pub fn target_offset(&self, sector: SectorT) -> Option<SectorT> {
        sector.checked_sub(self.begin)
    }
}

// LCOV_EXCL_STOP
