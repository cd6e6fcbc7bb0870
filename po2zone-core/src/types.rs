// vim: tw=80
//! Common type definitions used throughout po2zone

use divbuf::{DivBuf, DivBufMut};
use enum_primitive_derive::Primitive;
use num_traits::{FromPrimitive, ToPrimitive};
use thiserror::Error;
use std::io;

/// Our `IoVec`.  Unlike the standard library's, ours is reference-counted so it
/// can have more than one owner.
pub type IoVec = DivBuf;

/// Mutable version of `IoVec`.  Uniquely owned.
pub type IoVecMut = DivBufMut;

/// Indexes a sector.  Sectors are always 512 bytes, regardless of the
/// underlying device's logical block size.
pub type SectorT = u64;

/// Indexes a device's Zones.
pub type ZoneT = u32;

/// po2zone's error type.  Basically just an errno
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq, Primitive)]
pub enum Error {
    // Standard errnos
    #[error("Operation not permitted")]
    EPERM           = libc::EPERM as isize,
    #[error("No such file or directory")]
    ENOENT          = libc::ENOENT as isize,
    #[error("Interrupted system call")]
    EINTR           = libc::EINTR as isize,
    #[error("Input/output error")]
    EIO             = libc::EIO as isize,
    #[error("Device not configured")]
    ENXIO           = libc::ENXIO as isize,
    #[error("Bad file descriptor")]
    EBADF           = libc::EBADF as isize,
    #[error("Cannot allocate memory")]
    ENOMEM          = libc::ENOMEM as isize,
    #[error("Permission denied")]
    EACCES          = libc::EACCES as isize,
    #[error("Device busy")]
    EBUSY           = libc::EBUSY as isize,
    #[error("File exists")]
    EEXIST          = libc::EEXIST as isize,
    #[error("Operation not supported by device")]
    ENODEV          = libc::ENODEV as isize,
    #[error("Is a directory")]
    EISDIR          = libc::EISDIR as isize,
    #[error("Invalid argument")]
    EINVAL          = libc::EINVAL as isize,
    #[error("File too large")]
    EFBIG           = libc::EFBIG as isize,
    #[error("No space left on device")]
    ENOSPC          = libc::ENOSPC as isize,
    #[error("Read-only file system")]
    EROFS           = libc::EROFS as isize,
    #[error("Resource temporarily unavailable")]
    EAGAIN          = libc::EAGAIN as isize,
    #[error("Operation not supported")]
    EOPNOTSUPP      = libc::EOPNOTSUPP as isize,
    #[error("Operation timed out")]
    ETIMEDOUT       = libc::ETIMEDOUT as isize,
    #[error("Value too large to be stored in data type")]
    EOVERFLOW       = libc::EOVERFLOW as isize,
    #[error("Operation canceled")]
    ECANCELED       = libc::ECANCELED as isize,

    //// po2zone custom error types below
    #[error("Unknown error")]
    EUNKNOWN        = 256,
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        e.raw_os_error()
            .and_then(Error::from_i32)
            .unwrap_or(Error::EUNKNOWN)
    }
}

impl From<nix::Error> for Error {
    fn from(e: nix::Error) -> Self {
        Error::from_i32(e as i32).unwrap_or(Error::EUNKNOWN)
    }
}

impl From<Error> for i32 {
    fn from(e: Error) -> Self {
        match e {
            Error::EUNKNOWN =>
                panic!("Unknown error codes should never be exposed"),
            _ => e.to_i32().unwrap()
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;

/// Reasons why a target could not be constructed.
///
/// Every one of them aborts construction.  Any device handle acquired along
/// the way is released before the error is returned.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// The target takes exactly one argument: the device identifier.
    #[error("Invalid argument count: expected 1, got {0}")]
    InvalidArgumentCount(usize),
    #[error("Device lookup failed: {0}")]
    DeviceLookup(Error),
    #[error("Not a zoned device")]
    NotZoned,
    #[error("Partial mapping of the target is not supported")]
    PartialMappingUnsupported,
    /// The device's capacity is not a whole number of zones
    #[error("Device capacity is not a multiple of the zone size")]
    UnalignedCapacity,
    /// Zero, or too large to round up to a power of two
    #[error("Invalid zone size")]
    InvalidZoneSize,
    /// The emulated device would have more zones, or more sectors, than we
    /// can address.
    #[error("Too many zones")]
    TooManyZones,
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::DeviceLookup(e) => e,
            _ => Error::EINVAL
        }
    }
}

/// Per-request I/O failures
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum IoError {
    /// A write-class operation touched the padding at the tail of an emulated
    /// zone.  Nothing was sent to the device.
    #[error("I/O to the padding region of an emulated zone")]
    PaddingRegionNotWritable,
    /// The request begins before the start of the mapping
    #[error("I/O outside of the mapped range")]
    OutOfRange,
    /// The device itself failed the request
    #[error(transparent)]
    Device(#[from] Error),
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::PaddingRegionNotWritable => Error::EIO,
            IoError::OutOfRange => Error::EIO,
            IoError::Device(e) => e
        }
    }
}

// LCOV_EXCL_STOP
