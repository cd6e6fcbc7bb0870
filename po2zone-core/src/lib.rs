// vim: tw=80
//! Power-of-two zone emulation
//!
//! Presents a zoned block device whose zone size is not a power of two as a
//! zoned device whose zone size is.  Every zone is padded out to the next power
//! of two with an unwritable region that reads as zeros.

pub mod bio;
pub mod device_manager;
pub mod geometry;
pub mod mapped_device;
pub mod registry;
pub mod report;
pub mod target;
pub mod types;
pub mod util;
pub mod vdev;
pub mod zone;
pub mod zoned_device;
pub mod zoned_file;

pub use crate::types::*;
pub use crate::util::*;
