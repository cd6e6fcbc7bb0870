// vim: tw=80
//! Common utility functions used throughout po2zone

/// log2 of `BYTES_PER_SECTOR`
pub const SECTOR_SHIFT: u32 = 9;

/// Sectors are always 512 bytes, even if the underlying device uses larger
/// logical blocks.
pub const BYTES_PER_SECTOR: usize = 1 << SECTOR_SHIFT;

/// Convert a byte count into whole sectors.
///
/// I/O buffers must always be a whole number of sectors.
pub fn bytes2sectors(bytes: usize) -> u64 {
    debug_assert_eq!(bytes % BYTES_PER_SECTOR, 0,
        "buffer is not a whole number of sectors");
    (bytes >> SECTOR_SHIFT) as u64
}

/// Convert a sector count into bytes
pub fn sectors2bytes(sectors: u64) -> usize {
    (sectors << SECTOR_SHIFT) as usize
}

// LCOV_EXCL_START
#[cfg(test)]
/// Helper to generate the runtime used by most unit tests
pub fn basic_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

// LCOV_EXCL_STOP
