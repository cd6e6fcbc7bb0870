// vim: tw=80

use std::{
    collections::BTreeMap,
    num::NonZeroU64,
    path::Path,
    sync::{Arc, Mutex}
};

use tracing::debug;

use crate::{
    types::*,
    zoned_device::ZonedDevice,
    zoned_file::ZonedFile
};

struct Entry {
    dev: Arc<dyn ZonedDevice>,
    /// Number of outstanding `open`s
    holders: usize,
}

/// Resolves device identifiers into device handles.
///
/// Devices become known either by being added directly, or by tasting a
/// file.  Each successful `open` must be balanced by a `put`.
#[derive(Default)]
pub struct DevManager {
    inner: Mutex<BTreeMap<String, Entry>>,
}

impl DevManager {
    /// Make a device available for opening, under its own name.
    pub fn add(&self, dev: Arc<dyn ZonedDevice>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let name = dev.name().to_owned();
        if inner.contains_key(&name) {
            return Err(Error::EEXIST);
        }
        debug!("adding device {name}");
        inner.insert(name, Entry { dev, holders: 0 });
        Ok(())
    }

    /// How many times has the named device been opened and not yet put?
    pub fn holders(&self, ident: &str) -> Option<usize> {
        self.inner.lock().unwrap()
            .get(ident)
            .map(|entry| entry.holders)
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a handle to the named device.
    pub fn open(&self, ident: &str) -> Result<Arc<dyn ZonedDevice>> {
        if ident.is_empty() {
            return Err(Error::EINVAL);
        }
        let mut inner = self.inner.lock().unwrap();
        let entry = inner.get_mut(ident).ok_or(Error::ENOENT)?;
        entry.holders += 1;
        Ok(entry.dev.clone())
    }

    /// Release a handle previously acquired by [`open`](Self::open).
    pub fn put(&self, dev: Arc<dyn ZonedDevice>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.get_mut(dev.name()) {
            debug_assert!(entry.holders > 0, "unbalanced put");
            entry.holders = entry.holders.saturating_sub(1);
        }
    }

    /// Open the file at `path` as a zoned device with `zone_sectors` sectors
    /// per zone, and retain it for later opening.
    ///
    /// Returns the identifier by which it may be opened.
    pub async fn taste<P: AsRef<Path>>(&self, path: P, zone_sectors: NonZeroU64)
        -> Result<String>
    {
        let zf = ZonedFile::open(path, zone_sectors).await?;
        let name = zf.name().to_owned();
        self.add(Arc::new(zf))?;
        Ok(name)
    }
}

// LCOV_EXCL_STOP
