// vim: tw=80
//! Registry of the target types known to a block target framework
//!
//! There is no global registry.  Whoever owns a `Registry` decides which
//! targets it contains, so independent registries never collide.

use std::{collections::BTreeMap, fmt};

use tracing::debug;

use crate::types::*;

bitflags::bitflags! {
    /// Capability flags advertised by a target type
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Features: u64 {
        /// The target presents a host-managed zoned device
        const ZONED_HM = 1 << 6;
        /// The target never sleeps while mapping a request
        const NOWAIT = 1 << 7;
        /// The target's zones do not match those of the underlying device
        const EMULATED_ZONES = 1 << 10;
    }
}

/// Describes a kind of target
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TargetType {
    pub name: &'static str,
    /// Major, minor, and patch
    pub version: [u32; 3],
    pub features: Features,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, patch] = self.version;
        write!(f, "{} v{major}.{minor}.{patch}", self.name)
    }
}

/// A set of target types, indexed by name
#[derive(Debug, Default)]
pub struct Registry {
    types: BTreeMap<&'static str, TargetType>,
}

impl Registry {
    /// Lookup a target type by name
    pub fn get(&self, name: &str) -> Option<&TargetType> {
        self.types.get(name)
    }

    /// Iterate through all registered types, in name order
    pub fn iter(&self) -> impl Iterator<Item = &TargetType> {
        self.types.values()
    }

    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new target type.  Fails with `EEXIST` if one by the same name is
    /// already registered.
    pub fn register(&mut self, tt: TargetType) -> Result<()> {
        if self.types.contains_key(tt.name) {
            return Err(Error::EEXIST);
        }
        debug!("registering target type {tt}");
        self.types.insert(tt.name, tt);
        Ok(())
    }

    /// Remove a target type, returning it.  Fails with `ENOENT` if no such
    /// type is registered.
    pub fn unregister(&mut self, name: &str) -> Result<TargetType> {
        let tt = self.types.remove(name).ok_or(Error::ENOENT)?;
        debug!("unregistered target type {tt}");
        Ok(tt)
    }
}

// LCOV_EXCL_STOP
