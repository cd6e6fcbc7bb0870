// vim: tw=80
//! A zoned block device simulated on top of an ordinary file
//!
//! Every zone is sequential-write-required.  Write pointers and zone
//! conditions live only in memory.

use std::{
    cmp,
    fs::{File, OpenOptions},
    num::NonZeroU64,
    os::unix::fs::FileExt,
    path::{Path, PathBuf},
    sync::{Arc, Mutex}
};

use futures::{future, stream};
use tokio::task;
use tracing::debug;

use crate::{
    bio::{Bio, Completion, Op},
    types::*,
    util::*,
    vdev::*,
    zone::{Zone, ZoneCond, ZoneType},
    zoned_device::*
};

#[derive(Clone, Copy, Debug)]
struct ZoneState {
    wp: SectorT,
    cond: ZoneCond,
}

/// `ZonedFile`: File-backed zoned device
///
/// The file's size is rounded down to whole sectors.  If that isn't a whole
/// number of zones then the last zone is short.
#[derive(Debug)]
pub struct ZonedFile {
    file: Arc<File>,
    name: String,
    path: PathBuf,
    /// Size in sectors
    size: SectorT,
    zone_sectors: SectorT,
    zones: Arc<Mutex<Vec<ZoneState>>>,
}

impl ZonedFile {
    /// Open a file as a freshly reset zoned device: every zone is empty.
    pub async fn create<P>(path: P, zone_sectors: NonZeroU64) -> Result<Self>
        where P: AsRef<Path>
    {
        ZonedFile::open_with(path.as_ref(), zone_sectors, ZoneCond::Empty).await
    }

    /// Open a file as a zoned device whose zones are all full.
    ///
    /// The file's existing contents are readable, and each zone must be reset
    /// before it can be written.
    pub async fn open<P>(path: P, zone_sectors: NonZeroU64) -> Result<Self>
        where P: AsRef<Path>
    {
        ZonedFile::open_with(path.as_ref(), zone_sectors, ZoneCond::Full).await
    }

    async fn open_with(path: &Path, zone_sectors: NonZeroU64, cond: ZoneCond)
        -> Result<Self>
    {
        let pb = path.to_path_buf();
        let (file, len) = task::spawn_blocking(move || {
            let f = OpenOptions::new()
                .read(true)
                .write(true)
                .open(pb)?;
            let len = f.metadata()?.len();
            Ok::<_, Error>((f, len))
        }).await
        .map_err(|_| Error::ECANCELED)??;
        let zs = zone_sectors.get();
        let size = len >> SECTOR_SHIFT;
        let nzones = size.div_ceil(zs);
        let zones = (0..nzones).map(|z| {
            let start = z * zs;
            let end = cmp::min(start.saturating_add(zs), size);
            let wp = if cond == ZoneCond::Full { end } else { start };
            ZoneState { wp, cond }
        }).collect::<Vec<_>>();
        let name = path.to_string_lossy().into_owned();
        debug!("opened {name}: {size} sectors in {nzones} zones of {zs}");
        Ok(ZonedFile {
            file: Arc::new(file),
            name,
            path: path.to_path_buf(),
            size,
            zone_sectors: zs,
            zones: Arc::new(Mutex::new(zones))
        })
    }

    /// Asynchronously read a contiguous portion of the device.
    ///
    /// Sectors at or beyond their zone's write pointer read as zeros.
    fn read(&self, mut bio: Bio) -> BoxCompletionFut {
        if bio.sector > self.size || bio.nr_sectors() > self.size - bio.sector
        {
            return ready(Completion::err(bio, Error::EIO));
        }
        // Ranges to zero, relative to the start of the request
        let zones = self.zones.lock().unwrap();
        let mut unwritten = Vec::new();
        let mut sector = bio.sector;
        while sector < bio.end_sector() {
            let z = sector / self.zone_sectors;
            let zend = cmp::min(self.zone_limits(z as ZoneT).1,
                                bio.end_sector());
            let wp = zones[z as usize].wp;
            if wp < zend {
                let from = cmp::max(wp, sector) - bio.sector;
                unwritten.push((from, zend - bio.sector));
            }
            sector = zend;
        }
        drop(zones);

        let Some(mut buf) = bio.take_read_buf() else {
            return ready(Completion::err(bio, Error::EINVAL));
        };
        let off = bio.sector << SECTOR_SHIFT;
        let file = self.file.clone();
        Box::pin(async move {
            let r = task::spawn_blocking(move || {
                let status = file.read_exact_at(&mut buf[..], off)
                    .map(|_| {
                        for (from, to) in unwritten {
                            let r = sectors2bytes(from)..sectors2bytes(to);
                            buf[r].fill(0);
                        }
                    }).map_err(Error::from);
                (buf, status)
            }).await;
            match r {
                Ok((buf, status)) => {
                    bio.restore_read_buf(buf);
                    Completion::new(bio, status)
                }
                Err(_) => Completion::err(bio, Error::ECANCELED)
            }
        })
    }

    /// Advance the write pointer of the zone containing `sector` by `len`
    /// sectors.
    ///
    /// `sector` must lie at the zone's write pointer.  If `None`, then the
    /// write lands at the write pointer, wherever that may be.
    ///
    /// Returns the sector at which the write lands, and the zone's condition
    /// beforehand.
    fn reserve(&self, zone: ZoneT, sector: Option<SectorT>, len: SectorT)
        -> Result<(SectorT, ZoneCond)>
    {
        let (_, end) = self.zone_limits(zone);
        let mut zones = self.zones.lock().unwrap();
        let state = &mut zones[zone as usize];
        if !state.cond.is_writable() {
            debug!("zone {zone} is {}", state.cond);
            return Err(Error::EIO);
        }
        if sector.is_some_and(|s| s != state.wp) {
            debug!("unaligned write to zone {zone}: sector {:?} wp {}",
                sector, state.wp);
            return Err(Error::EIO);
        }
        if len > end - state.wp {
            return Err(Error::EIO);
        }
        let landing = state.wp;
        let prior = state.cond;
        state.wp += len;
        if state.wp == end {
            state.cond = ZoneCond::Full;
        } else if state.cond != ZoneCond::ExplicitOpen {
            state.cond = ZoneCond::ImplicitOpen;
        }
        Ok((landing, prior))
    }

    /// Asynchronously write at a zone's write pointer.
    ///
    /// Appends supply the zone's start sector, and learn the landing sector
    /// from the completed `Bio`.  Plain writes must supply the write pointer
    /// itself.  If the write fails, the write pointer is rolled back.
    fn write(&self, mut bio: Bio) -> BoxCompletionFut {
        if bio.sector >= self.size || bio.nr_sectors() > self.size - bio.sector
        {
            return ready(Completion::err(bio, Error::EIO));
        }
        let Some(buf) = bio.write_buf().cloned() else {
            return ready(Completion::err(bio, Error::EINVAL));
        };
        let zone = (bio.sector / self.zone_sectors) as ZoneT;
        let len = bio.nr_sectors();
        let r = if bio.op == Op::ZoneAppend {
            if bio.sector != self.zone_limits(zone).0 {
                return ready(Completion::err(bio, Error::EINVAL));
            }
            self.reserve(zone, None, len)
        } else {
            self.reserve(zone, Some(bio.sector), len)
        };
        let (landing, prior) = match r {
            Ok(x) => x,
            Err(e) => return ready(Completion::err(bio, e))
        };
        bio.sector = landing;

        let file = self.file.clone();
        let zones = self.zones.clone();
        Box::pin(async move {
            let off = landing << SECTOR_SHIFT;
            let status = task::spawn_blocking(move || {
                file.write_all_at(&buf[..], off).map_err(Error::from)
            }).await
            .unwrap_or(Err(Error::ECANCELED));
            if status.is_err() {
                unreserve(&zones, zone, landing, len, prior);
            }
            Completion::new(bio, status)
        })
    }

    fn flush(&self, bio: Bio) -> BoxCompletionFut {
        let file = self.file.clone();
        Box::pin(async move {
            let status = task::spawn_blocking(move || file.sync_all())
                .await
                .map_err(|_| Error::ECANCELED)
                .and_then(|r| r.map_err(Error::from));
            Completion::new(bio, status)
        })
    }

    /// The pathname used to open this device.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Synchronously apply a zone management operation
    fn zone_mgmt(&self, bio: &Bio) -> Result<()> {
        let mut zones = self.zones.lock().unwrap();
        if bio.op == Op::ZoneResetAll {
            for (z, state) in zones.iter_mut().enumerate() {
                state.wp = z as SectorT * self.zone_sectors;
                state.cond = ZoneCond::Empty;
            }
            return Ok(());
        }
        if bio.sector >= self.size || bio.sector % self.zone_sectors != 0 {
            return Err(Error::EINVAL);
        }
        let zone = (bio.sector / self.zone_sectors) as ZoneT;
        let (start, end) = self.zone_limits(zone);
        let state = &mut zones[zone as usize];
        match bio.op {
            Op::ZoneReset => {
                state.wp = start;
                state.cond = ZoneCond::Empty;
            }
            Op::ZoneOpen => {
                if state.cond != ZoneCond::Full {
                    state.cond = ZoneCond::ExplicitOpen;
                }
            }
            Op::ZoneClose => {
                if state.cond.is_open() {
                    state.cond = if state.wp == start {
                        ZoneCond::Empty
                    } else {
                        ZoneCond::Closed
                    };
                }
            }
            Op::ZoneFinish => {
                state.wp = end;
                state.cond = ZoneCond::Full;
            }
            _ => unreachable!("not a zone management op")
        }
        Ok(())
    }
}

/// Undo a [`reserve`](ZonedFile::reserve) whose write failed.
///
/// Only possible if no later write has landed in the same zone.
fn unreserve(
    zones: &Mutex<Vec<ZoneState>>,
    zone: ZoneT,
    landing: SectorT,
    len: SectorT,
    prior: ZoneCond)
{
    let mut zones = zones.lock().unwrap();
    let state = &mut zones[zone as usize];
    if state.wp == landing + len {
        debug!("rolling back failed write to zone {zone} at {landing}");
        state.wp = landing;
        state.cond = prior;
    }
}

fn ready(completion: Completion) -> BoxCompletionFut {
    Box::pin(future::ready(completion))
}

impl Vdev for ZonedFile {
    fn sector2zone(&self, sector: SectorT) -> Option<ZoneT> {
        if sector < self.size {
            Some((sector / self.zone_sectors) as ZoneT)
        } else {
            None
        }
    }

    fn size(&self) -> SectorT {
        self.size
    }

    fn zone_limits(&self, zone: ZoneT) -> (SectorT, SectorT) {
        let start = u64::from(zone) * self.zone_sectors;
        let end = cmp::min(start.saturating_add(self.zone_sectors), self.size);
        (start, end)
    }

    fn zones(&self) -> ZoneT {
        self.size.div_ceil(self.zone_sectors) as ZoneT
    }
}

impl ZonedDevice for ZonedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_zoned(&self) -> bool {
        true
    }

    fn zone_sectors(&self) -> SectorT {
        self.zone_sectors
    }

    fn submit(&self, bio: Bio) -> BoxCompletionFut {
        match bio.op {
            Op::Read => self.read(bio),
            op if op.is_write() => self.write(bio),
            Op::Flush => self.flush(bio),
            Op::Discard => ready(Completion::err(bio, Error::EOPNOTSUPP)),
            _ => {
                let status = self.zone_mgmt(&bio);
                ready(Completion::new(bio, status))
            }
        }
    }

    fn report_zones(&self, sector: SectorT, nr_zones: u32) -> BoxZoneStream {
        let first = sector / self.zone_sectors;
        let zones = self.zones.lock().unwrap();
        let report = zones.iter()
            .enumerate()
            .skip(first as usize)
            .take(nr_zones as usize)
            .map(|(z, state)| {
                let (start, end) = self.zone_limits(z as ZoneT);
                Ok(Zone {
                    start,
                    len: end - start,
                    wp: state.wp,
                    capacity: end - start,
                    zone_type: ZoneType::SeqWriteRequired,
                    cond: state.cond
                })
            }).collect::<Vec<_>>();
        Box::pin(stream::iter(report))
    }
}

// LCOV_EXCL_STOP
