// vim: tw=80
//! End to end tests of the emulated device, backed by a file
use std::sync::Arc;

use divbuf::DivBufShared;
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

use po2zone_core::{
    BYTES_PER_SECTOR,
    Error,
    bio::Op,
    device_manager::DevManager,
    mapped_device::MappedDevice,
    target::Po2Target,
    vdev::Vdev,
    zone::{Zone, ZoneCond},
    zoned_file::ZonedFile
};

use super::*;

struct Harness {
    md: MappedDevice,
    _tempdir: TempDir,
}

/// Four 768-sector zones, emulated as 1024-sector zones
#[fixture]
async fn harness() -> Harness {
    let (tempdir, path) = make_file("test_mapped_device", 4 * 768);
    let zf = t!(ZonedFile::create(&path, zone_sectors()).await);
    let dm = DevManager::new();
    t!(dm.add(Arc::new(zf)));
    let ident = path.to_string_lossy().into_owned();
    let target = t!(Po2Target::construct(&dm, &[ident.as_str()], 0, 4 * 768));
    Harness { md: MappedDevice::new(target), _tempdir: tempdir }
}

fn sectors(n: usize, val: u8) -> DivBufShared {
    DivBufShared::from(vec![val; n * BYTES_PER_SECTOR])
}

async fn report(md: &MappedDevice, sector: u64, nr: u32) -> Vec<Zone> {
    t!(md.report_zones(sector, nr).map_ok(|(_, z)| z).try_collect().await)
}

#[rstest]
#[tokio::test]
#[awt]
async fn geometry(#[future] harness: Harness) {
    assert_eq!(harness.md.size(), 4096);
    assert_eq!(harness.md.zones(), 4);
    assert_eq!(harness.md.zone_limits(3), (3072, 3840));
    assert_eq!(harness.md.target().max_io_len(), 1024);
}

/// A read straddling the end of a zone's backed region gets real data, then
/// zeros.
#[rstest]
#[test_log::test(tokio::test)]
#[awt]
async fn read_straddles_padding(#[future] harness: Harness) {
    let wdbs = sectors(768, 0xa5);
    t!(harness.md.write_at(wdbs.try_const().unwrap(), 0).await);

    let rdbs = sectors(100, 0xff);
    t!(harness.md.read_at(rdbs.try_mut().unwrap(), 700).await);
    let rbuf = rdbs.try_const().unwrap();
    let (data, padding) = rbuf.split_at(68 * BYTES_PER_SECTOR);
    assert!(data.iter().all(|b| *b == 0xa5));
    assert!(padding.iter().all(|b| *b == 0));
}

/// Reading the whole device sees every zone's data, with zeros in between
#[rstest]
#[tokio::test]
#[awt]
async fn read_everything(#[future] harness: Harness) {
    for z in 0..4u8 {
        let wdbs = sectors(768, z + 1);
        let sector = u64::from(z) * 1024;
        t!(harness.md.write_at(wdbs.try_const().unwrap(), sector).await);
    }
    let rdbs = sectors(4096, 0xff);
    t!(harness.md.read_at(rdbs.try_mut().unwrap(), 0).await);
    let rbuf = rdbs.try_const().unwrap();
    for (z, chunk) in rbuf.chunks(1024 * BYTES_PER_SECTOR).enumerate() {
        let (data, padding) = chunk.split_at(768 * BYTES_PER_SECTOR);
        assert!(data.iter().all(|b| *b == z as u8 + 1));
        assert!(padding.iter().all(|b| *b == 0));
    }
}

#[rstest]
#[tokio::test]
#[awt]
async fn write_padding(#[future] harness: Harness) {
    let wdbs = sectors(10, 1);
    let r = harness.md.write_at(wdbs.try_const().unwrap(), 770).await;
    assert_eq!(r, Err(Error::EIO));
    // Nothing reached the device
    let zones = report(&harness.md, 0, 1).await;
    assert_eq!(zones[0].cond, ZoneCond::Empty);
}

/// Writes must still honor the physical write pointer
#[rstest]
#[tokio::test]
#[awt]
async fn write_not_at_wp(#[future] harness: Harness) {
    let wdbs = sectors(1, 1);
    let r = harness.md.write_at(wdbs.try_const().unwrap(), 1025).await;
    assert_eq!(r, Err(Error::EIO));
}

#[rstest]
#[test_log::test(tokio::test)]
#[awt]
async fn zone_append(#[future] harness: Harness) {
    let wdbs = sectors(8, 1);
    let s0 = t!(harness.md.zone_append(wdbs.try_const().unwrap(), 2048).await);
    let s1 = t!(harness.md.zone_append(wdbs.try_const().unwrap(), 2048).await);
    assert_eq!(s0, 2048);
    assert_eq!(s1, 2056);

    let rdbs = sectors(16, 0);
    t!(harness.md.read_at(rdbs.try_mut().unwrap(), 2048).await);
    assert!(rdbs.try_const().unwrap().iter().all(|b| *b == 1));
}

#[rstest]
#[tokio::test]
#[awt]
async fn report_zones(#[future] harness: Harness) {
    let wdbs = sectors(10, 1);
    t!(harness.md.write_at(wdbs.try_const().unwrap(), 1024).await);
    t!(harness.md.zone_mgmt(Op::ZoneFinish, 2048).await);

    let zones = report(&harness.md, 0, 8).await;
    assert_eq!(zones.len(), 4);
    for (z, zone) in zones.iter().enumerate() {
        assert_eq!(zone.start, 1024 * z as u64);
        assert_eq!(zone.len, 1024);
        assert_eq!(zone.capacity, 768);
    }
    assert_eq!(zones[0].wp, 0);
    assert_eq!(zones[0].cond, ZoneCond::Empty);
    assert_eq!(zones[1].wp, 1034);
    assert_eq!(zones[1].cond, ZoneCond::ImplicitOpen);
    assert_eq!(zones[2].wp, 3072);
    assert_eq!(zones[2].cond, ZoneCond::Full);
}

/// Resume a zone report where a previous one left off
#[rstest]
#[tokio::test]
#[awt]
async fn report_zones_resume(#[future] harness: Harness) {
    let mut report = harness.md.report_zones(0, 2);
    let first = t!((&mut report).try_collect::<Vec<_>>().await);
    assert_eq!(first.len(), 2);
    assert_eq!(report.next_sector(), 2048);
    let second = t!(harness.md.report_zones(report.next_sector(), 2)
        .try_collect::<Vec<_>>().await);
    assert_eq!(second[0].1.start, 2048);
    assert_eq!(second[1].1.start, 3072);
}

#[rstest]
#[tokio::test]
#[awt]
async fn reset_all(#[future] harness: Harness) {
    t!(harness.md.zone_mgmt(Op::ZoneFinish, 0).await);
    t!(harness.md.zone_mgmt(Op::ZoneFinish, 3072).await);
    t!(harness.md.zone_mgmt(Op::ZoneResetAll, 0).await);
    for zone in report(&harness.md, 0, 4).await {
        assert_eq!(zone.cond, ZoneCond::Empty);
        assert_eq!(zone.wp, zone.start);
    }
}

#[rstest]
#[tokio::test]
#[awt]
async fn flush(#[future] harness: Harness) {
    t!(harness.md.flush().await);
}

/// When the device's zones are already a power of two, the emulated device is
/// identical to the physical one.
#[test_log::test(tokio::test)]
async fn power_of_two() {
    let (_tempdir, path) = make_file("test_power_of_two", 4 * 1024);
    let zf = t!(ZonedFile::create(&path, nonzero!(1024u64)).await);
    let dm = DevManager::new();
    t!(dm.add(Arc::new(zf)));
    let ident = path.to_string_lossy().into_owned();
    let target = t!(Po2Target::construct(&dm, &[ident.as_str()], 0, 4 * 1024));
    assert_eq!(target.geometry().padding_len(), 0);
    let md = MappedDevice::new(target);

    let wdbs = sectors(1024, 7);
    t!(md.write_at(wdbs.try_const().unwrap(), 1024).await);
    let zones = report(&md, 1024, 1).await;
    assert_eq!(zones[0].start, 1024);
    assert_eq!(zones[0].wp, 2048);
    assert_eq!(zones[0].capacity, 1024);
}
