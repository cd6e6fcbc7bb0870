// vim: tw=80
use std::{
    fs,
    io::{Read, Seek, SeekFrom, Write}
};

use divbuf::DivBufShared;
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use tempfile::Builder;

use po2zone_core::{
    BYTES_PER_SECTOR,
    Error,
    bio::{Bio, Op},
    vdev::Vdev,
    zone::ZoneCond,
    zoned_device::ZonedDevice,
    zoned_file::ZonedFile
};

use super::*;

#[tokio::test]
async fn create_enoent() {
    let dir = t!(Builder::new().prefix("test_create_enoent").tempdir());
    let path = dir.path().join("zdev");
    let e = ZonedFile::create(path, zone_sectors()).await.err();
    assert_eq!(e, Some(Error::ENOENT));
}

/// Data written to the device lands at the same offset in the file
#[tokio::test]
async fn write_lands_in_file() {
    let (_tempdir, path) = make_file("test_write_lands_in_file", 4 * 768);
    let zf = t!(ZonedFile::create(&path, zone_sectors()).await);
    let dbs = DivBufShared::from(vec![42u8; 4 * BYTES_PER_SECTOR]);
    let bio = Bio::write(dbs.try_const().unwrap(), 768);
    t!(zf.submit(bio).await.status);

    let mut f = t!(fs::File::open(&path));
    let mut rbuf = vec![0u8; 4 * BYTES_PER_SECTOR];
    t!(f.seek(SeekFrom::Start(768 * BYTES_PER_SECTOR as u64)));
    t!(f.read_exact(&mut rbuf));
    assert_eq!(rbuf, vec![42u8; 4 * BYTES_PER_SECTOR]);
}

/// `open` treats the file's existing contents as written data
#[tokio::test]
async fn open_existing() {
    let (_tempdir, path) = make_file("test_open_existing", 2 * 768);
    {
        let mut f = t!(fs::OpenOptions::new().write(true).open(&path));
        t!(f.seek(SeekFrom::Start(800 * BYTES_PER_SECTOR as u64)));
        t!(f.write_all(&[0xa5u8; BYTES_PER_SECTOR]));
    }
    let zf = t!(ZonedFile::open(&path, zone_sectors()).await);
    assert_eq!(zf.size(), 1536);
    assert_eq!(zf.zones(), 2);

    let dbs = DivBufShared::from(vec![0u8; BYTES_PER_SECTOR]);
    let bio = Bio::read(dbs.try_mut().unwrap(), 800);
    t!(zf.submit(bio).await.status);
    assert_eq!(&dbs.try_const().unwrap()[..], &[0xa5u8; BYTES_PER_SECTOR][..]);

    // Full zones must be reset before they can be written
    let wbuf = DivBufShared::from(vec![0u8; BYTES_PER_SECTOR]);
    let bio = Bio::write(wbuf.try_const().unwrap(), 768);
    assert_eq!(zf.submit(bio).await.status, Err(Error::EIO));
    t!(zf.submit(Bio::zone_mgmt(Op::ZoneReset, 768)).await.status);
    let bio = Bio::write(wbuf.try_const().unwrap(), 768);
    t!(zf.submit(bio).await.status);

    let zones = t!(zf.report_zones(0, 2).try_collect::<Vec<_>>().await);
    assert_eq!(zones[0].cond, ZoneCond::Full);
    assert_eq!(zones[1].cond, ZoneCond::ImplicitOpen);
    assert_eq!(zones[1].wp, 769);
}

#[test_log::test(tokio::test)]
async fn flush() {
    let (_tempdir, path) = make_file("test_flush", 768);
    let zf = t!(ZonedFile::create(&path, zone_sectors()).await);
    t!(zf.submit(Bio::flush()).await.status);
}
