// vim: tw=80
use std::path::PathBuf;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;

mod info;
mod report_zones;

type Harness = (PathBuf, TempDir);

/// A backing file of four 768-sector zones
#[fixture]
fn harness() -> Harness {
    make_zoned_file(concat!(module_path!(), "."), 768, 4 * 768)
}

#[test]
fn version() {
    po2zone()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("po2zone "));
}

#[rstest]
fn enoent(harness: Harness) {
    let (path, _tempdir) = harness;
    po2zone()
        .args(["-z", "768", "info"])
        .arg(path.with_file_name("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("ENOENT"));
}
