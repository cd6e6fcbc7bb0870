// vim: tw=80
use pretty_assertions::assert_eq;

use super::*;

/// Every zone starts at a multiple of the emulated zone size.  Files opened
/// by the CLI are treated as already written, so every zone is full.
#[rstest]
fn parseable(harness: Harness) {
    let (path, _tempdir) = harness;
    let output = po2zone()
        .args(["-z", "768", "report-zones", "-H"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let expected = (0..4u64).map(|z| {
        format!("{}\t{}\t1024\t768\t{}\tseq-write-required\tfull\n",
            z, z * 1024, (z + 1) * 1024)
    }).collect::<String>();
    assert_eq!(stdout, expected);
}

#[rstest]
fn start_and_count(harness: Harness) {
    let (path, _tempdir) = harness;
    let output = po2zone()
        .args(["-z", "768", "report-zones", "-H", "-s", "1500", "-n", "2"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let starts = stdout.lines()
        .map(|l| l.split('\t').nth(1).unwrap().to_owned())
        .collect::<Vec<_>>();
    assert_eq!(starts, vec!["1024", "2048"]);
}

#[rstest]
fn table(harness: Harness) {
    let (path, _tempdir) = harness;
    po2zone()
        .args(["-z", "768", "report-zones"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("IDX"))
        .stdout(predicate::str::contains("COND"))
        .stdout(predicate::str::contains("3072"));
}
