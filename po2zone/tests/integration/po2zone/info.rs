// vim: tw=80
use super::*;

#[rstest]
fn ok(harness: Harness) {
    let (path, _tempdir) = harness;
    po2zone()
        .args(["-z", "768", "info"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Target:              po2zoned v1.0.0"))
        .stdout(predicate::str::contains("Zones:               4\n"))
        .stdout(predicate::str::contains("Emulated zone size:  1024\n"))
        .stdout(predicate::str::contains("Padding per zone:    256\n"))
        .stdout(predicate::str::contains("Emulated length:     4096\n"))
        .stdout(predicate::str::contains("Warning").not());
}

/// Power-of-two zones are passed through, with a warning
#[test]
fn power_of_two() {
    let (path, _tempdir) = make_zoned_file("power_of_two.", 1024, 4 * 1024);
    po2zone()
        .args(["-z", "1024", "info"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Padding per zone:    0\n"))
        .stdout(predicate::str::contains("Warning:"));
}

/// The backing file must hold a whole number of zones
#[rstest]
fn unaligned(harness: Harness) {
    let (path, _tempdir) = harness;
    po2zone()
        .args(["-z", "1000", "info"])
        .arg(&path)
        .assert()
        .failure();
}

/// Zone sizes too large to round up to a power of two are an error, not a
/// crash
#[rstest]
#[case("18446744073709551615")]
#[case("9223372036854775809")]
fn huge_zone_size(harness: Harness, #[case] zone_size: &str) {
    let (path, _tempdir) = harness;
    po2zone()
        .args(["-z", zone_size, "info"])
        .arg(&path)
        .assert()
        .code(1);
}
