//! These tests are mostly here just to ensure that invalid results will be
//! caught when passing arguments.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::warden_command;

#[test]
fn test_small_rate() {
    let dir = tempfile::tempdir().unwrap();
    warden_command(&dir, &["-r", "249"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 250 milliseconds"));
}

#[test]
fn test_garbage_rate() {
    let dir = tempfile::tempdir().unwrap();
    warden_command(&dir, &["-r", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid tick rate"));
}

#[test]
fn test_oneshot_with_empty_blacklist() {
    let dir = tempfile::tempdir().unwrap();
    warden_command(&dir, &["--oneshot"]).assert().success();
}

#[test]
fn test_version() {
    let dir = tempfile::tempdir().unwrap();
    warden_command(&dir, &["--version"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
