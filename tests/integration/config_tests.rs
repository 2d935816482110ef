use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::warden_command;

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("warden.toml"), "[flags\nrate = oops").unwrap();

    warden_command(&dir, &["--oneshot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Unable to properly parse or create the config file.",
        ));
}

#[test]
fn test_missing_config_is_created() {
    let dir = tempfile::tempdir().unwrap();

    warden_command(&dir, &["--oneshot"]).assert().success();

    let written = std::fs::read_to_string(dir.path().join("warden.toml")).unwrap();
    assert!(written.contains("[[blacklist]]"));
}

#[test]
fn test_config_rate_too_small_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("warden.toml"), "[flags]\nrate = \"10ms\"").unwrap();

    warden_command(&dir, &["--oneshot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 250 milliseconds"));
}

#[test]
fn test_seeded_blacklist_oneshot_runs() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("warden.toml"),
        r#"
            [[blacklist]]
            name = "warden-test-process-that-does-not-exist"
            auto_kill = false
        "#,
    )
    .unwrap();

    // A watched-but-not-running name is skipped outright; the tick must
    // still succeed.
    warden_command(&dir, &["--oneshot"]).assert().success();
}
