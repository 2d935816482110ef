use std::process::Command;

const WARDEN_EXE_PATH: &str = env!("CARGO_BIN_EXE_warden");

/// Returns a [`Command`] invoking the warden binary with the given
/// arguments, pointed at a config file inside `dir` so that tests never
/// touch the user's real config, and with persistence disabled unless the
/// test opts back in.
pub fn warden_command(dir: &tempfile::TempDir, args: &[&str]) -> Command {
    let config = dir.path().join("warden.toml");

    let mut cmd = Command::new(WARDEN_EXE_PATH);
    cmd.arg("-C").arg(&config);
    if !args.contains(&"-s") && !args.contains(&"--state") {
        cmd.arg("--no_persist");
    }
    cmd.args(args);
    cmd
}
