#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::path::Path;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(15);

/// Create a configured `sdkref` command isolated from the caller's settings.
#[allow(dead_code)]
pub fn sdkref_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sdkref"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.current_dir(dir);
    cmd.env_remove("SDKREF_CONFIG");
    cmd.env_remove("SDKREF_DOCS_DIR");
    cmd.env("SDKREF_CACHE_DIR", dir.join("cache"));
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Write a settings file into `dir` and return its path.
#[allow(dead_code)]
pub fn write_settings(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("sdkref.toml");
    std::fs::write(&path, content).expect("failed to write settings");
    path
}
