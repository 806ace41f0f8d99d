//! Integration tests for the `bobbind` binary entry point.
//!
//! Runs the host with no flags against a scratch home directory and checks
//! that it answers the editor, and that an unusable timeout stops startup.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::TempDir;

const CONFIG_VARS: [&str; 4] = [
    "BOBBIN_LOG_FILTER",
    "BOBBIN_LOG_FORMAT",
    "BOBBIN_PLUGIN_RUNNER",
    "BOBBIN_PLUGIN_TIMEOUT_SECS",
];

fn isolated_host(home: &TempDir) -> assert_cmd::Command {
    let mut command = cargo_bin_cmd!("bobbind");
    command
        .current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path());
    for key in CONFIG_VARS {
        command.env_remove(key);
    }
    command
}

#[test]
fn starts_with_defaults_and_answers_poll() {
    let home = TempDir::new().expect("create temp home");
    let mut command = isolated_host(&home);
    command.write_stdin("[0,1,\"poll\",[]]\n");
    command
        .assert()
        .success()
        .stdout(contains("[1,1,null,\"ok\"]"));
}

#[test]
fn zero_plugin_timeout_exits_with_failure() {
    let home = TempDir::new().expect("create temp home");
    let mut command = isolated_host(&home);
    command.args(["--plugin-timeout-secs", "0"]);
    command
        .assert()
        .failure()
        .stderr(contains("plugin_timeout_secs"));
}
