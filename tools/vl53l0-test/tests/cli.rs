// SPDX-License-Identifier: MPL-2.0

use std::{env, fs, process::Output};

use assert_cmd::Command;

fn vl53l0_test(args: &[&str]) -> Output {
    Command::cargo_bin("vl53l0_test")
        .unwrap()
        .args(args)
        .output()
        .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn help_exits_successfully() {
    let output = vl53l0_test(&["-h"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--xtalk-calibration"));
    assert!(stdout.contains("--out-thresholds"));
}

#[test]
fn unknown_flag_is_rejected() {
    let output = vl53l0_test(&["-x"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn missing_device_exits_with_failure() {
    let output = vl53l0_test(&["--device", "/nonexistent/node"]);
    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("Error open stmvl53l0_ranging device"));
}

#[test]
fn device_from_config_file_is_used() {
    let path = env::temp_dir().join(format!("vl53l0-test-cli-{}.toml", std::process::id()));
    fs::write(&path, "device = \"/nonexistent/from-config\"\n").unwrap();

    let output = vl53l0_test(&["-o", "--config", path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();

    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("Error open stmvl53l0_ranging device"));
}

#[test]
fn missing_config_file_is_reported() {
    let output = vl53l0_test(&["--config", "/nonexistent/vl53l0.toml"]);
    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("cannot read /nonexistent/vl53l0.toml"));
}

#[test]
fn driver_rejecting_commands_exits_with_failure() {
    let output = vl53l0_test(&["--device", "/dev/null"]);
    assert_eq!(output.status.code(), Some(255));
    assert!(stderr(&output).contains("Error: Could not perform VL53L0_IOCTL_STOP"));
}
