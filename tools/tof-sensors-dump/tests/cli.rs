// SPDX-License-Identifier: MPL-2.0

use assert_cmd::Command;

#[test]
fn missing_library_is_not_an_error() {
    let output = Command::cargo_bin("tof_sensors_dump")
        .unwrap()
        .args(["--library", "/nonexistent/sensors.hal.tof.so"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Failing to open sensor library! Error: "));
}

#[test]
fn flush_mode_is_announced() {
    let output = Command::cargo_bin("tof_sensors_dump")
        .unwrap()
        .args(["-f", "--library", "/nonexistent/sensors.hal.tof.so"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Test Flush functionality\n"));
}

#[test]
fn bad_delay_is_rejected() {
    let output = Command::cargo_bin("tof_sensors_dump")
        .unwrap()
        .args(["--delay-ms", "soon"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}
