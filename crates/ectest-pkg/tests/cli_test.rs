// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! System level tests for the ectest-pkg subcommands

use std::path::PathBuf;

use assert_cmd::Command;
use assert_fs::{TempDir, prelude::*};
use predicates::prelude::*;

const UNFORMATTED_INF: &str = "[Version]\nSignature  =  \"$WINDOWS NT$\"\n\n[Strings]\nName=\"x\"\n";

fn ectest_inx() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../drivers/ectest/ectest.inx")
}

fn ectest_pkg() -> Command {
    Command::cargo_bin("ectest-pkg").expect("unable to find ectest-pkg binary")
}

#[test]
fn given_the_ectest_template_when_checked_then_it_is_valid() {
    ectest_pkg()
        .arg("check")
        .arg(ectest_inx())
        .args(["--hardware-id", "ACPI\\ETST0001", "--package-name", "ectest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 INF file(s) valid"));
}

#[test]
fn given_an_inf_without_version_section_when_checked_then_it_fails() {
    let tmp_dir = TempDir::new().expect("Unable to create new temp dir for test");
    let inf = tmp_dir.child("broken.inf");
    inf.write_str("[Strings]\nName = \"x\"\n").unwrap();

    ectest_pkg()
        .arg("check")
        .arg(inf.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("[Version]"));
}

#[test]
fn given_a_wrong_hardware_id_when_checked_then_it_fails() {
    ectest_pkg()
        .arg("check")
        .arg(ectest_inx())
        .args(["--hardware-id", "ACPI\\ETST0002"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ACPI\\ETST0002"));
}

#[test]
fn given_a_service_registered_as_a_demand_start_process_when_checked_then_it_fails() {
    let tmp_dir = TempDir::new().expect("Unable to create new temp dir for test");
    let inx = tmp_dir.child("ectest.inx");
    let text = std::fs::read_to_string(ectest_inx()).unwrap();
    let mutated = text
        .replace("ServiceType    = 1", "ServiceType    = 16")
        .replace("StartType      = 1", "StartType      = 3")
        .replace("ErrorControl   = 1", "ErrorControl   = 3");
    assert_ne!(text, mutated);
    inx.write_str(&mutated).unwrap();

    ectest_pkg()
        .arg("check")
        .arg(inx.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "ServiceType=16 StartType=3 ErrorControl=3, expected ServiceType=1 StartType=1 \
             ErrorControl=1",
        ));

    ectest_pkg()
        .arg("check")
        .arg(inx.path())
        .args(["--service-policy", "16/3/3"])
        .assert()
        .success();

    ectest_pkg()
        .arg("check")
        .arg(inx.path())
        .arg("--any-service-policy")
        .assert()
        .success();
}

#[test]
fn given_all_stamp_options_when_stamped_then_inf_is_written_without_cargo_metadata() {
    let tmp_dir = TempDir::new().expect("Unable to create new temp dir for test");
    let inx = tmp_dir.child("ectest.inx");
    inx.write_file(&ectest_inx()).unwrap();
    let output = tmp_dir.child("ectest_arm64.inf");

    ectest_pkg()
        .arg("stamp")
        .arg(inx.path())
        .arg("-o")
        .arg(output.path())
        .args([
            "--arch",
            "arm64",
            "--kmdf-version",
            "1.33",
            "--driver-version",
            "1.2.3.4",
            "--date",
            "2026-10-19",
        ])
        .assert()
        .success();

    output.assert(predicate::str::contains("NTarm64.10.0...16299"));
    output.assert(predicate::str::contains("10/19/2026,1.2.3.4"));
    output.assert(predicate::str::contains("KmdfLibraryVersion = 1.33"));
    output.assert(predicate::str::contains("$ARCH$").not());

    ectest_pkg()
        .arg("check")
        .arg(output.path())
        .args(["--hardware-id", "ACPI\\ETST0001"])
        .assert()
        .success();
}

#[test]
fn given_a_driver_crate_when_stamped_without_versions_then_they_come_from_cargo_toml() {
    let tmp_dir = TempDir::new().expect("Unable to create new temp dir for test");
    tmp_dir
        .child("Cargo.toml")
        .write_str(
            r#"[package]
name = "ectest"
version = "0.2.1"
edition = "2021"

[package.metadata.wdk.driver-model]
driver-type = "KMDF"
kmdf-version-major = 1
target-kmdf-version-minor = 31
"#,
        )
        .unwrap();
    tmp_dir.child("src/lib.rs").write_str("").unwrap();
    let inx = tmp_dir.child("ectest.inx");
    inx.write_file(&ectest_inx()).unwrap();

    ectest_pkg()
        .arg("stamp")
        .arg(inx.path())
        .args(["--date", "2026-10-19"])
        .assert()
        .success();

    let output = tmp_dir.child("ectest.inf");
    output.assert(predicate::str::contains("NTamd64.10.0...16299"));
    output.assert(predicate::str::contains("10/19/2026,0.2.1.0"));
    output.assert(predicate::str::contains("KmdfLibraryVersion = 1.31"));
}

#[test]
fn given_a_template_outside_a_driver_crate_when_stamped_without_versions_then_it_fails() {
    let tmp_dir = TempDir::new().expect("Unable to create new temp dir for test");
    let inx = tmp_dir.child("ectest.inx");
    inx.write_file(&ectest_inx()).unwrap();

    ectest_pkg().arg("stamp").arg(inx.path()).assert().failure();

    tmp_dir.child("ectest.inf").assert(predicate::path::missing());
}

#[test]
fn given_kmdf_version_outside_a_driver_crate_when_stamped_then_driver_version_defaults() {
    let tmp_dir = TempDir::new().expect("Unable to create new temp dir for test");
    let inx = tmp_dir.child("ectest.inx");
    inx.write_file(&ectest_inx()).unwrap();

    ectest_pkg()
        .arg("stamp")
        .arg(inx.path())
        .args(["--kmdf-version", "1.33", "--date", "2026-10-19"])
        .assert()
        .success();

    let output = tmp_dir.child("ectest.inf");
    output.assert(predicate::str::contains("10/19/2026,0.0.0.0"));
    output.assert(predicate::str::contains("KmdfLibraryVersion = 1.33"));
}

#[test]
fn given_an_unformatted_inf_when_formatted_then_check_passes_afterwards() {
    let tmp_dir = TempDir::new().expect("Unable to create new temp dir for test");
    let inf = tmp_dir.child("ectest.inf");
    inf.write_str(UNFORMATTED_INF).unwrap();

    ectest_pkg()
        .args(["fmt", "--check"])
        .arg(inf.path())
        .assert()
        .failure();
    inf.assert(UNFORMATTED_INF);

    ectest_pkg().arg("fmt").arg(inf.path()).assert().success();
    inf.assert(predicate::str::contains("Signature = \"$WINDOWS NT$\""));

    ectest_pkg()
        .args(["fmt", "--check"])
        .arg(inf.path())
        .assert()
        .success();
}

#[test]
fn given_the_ectest_template_when_shown_then_device_service_and_kmdf_binding_are_printed() {
    ectest_pkg()
        .arg("show")
        .arg(ectest_inx())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Class:       Sample {78A1C341-4539-11D3-B88D-00C04FAD5171}")
                .and(predicate::str::contains(
                    "Device:      ectest Device [ectest_Device.NT] ACPI\\ETST0001",
                ))
                .and(predicate::str::contains(
                    "Service:     ectest (ectest Service) type=1 start=1 error=1",
                ))
                .and(predicate::str::contains(
                    "KMDF:        ectest -> [ectest_wdfsect] KmdfLibraryVersion = $KMDFVERSION$",
                )),
        );
}

#[test]
fn given_no_subcommand_then_usage_is_printed() {
    ectest_pkg()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
