// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use tempfile::TempDir;

use crate::{epdag, get_cmd_output, write_inputs, Inputs};

#[test]
fn test_offline_dag() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let Inputs {
        channel_config,
        cache,
    } = write_inputs(tmp_dir.path());
    let root_dir = tmp_dir.path().join("dags");

    #[rustfmt::skip]
    let cmd = epdag()
        .args([
            "offline-dag",
            "--channel-config", &channel_config,
            "--cache", &cache,
            "--gps-start", "1000000000",
            "--gps-end", "1000030000",
            "--root-dir", &root_dir.display().to_string(),
            "--exe-dir", "/usr/bin",
            "--write-scripts",
        ])
        .ok();
    assert!(cmd.is_ok(), "offline-dag failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("epdag offline-dag complete."));

    let uberdag = fs::read_to_string(root_dir.join("excesspower_1000000000_1000030000.dag")).unwrap();
    // 2 channels, each with 3 processing nodes and 1 clustering node.
    assert_eq!(uberdag.lines().filter(|l| l.starts_with("JOB ")).count(), 8);
    assert!(uberdag.contains("JOB excesspower_H1_PEM_EY_MAG_EBAY_SEIRACK_X_DQ_0000 "));
    assert!(uberdag.contains("SCRIPT PRE bucluster_H1_PEM_EX_MAG_EBAY_SEIRACK_Y_DQ_10000 "));

    let subdag = root_dir.join("excesspower_H1_PEM_EY_MAG_EBAY_SEIRACK_X_DQ_1000000000_1000030000.dag");
    assert!(subdag.exists());
    let script = fs::read_to_string(subdag.with_extension("sh")).unwrap();
    assert!(script.starts_with("#!/bin/sh\n"));
    assert!(script.contains("--gps-start-time 1000014280 --gps-end-time 1000028800"));

    let sub = fs::read_to_string(
        root_dir
            .join("H1/PEM/PEM-EX_MAG_EBAY_SEIRACK_Y_DQ")
            .join("H1_PEM-EX_MAG_EBAY_SEIRACK_Y_DQ_submit.sub"),
    )
    .unwrap();
    assert!(sub.contains("--dq-channel H1=PEM-ODC_CHANNEL_OUT_DQ"));
    assert!(sub.contains("--state-vector-on-bits 0x3"));
    assert!(sub.contains("request_cpus = 2"));
    assert!(root_dir.join("caches").is_dir());
}

#[test]
fn test_offline_dag_dry_run() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let Inputs {
        channel_config,
        cache,
    } = write_inputs(tmp_dir.path());
    let root_dir = tmp_dir.path().join("dags");

    #[rustfmt::skip]
    let cmd = epdag()
        .args([
            "offline-dag",
            "--channel-config", &channel_config,
            "--cache", &cache,
            "--gps-start", "1000000000",
            "--gps-end", "1000030000",
            "--root-dir", &root_dir.display().to_string(),
            "--dry-run",
        ])
        .ok();
    assert!(cmd.is_ok(), "offline-dag failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("3 processing jobs per channel"), "{stdout}");
    assert!(!root_dir.exists());
}

#[test]
fn test_offline_dag_save_toml_roundtrip() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let Inputs {
        channel_config,
        cache,
    } = write_inputs(tmp_dir.path());
    let root_dir = tmp_dir.path().join("dags");
    let toml = tmp_dir.path().join("args.toml");

    #[rustfmt::skip]
    let cmd = epdag()
        .args([
            "offline-dag",
            "--channel-config", &channel_config,
            "--cache", &cache,
            "--gps-start", "1000000000",
            "--gps-end", "1000030000",
            "--root-dir", &root_dir.display().to_string(),
            "--accounting-group", "ligo.dev.o4.detchar.transient.excesspower",
            "--dry-run",
            "--save-toml", &toml.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "offline-dag failed: {}", cmd.err().unwrap());
    let contents = fs::read_to_string(&toml).unwrap();
    assert!(contents.contains("gps_start = 1000000000.0"), "{contents}");
    assert!(contents.contains("[htcondor]"), "{contents}");

    // Run from the file, overriding the end time.
    #[rustfmt::skip]
    let cmd = epdag()
        .args([
            "offline-dag",
            &toml.display().to_string(),
            "--gps-end", "1000020000",
            "--exe-dir", "/usr/bin",
        ])
        .ok();
    assert!(cmd.is_ok(), "offline-dag failed: {}", cmd.err().unwrap());
    assert!(root_dir
        .join("excesspower_1000000000_1000020000.dag")
        .exists());
    let sub = fs::read_to_string(
        root_dir
            .join("H1/PEM/PEM-EY_MAG_EBAY_SEIRACK_X_DQ")
            .join("H1_PEM-EY_MAG_EBAY_SEIRACK_X_DQ_submit.sub"),
    )
    .unwrap();
    assert!(sub.contains("accounting_group = ligo.dev.o4.detchar.transient.excesspower"));
}

#[test]
fn test_offline_dag_missing_channel_config() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    #[rustfmt::skip]
    let cmd = epdag()
        .args([
            "offline-dag",
            "--channel-config", &tmp_dir.path().join("nope.ini").display().to_string(),
            "--cache", "frames.cache",
            "--gps-start", "1000000000",
            "--gps-end", "1000030000",
            "--root-dir", &tmp_dir.path().display().to_string(),
        ])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: "), "{stderr}");
    assert!(stderr.contains("configuration_file"), "{stderr}");
}
