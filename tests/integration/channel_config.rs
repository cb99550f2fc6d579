// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use indoc::indoc;
use tempfile::TempDir;

use crate::{epdag, get_cmd_output};

const CHANNEL_LIST: &str = indoc! {"
    # Generated from H-H1_R-1000000000-64.gwf
    H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ 256
    H1:PEM-ODC_CHANNEL_OUT_DQ 16
    H1:ASC-X_TR_A_NSUM_OUT_DQ 2048
"};

#[test]
fn test_channel_config_to_dir() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let list = tmp_dir.path().join("channels.txt");
    fs::write(&list, CHANNEL_LIST).unwrap();
    let out_dir = tmp_dir.path().join("configs");

    #[rustfmt::skip]
    let cmd = epdag()
        .args([
            "channel-config",
            &list.display().to_string(),
            "--ini-dir", "/home/detchar/ini",
            "--output-dir", &out_dir.display().to_string(),
        ])
        .ok();
    assert!(cmd.is_ok(), "channel-config failed: {}", cmd.err().unwrap());

    let pem = fs::read_to_string(out_dir.join("H1").join("pem_channels.ini")).unwrap();
    assert!(pem.contains("[H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ]"));
    assert!(pem.contains("dq_channel=PEM-ODC_CHANNEL_OUT_DQ"));
    assert!(
        pem.contains("/home/detchar/ini/H1/channel_ini/gstlal_excesspower_h1_pem_256.ini")
    );
    // ODC channels aren't analysed.
    assert!(!pem.contains("[H1:PEM-ODC_CHANNEL_OUT_DQ]"));

    let asc = fs::read_to_string(out_dir.join("H1").join("asc_channels.ini")).unwrap();
    assert!(asc.contains("[H1:ASC-X_TR_A_NSUM_OUT_DQ]"));
    assert!(asc.contains("sample_rate=2048"));
}

#[test]
fn test_channel_config_bad_line() {
    let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
    let list = tmp_dir.path().join("channels.txt");
    fs::write(&list, "H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ\n").unwrap();

    let cmd = epdag()
        .args(["channel-config", &list.display().to_string()])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Line 1 of the channel list"), "{stderr}");
}
