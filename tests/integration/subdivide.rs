// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{epdag, get_cmd_output};

#[test]
fn test_subdivide_defaults() {
    let cmd = epdag()
        .args(["subdivide", "1000000000", "1000030000"])
        .ok();
    assert!(cmd.is_ok(), "subdivide failed: {}", cmd.err().unwrap());
    let (stdout, stderr) = get_cmd_output(cmd);
    assert_eq!(
        stdout,
        "1000000000 1000014400\n1000014280 1000028800\n1000028680 1000030000\n"
    );
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
}

#[test]
fn test_subdivide_json() {
    #[rustfmt::skip]
    let cmd = epdag()
        .args([
            "subdivide", "0", "10",
            "--interval", "3",
            "--min-length", "2",
            "--overlap", "1",
            "--json",
        ])
        .ok();
    assert!(cmd.is_ok(), "subdivide failed: {}", cmd.err().unwrap());
    let (stdout, _) = get_cmd_output(cmd);
    let chunks: Vec<serde_json::Value> = serde_json::from_str(stdout.trim()).unwrap();
    let bounds = chunks
        .iter()
        .map(|c| (c["start"].as_f64().unwrap(), c["end"].as_f64().unwrap()))
        .collect::<Vec<_>>();
    assert_eq!(
        bounds,
        vec![(0.0, 3.0), (2.0, 6.0), (5.0, 8.0), (7.0, 10.0)]
    );
}

#[test]
fn test_subdivide_too_short() {
    let cmd = epdag()
        .args(["subdivide", "1000000000", "1000000100"])
        .ok();
    assert!(cmd.is_ok());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.is_empty());
}

#[test]
fn test_subdivide_backwards_segment() {
    let cmd = epdag().args(["subdivide", "10", "0"]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: Segment start"), "{stderr}");
}
