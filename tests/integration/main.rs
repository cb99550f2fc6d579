// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod channel_config;
mod offline_dag;
mod subdivide;

use std::{fs, path::Path, process::Output, str::from_utf8};

use assert_cmd::{output::OutputError, Command};
use indoc::{formatdoc, indoc};

fn epdag() -> Command {
    Command::cargo_bin("epdag").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

struct Inputs {
    channel_config: String,
    cache: String,
}

/// Write a channel configuration for two channels (and their
/// `gstlal_excesspower` configuration) and an empty frame cache into `dir`.
fn write_inputs(dir: &Path) -> Inputs {
    let program_config = dir.join("gstlal_excesspower_h1_pem_256.ini");
    fs::write(
        &program_config,
        indoc! {"
            [tf_parameters]
            min-frequency = 8
            max-frequency = 128

            [triggering]
            output-directory = /home/detchar/triggers
        "},
    )
    .unwrap();

    let channel_config = dir.join("channels.ini");
    fs::write(
        &channel_config,
        formatdoc! {"
            [H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ]
            configuration_file = {0}
            sample_rate = 256

            [H1:PEM-EX_MAG_EBAY_SEIRACK_Y_DQ]
            configuration_file = {0}
            sample_rate = 4096
            dq_channel = PEM-ODC_CHANNEL_OUT_DQ
            on_bits = 0x3
        ", program_config.display()},
    )
    .unwrap();

    let cache = dir.join("frames.cache");
    fs::write(
        &cache,
        "H H1_R 1000000000 64 file://localhost/frames/H-H1_R-1000000000-64.gwf\n",
    )
    .unwrap();

    Inputs {
        channel_config: channel_config.display().to_string(),
        cache: cache.display().to_string(),
    }
}
