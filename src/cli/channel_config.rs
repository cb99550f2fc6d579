// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Generate channel configurations from a list of channels and their sample
//! rates.

use std::{fs, path::PathBuf};

use clap::Parser;
use log::{debug, info, log, Level};

use crate::{
    config::{
        make_channel_sections, parse_channel_list, sections_to_string, write_subsystem_configs,
    },
    EpDagError,
};

#[derive(Parser, Debug, Clone, Default)]
pub(super) struct ChannelConfigArgs {
    /// A file with a channel and its sample rate on each line, e.g.
    /// "H1:PEM-EY_MAG_EBAY_SEIRACK_X_DQ 256".
    #[clap(name = "CHANNEL_LIST", parse(from_os_str))]
    channel_list: PathBuf,

    /// The directory containing the gstlal_excesspower configuration of each
    /// channel, as <INI_DIR>/<IFO>/channel_ini/gstlal_excesspower_<ifo>_<subsys>_<rate>.ini
    #[clap(short, long, default_value = ".")]
    ini_dir: PathBuf,

    /// Write a configuration file per instrument and subsystem in this
    /// directory, as <OUTPUT_DIR>/<IFO>/<subsys>_channels.ini. If not given,
    /// a single configuration is printed to stdout.
    #[clap(short, long)]
    output_dir: Option<PathBuf>,

    /// Add to existing configuration files rather than replacing them.
    #[clap(short, long, requires = "output-dir")]
    append: bool,
}

impl ChannelConfigArgs {
    /// Is the generated configuration printed rather than written to files?
    pub(super) fn prints_config(&self) -> bool {
        self.output_dir.is_none()
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), EpDagError> {
        debug!("Reading channel list {}", self.channel_list.display());
        let text = fs::read_to_string(&self.channel_list)?;
        let entries = parse_channel_list(&text)?;
        let sections = make_channel_sections(&entries, &self.ini_dir);
        // Configurations printed to stdout shouldn't be mixed with logs.
        let level = if self.output_dir.is_some() {
            Level::Info
        } else {
            Level::Debug
        };
        log!(
            level,
            "{} channels listed, {} to be analysed",
            entries.len(),
            sections.len()
        );

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        match self.output_dir {
            Some(dir) => {
                let written = write_subsystem_configs(&sections, &dir, self.append)?;
                info!("Wrote {} channel configurations", written.len());
            }
            None => print!("{}", sections_to_string(&sections)?),
        }
        Ok(())
    }
}
