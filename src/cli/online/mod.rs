// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Setting up and removing never-ending jobs which analyse data as it arrives.


use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{
    display_warnings, InfoPrinter, SubmitArgs, SubmitArgsError, ARG_FILE_HELP,
};
use crate::{
    channel::{ChannelName, ChannelNameError},
    condor::Condor,
    config::{ChannelConfig, ChannelSection, ConfigError},
    params::{OnlineKillParams, OnlineSetupParams},
    EpDagError,
};

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct OnlineSetupArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// The channel configuration file, with one section per channel.
    #[clap(short, long, help_heading = "INPUT")]
    pub(super) channel_config: Option<PathBuf>,

    /// Only set up these channels of the channel configuration. By default,
    /// all of them are set up.
    #[clap(long, multiple_values(true), help_heading = "INPUT")]
    pub(super) channels: Option<Vec<String>>,

    /// The shared-memory partition to read data from, e.g. LHO_Data. Check
    /// with smlist.
    #[clap(long, help_heading = "INPUT")]
    pub(super) shm_partition: Option<String>,

    /// The directory under which job directories are made. Default: the
    /// current directory
    #[clap(short, long, help_heading = "OUTPUT")]
    pub(super) root_dir: Option<PathBuf>,

    /// Submit each job once it's set up.
    #[clap(long, help_heading = "OUTPUT")]
    #[serde(default)]
    pub(super) submit: bool,

    #[clap(flatten)]
    #[serde(rename = "htcondor")]
    #[serde(default)]
    pub(super) submit_args: SubmitArgs,
}

impl OnlineSetupArgs {
    /// Consolidate the CLI arguments with those in the argument file, if one
    /// was given. CLI arguments take precedence.
    pub(super) fn merge(self) -> Result<OnlineSetupArgs, EpDagError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let OnlineSetupArgs {
                args_file: _,
                channel_config,
                channels,
                shm_partition,
                root_dir,
                submit,
                submit_args,
            } = unpack_arg_file!(arg_file);

            Ok(OnlineSetupArgs {
                args_file: None,
                channel_config: cli_args.channel_config.or(channel_config),
                channels: cli_args.channels.or(channels),
                shm_partition: cli_args.shm_partition.or(shm_partition),
                root_dir: cli_args.root_dir.or(root_dir),
                submit: cli_args.submit || submit,
                submit_args: cli_args.submit_args.merge(submit_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<OnlineSetupParams, OnlineArgsError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            channel_config,
            channels,
            shm_partition,
            root_dir,
            submit,
            submit_args,
        } = self;

        let channel_config = channel_config.ok_or(OnlineArgsError::NoChannelConfig)?;
        let config = ChannelConfig::read(&channel_config)?;
        let sections = select_sections(&config, channels.as_deref())?;
        let (submit_config, condor) = submit_args.parse()?;
        let root_dir = root_dir.unwrap_or_else(|| PathBuf::from("."));

        let mut printer = InfoPrinter::new("Online jobs".into());
        printer.push_line(format!("Channel configuration: {}", channel_config.display()).into());
        printer.push_block(
            sections
                .iter()
                .map(|s| format!("{} ({} Hz)", s.name, s.sample_rate).into())
                .collect(),
        );
        if let Some(partition) = shm_partition.as_deref() {
            printer.push_line(format!("Shared-memory partition: {partition}").into());
        }
        printer.push_line(format!("Root directory: {}", root_dir.display()).into());
        printer.display();

        display_warnings();

        Ok(OnlineSetupParams {
            sections,
            root_dir,
            shm_partition,
            submit: submit_config,
            submit_with: if submit { Some(condor) } else { None },
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), EpDagError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        display_warnings();
        Ok(())
    }
}

/// The sections for the requested channels, in the order requested, or all
/// sections in file order.
fn select_sections(
    config: &ChannelConfig,
    channels: Option<&[String]>,
) -> Result<Vec<ChannelSection>, OnlineArgsError> {
    match channels {
        None => Ok(config.channels().collect::<Result<Vec<_>, ConfigError>>()?),
        Some(names) => names
            .iter()
            .map(|name| -> Result<ChannelSection, OnlineArgsError> {
                ChannelName::new(name)?;
                config.channel(name).map_err(|e| match e {
                    ConfigError::MissingSection(s) => OnlineArgsError::UnknownChannel(s),
                    e => OnlineArgsError::Config(e),
                })
            })
            .collect(),
    }
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct OnlineKillArgs {
    /// The channel configuration used to set up the jobs. All of its channels
    /// have their jobs removed, unless --channels is given.
    #[clap(short, long, help_heading = "INPUT")]
    pub(super) channel_config: Option<PathBuf>,

    /// The channels whose jobs are removed.
    #[clap(long, multiple_values(true), help_heading = "INPUT")]
    pub(super) channels: Option<Vec<String>>,

    /// The directory the jobs were set up under. Default: the current
    /// directory
    #[clap(short, long, help_heading = "INPUT")]
    pub(super) root_dir: Option<PathBuf>,

    /// The directory containing the HTCondor command-line tools.
    #[clap(long, help_heading = "HTCONDOR")]
    pub(super) condor_bin_dir: Option<PathBuf>,
}

impl OnlineKillArgs {
    fn parse(self) -> Result<OnlineKillParams, OnlineArgsError> {
        let Self {
            channel_config,
            channels,
            root_dir,
            condor_bin_dir,
        } = self;

        let channels = match (channels, channel_config) {
            (Some(names), _) => names
                .iter()
                .map(|n| ChannelName::new(n))
                .collect::<Result<Vec<_>, _>>()?,
            (None, Some(channel_config)) => channels_in_config(&channel_config)?,
            (None, None) => return Err(OnlineArgsError::NoChannelConfig),
        };

        Ok(OnlineKillParams {
            root_dir: root_dir.unwrap_or_else(|| PathBuf::from(".")),
            channels,
            condor: condor_bin_dir.map(Condor::new).unwrap_or_default(),
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), EpDagError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!(
                "Dry run -- would remove the online jobs of {} channels.",
                params.channels.len()
            );
            return Ok(());
        }

        let num_removed = params.run()?;
        info!(
            "Removed {num_removed} of {} online jobs",
            params.channels.len()
        );
        display_warnings();
        Ok(())
    }
}

fn channels_in_config(path: &Path) -> Result<Vec<ChannelName>, OnlineArgsError> {
    let config = ChannelConfig::read(path)?;
    let names = config
        .section_names()
        .into_iter()
        .map(ChannelName::new)
        .collect::<Result<Vec<_>, ChannelNameError>>()?;
    Ok(names)
}

#[derive(thiserror::Error, Debug)]
pub(super) enum OnlineArgsError {
    #[error("No channel configuration was specified")]
    NoChannelConfig,

    #[error("Channel '{0}' isn't in the channel configuration")]
    UnknownChannel(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ChannelName(#[from] ChannelNameError),

    #[error(transparent)]
    Submit(#[from] SubmitArgsError),
}
