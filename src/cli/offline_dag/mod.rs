// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter, SubmitArgs, SubmitArgsError, ARG_FILE_HELP};
use crate::{
    constants::{DEFAULT_PRE_SCRIPT, DEFAULT_SUBDIVISION_INTERVAL, WHITEN_TIME},
    misc::gps_to_utc_string,
    offline::{analysis_chunks, OfflineDagOptions},
    params::OfflineDagParams,
    segments::{Segment, SegmentError},
    EpDagError,
};

lazy_static::lazy_static! {
    static ref SUBDIVISION_INTERVAL_HELP: String =
        format!("Segments longer than this are split into multiple processing jobs [seconds]. Default: {DEFAULT_SUBDIVISION_INTERVAL}");

    static ref PRE_SCRIPT_HELP: String =
        format!("The script run before each clustering job to find its trigger files. Default: {DEFAULT_PRE_SCRIPT} (in the current directory)");
}

#[derive(Parser, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(super) struct OfflineDagArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// The channel configuration file, with one section per channel.
    #[clap(short, long, help_heading = "INPUT")]
    pub(super) channel_config: Option<PathBuf>,

    /// A cache file listing the frame files to analyse.
    #[clap(long, help_heading = "INPUT")]
    pub(super) cache: Option<PathBuf>,

    /// Only analyse times inside the segments of this file.
    #[clap(long, help_heading = "INPUT")]
    pub(super) segments_file: Option<PathBuf>,

    /// The name of the segments to use from the segments file.
    #[clap(long, help_heading = "INPUT")]
    pub(super) segments_name: Option<String>,

    /// The GPS time to start analysing from [seconds].
    #[clap(short = 's', long, help_heading = "SEGMENT")]
    pub(super) gps_start: Option<f64>,

    /// The GPS time to stop analysing at [seconds].
    #[clap(short = 'e', long, help_heading = "SEGMENT")]
    pub(super) gps_end: Option<f64>,

    #[clap(long, help = SUBDIVISION_INTERVAL_HELP.as_str(), help_heading = "SEGMENT")]
    pub(super) subdivision_interval: Option<f64>,

    /// The directory under which jobs, caches and DAGs are written. Default:
    /// the current directory
    #[clap(short, long, help_heading = "OUTPUT")]
    pub(super) root_dir: Option<PathBuf>,

    /// Where to write the top-level DAG. Default:
    /// <ROOT_DIR>/excesspower_<GPS_START>_<GPS_END>.dag
    #[clap(long, help_heading = "OUTPUT")]
    pub(super) dag_file: Option<PathBuf>,

    #[clap(long, help = PRE_SCRIPT_HELP.as_str(), help_heading = "OUTPUT")]
    pub(super) pre_script: Option<PathBuf>,

    /// Don't write a DAG for each channel.
    #[clap(long, help_heading = "OUTPUT")]
    #[serde(default)]
    pub(super) no_subdags: bool,

    /// Also write a shell script for each channel, which runs its jobs without
    /// HTCondor.
    #[clap(long, help_heading = "OUTPUT")]
    #[serde(default)]
    pub(super) write_scripts: bool,

    /// Submit the top-level DAG once it's written.
    #[clap(long, help_heading = "OUTPUT")]
    #[serde(default)]
    pub(super) submit: bool,

    #[clap(flatten)]
    #[serde(rename = "htcondor")]
    #[serde(default)]
    pub(super) submit_args: SubmitArgs,
}

impl OfflineDagArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified
    /// into a single struct. Where applicable, it will prefer CLI parameters
    /// over those in the file.
    pub(super) fn merge(self) -> Result<OfflineDagArgs, EpDagError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let OfflineDagArgs {
                args_file: _,
                channel_config,
                cache,
                segments_file,
                segments_name,
                gps_start,
                gps_end,
                subdivision_interval,
                root_dir,
                dag_file,
                pre_script,
                no_subdags,
                write_scripts,
                submit,
                submit_args,
            } = unpack_arg_file!(arg_file);

            Ok(OfflineDagArgs {
                args_file: None,
                channel_config: cli_args.channel_config.or(channel_config),
                cache: cli_args.cache.or(cache),
                segments_file: cli_args.segments_file.or(segments_file),
                segments_name: cli_args.segments_name.or(segments_name),
                gps_start: cli_args.gps_start.or(gps_start),
                gps_end: cli_args.gps_end.or(gps_end),
                subdivision_interval: cli_args.subdivision_interval.or(subdivision_interval),
                root_dir: cli_args.root_dir.or(root_dir),
                dag_file: cli_args.dag_file.or(dag_file),
                pre_script: cli_args.pre_script.or(pre_script),
                no_subdags: cli_args.no_subdags || no_subdags,
                write_scripts: cli_args.write_scripts || write_scripts,
                submit: cli_args.submit || submit,
                submit_args: cli_args.submit_args.merge(submit_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<OfflineDagParams, OfflineDagArgsError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            channel_config,
            cache,
            segments_file,
            segments_name,
            gps_start,
            gps_end,
            subdivision_interval,
            root_dir,
            dag_file,
            pre_script,
            no_subdags,
            write_scripts,
            submit,
            submit_args,
        } = self;

        let channel_config = channel_config.ok_or(OfflineDagArgsError::NoChannelConfig)?;
        let cache = cache.ok_or(OfflineDagArgsError::NoCache)?;
        let gps_start = gps_start.ok_or(OfflineDagArgsError::NoGpsStart)?;
        let gps_end = gps_end.ok_or(OfflineDagArgsError::NoGpsEnd)?;
        let segment = Segment::new(gps_start, gps_end)?;
        let subdivision_interval = subdivision_interval.unwrap_or(DEFAULT_SUBDIVISION_INTERVAL);
        if !(subdivision_interval >= WHITEN_TIME) {
            return Err(OfflineDagArgsError::BadSubdivisionInterval(
                subdivision_interval,
            ));
        }
        let (submit_config, condor) = submit_args.parse()?;

        let mut options = OfflineDagOptions::new(channel_config, cache);
        options.subdivision_interval = subdivision_interval;
        if let Some(root_dir) = root_dir {
            options.root_dir = root_dir;
        }
        if let Some(pre_script) = pre_script {
            options.pre_script = pre_script;
        }
        options.segments_file = segments_file;
        options.segments_name = segments_name;
        options.submit = submit_config;
        options.write_subdags = !no_subdags;
        options.write_scripts = write_scripts;

        let mut printer = InfoPrinter::new("Offline DAG".into());
        printer.push_line(format!("Channel configuration: {}", options.channel_config.display()).into());
        printer.push_line(format!("Frame cache: {}", options.cache.display()).into());
        printer.push_block(vec![
            format!("GPS start: {} ({})", segment.start(), gps_to_utc_string(segment.start())).into(),
            format!("GPS end:   {} ({})", segment.end(), gps_to_utc_string(segment.end())).into(),
            format!("Subdivision interval: {subdivision_interval}s").into(),
        ]);
        if let Ok(chunks) = analysis_chunks(segment, subdivision_interval) {
            printer.push_line(format!("{} processing jobs per channel", chunks.len()).into());
        }
        printer.push_line(format!("Root directory: {}", options.root_dir.display()).into());
        printer.display();

        display_warnings();

        Ok(OfflineDagParams {
            segment,
            options,
            dag_file,
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

#[derive(thiserror::Error, Debug)]
pub(super) enum OfflineDagArgsError {
    #[error("No channel configuration was specified")]
    NoChannelConfig,

    #[error("No frame cache was specified")]
    NoCache,

    #[error("No GPS start time was specified")]
    NoGpsStart,

    #[error("No GPS end time was specified")]
    NoGpsEnd,

    #[error("The subdivision interval ({0}s) must be at least the whitening time ({WHITEN_TIME}s)")]
    BadSubdivisionInterval(f64),

    #[error(transparent)]
    Segment(#[from] SegmentError),

    #[error(transparent)]
    Submit(#[from] SubmitArgsError),
}
