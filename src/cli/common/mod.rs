// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Things shared between `epdag` subcommands, e.g. the `offline-dag` and
//! `online-setup` subcommands both create HTCondor jobs, so they take the same
//! HTCondor arguments.

mod printers;

pub(crate) use printers::{display_warnings, InfoPrinter, Warn};

use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{condor::Condor, constants::DEFAULT_CONDOR_BIN_DIR, job::SubmitConfig};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref CONDOR_BIN_DIR_HELP: String =
        format!("The directory containing the HTCondor command-line tools. Default: {DEFAULT_CONDOR_BIN_DIR}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        log::debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                log::debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(EpDagError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                log::debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(EpDagError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(EpDagError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Arguments controlling how jobs are submitted to HTCondor.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(super) struct SubmitArgs {
    /// The HTCondor universe to run jobs in. Default: vanilla
    #[clap(long, help_heading = "HTCONDOR")]
    pub(super) universe: Option<String>,

    /// The accounting group to charge jobs to, e.g.
    /// ligo.prod.o4.detchar.transient.excesspower
    #[clap(long, help_heading = "HTCONDOR")]
    pub(super) accounting_group: Option<String>,

    /// The user charged for jobs, if not the submitter.
    #[clap(long, help_heading = "HTCONDOR")]
    pub(super) accounting_group_user: Option<String>,

    /// Don't give jobs the submitter's environment.
    #[clap(long, help_heading = "HTCONDOR")]
    #[serde(default)]
    pub(super) no_getenv: bool,

    /// Extra submit-file commands, given as key=value. May be given multiple
    /// times, e.g. --submit-command request_disk=1GB --submit-command
    /// +MaxHours=24
    #[clap(
        long = "submit-command",
        multiple_occurrences(true),
        help_heading = "HTCONDOR"
    )]
    pub(super) submit_commands: Option<Vec<String>>,

    /// The directory containing gstlal_excesspower and ligolw_bucluster. If
    /// not given, they're searched for in PATH.
    #[clap(long, help_heading = "HTCONDOR")]
    pub(super) exe_dir: Option<PathBuf>,

    #[clap(long, help = CONDOR_BIN_DIR_HELP.as_str(), help_heading = "HTCONDOR")]
    pub(super) condor_bin_dir: Option<PathBuf>,
}

impl SubmitArgs {
    /// Prefer `self`'s values over `other`'s.
    pub(super) fn merge(self, other: Self) -> Self {
        SubmitArgs {
            universe: self.universe.or(other.universe),
            accounting_group: self.accounting_group.or(other.accounting_group),
            accounting_group_user: self.accounting_group_user.or(other.accounting_group_user),
            no_getenv: self.no_getenv || other.no_getenv,
            submit_commands: self.submit_commands.or(other.submit_commands),
            exe_dir: self.exe_dir.or(other.exe_dir),
            condor_bin_dir: self.condor_bin_dir.or(other.condor_bin_dir),
        }
    }

    pub(super) fn parse(self) -> Result<(SubmitConfig, Condor), SubmitArgsError> {
        let SubmitArgs {
            universe,
            accounting_group,
            accounting_group_user,
            no_getenv,
            submit_commands,
            exe_dir,
            condor_bin_dir,
        } = self;

        let mut builder = SubmitConfig::builder()
            .getenv(!no_getenv)
            .accounting_group(accounting_group)
            .accounting_group_user(accounting_group_user)
            .bin_dir(exe_dir);
        if let Some(universe) = universe {
            builder = builder.universe(universe);
        }
        for command in submit_commands.unwrap_or_default() {
            let (key, value) = command
                .split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| SubmitArgsError::BadSubmitCommand(command.clone()))?;
            builder = builder.extra_command(key, value);
        }

        let condor = match condor_bin_dir {
            Some(dir) => Condor::new(dir),
            None => Condor::default(),
        };
        Ok((builder.build(), condor))
    }
}

#[derive(Error, Debug)]
pub(super) enum SubmitArgsError {
    #[error("Submit command '{0}' isn't of the form key=value")]
    BadSubmitCommand(String),
}
