// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `epdag`
//! subcommands are contained in modules.
//!
//! For subcommands taking argument files, all booleans must have
//! `#[serde(default)]` annotated, and anything that isn't a boolean must be
//! optional. This allows all arguments to be optional *and* usable in an
//! arguments file.
//!
//! Only 3 things should be public in this module: `EpDag`, `EpDag::run`, and
//! `EpDagError`.

#[macro_use]
mod common;
mod channel_config;
mod error;
mod offline_dag;
mod online;
mod status;
mod subdivide;

pub(crate) use common::{InfoPrinter, Warn};
pub use error::EpDagError;

use std::path::PathBuf;

use clap::{AppSettings, Args, Parser, Subcommand};
use log::info;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = r#"Build and manage HTCondor DAGs for gstlal_excesspower burst searches.

Long stretches of data are split into overlapping chunks, each analysed by its
own job, and the resulting triggers are clustered per GPS directory."#
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct EpDag {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run.
    #[clap(long)]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(alias = "dag")]
    #[clap(
        about = "Write the DAGs analysing a stretch of archived data for every channel of a channel configuration."
    )]
    OfflineDag(offline_dag::OfflineDagArgs),

    #[clap(about = "Set up (and optionally submit) jobs analysing data as it arrives.")]
    OnlineSetup(online::OnlineSetupArgs),

    #[clap(about = "Remove the online jobs set up by online-setup.")]
    OnlineKill(online::OnlineKillArgs),

    #[clap(about = "Print the excess-power jobs in the HTCondor queue.")]
    Status(status::StatusArgs),

    #[clap(about = "Print how a segment is split into analysis chunks.")]
    Subdivide(subdivide::SubdivideArgs),

    #[clap(
        about = "Generate channel configurations from a list of channels and their sample rates."
    )]
    ChannelConfig(channel_config::ChannelConfigArgs),
}

impl EpDag {
    pub fn run(self) -> Result<(), EpDagError> {
        // Set up logging.
        let GlobalArgs {
            verbosity,
            dry_run,
            save_toml,
        } = self.global_opts;
        setup_logging(verbosity)
            .map_err(|e| EpDagError::Generic(format!("Failed to initialise logging: {e}")))?;

        let sub_command = match &self.command {
            Command::OfflineDag(_) => "offline-dag",
            Command::OnlineSetup(_) => "online-setup",
            Command::OnlineKill(_) => "online-kill",
            Command::Status(_) => "status",
            Command::Subdivide(_) => "subdivide",
            Command::ChannelConfig(_) => "channel-config",
        };
        // Keep stdout clean for subcommands whose results are printed there.
        let quiet = match &self.command {
            Command::Subdivide(_) => true,
            Command::ChannelConfig(args) => args.prints_config(),
            _ => false,
        };
        if !quiet {
            info!("epdag {} {}", sub_command, env!("CARGO_PKG_VERSION"));
            display_build_info();
        }

        macro_rules! merge_save_run {
            ($args:expr) => {{
                let args = $args.merge()?;
                if let Some(toml) = save_toml {
                    use std::{
                        fs::File,
                        io::{BufWriter, Write},
                    };

                    let mut f = BufWriter::new(File::create(toml)?);
                    let toml_str = toml::to_string(&args)?;
                    f.write_all(toml_str.as_bytes())?;
                }
                args.run(dry_run)?;
            }};
        }

        match self.command {
            Command::OfflineDag(args) => {
                merge_save_run!(args)
            }

            Command::OnlineSetup(args) => {
                merge_save_run!(args)
            }

            Command::OnlineKill(args) => args.run(dry_run)?,
            Command::Status(args) => args.run(dry_run)?,
            Command::Subdivide(args) => args.run(dry_run)?,
            Command::ChannelConfig(args) => args.run(dry_run)?,
        }

        if !quiet {
            info!("epdag {} complete.", sub_command);
        }
        Ok(())
    }
}

/// Activate a logger. All log messages are put onto `stdout`. `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}

/// Write info-level log lines of how this executable was compiled.
fn display_build_info() {
    let dirty = match GIT_DIRTY {
        Some(true) => " (dirty)",
        _ => "",
    };
    match GIT_COMMIT_HASH_SHORT {
        Some(hash) => info!("Compiled on git commit hash: {hash}{dirty}"),
        None => info!("Compiled on git commit hash: <no git info>"),
    }
    if let Some(hr) = GIT_HEAD_REF {
        info!("            git head ref: {hr}");
    }
    info!("            {}", BUILT_TIME_UTC);
    info!("         with compiler {}", RUSTC_VERSION);
    info!("");
}
