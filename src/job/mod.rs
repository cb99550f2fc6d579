// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! HTCondor jobs.
//!
//! There are only a few kinds of job, so rather than having a type per kind,
//! every job is a [`Job`] tagged with a [`JobKind`]. All kinds share the same
//! life cycle: a job is constructed from immutable configuration, then
//! [finalized](Job::finalize) exactly once (which creates its working
//! directory and writes its submit file), and only then can it be used in a
//! DAG or submitted.

mod error;
mod submit;

pub use error::JobError;
pub use submit::{SubmitConfig, SubmitConfigBuilder};

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, trace};
use strum_macros::Display;

use crate::{
    channel::ChannelName,
    cli::Warn,
    config::{ChannelSection, DqChannel, ProgramConfig},
    constants::*,
    misc::{absolute, which},
};

/// The macro holding the start of a processing job's analysis chunk.
pub const GPS_START_MACRO: &str = "macrogpsstart";

/// The macro holding the end of a processing job's analysis chunk.
pub const GPS_END_MACRO: &str = "macrogpsend";

/// The macro holding a clustering job's input cache.
pub const INPUT_CACHE_MACRO: &str = "macroinpcache";

/// Online jobs must run on resources that won't evict them.
const ONLINE_INCANTATION: [(&str, &str); 2] = [
    ("+Online_Burst_ExcessPower", "True"),
    ("Requirements", "(Online_Burst_ExcessPower =?= True)"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum JobKind {
    /// `gstlal_excesspower` over a fixed stretch of frame data.
    #[strum(serialize = "processing")]
    Processing,

    /// `ligolw_bucluster` over the triggers of processing jobs.
    #[strum(serialize = "clustering")]
    Clustering,

    /// A never-ending `gstlal_excesspower` reading low-latency data.
    #[strum(serialize = "online")]
    Online,
}

/// Where a processing job gets its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSource {
    /// A cache file listing frame files.
    pub cache: PathBuf,

    /// Only analyse data inside the segments of this file ...
    pub segments_file: Option<PathBuf>,

    /// ... with this segment definer name.
    pub segments_name: Option<String>,
}

/// Paths that only exist once a job has been finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedPaths {
    pub wd: PathBuf,
    pub stdout: PathBuf,
    pub stderr: PathBuf,
    pub log: PathBuf,
    pub sub_file: PathBuf,

    /// The copy of the program configuration used by this job, if any.
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Job {
    kind: JobKind,
    channel: ChannelName,
    root_dir: PathBuf,
    executable: PathBuf,
    submit: SubmitConfig,

    /// Command-line options, in order. Empty values are flags.
    options: IndexMap<String, String>,

    /// Submit-file commands specific to this job.
    commands: IndexMap<String, String>,

    program_config: Option<ProgramConfig>,
    finalized: Option<FinalizedPaths>,
}

impl Job {
    /// A job analysing a stretch of frame data. The stretch is given to each
    /// DAG node by the [`GPS_START_MACRO`] and [`GPS_END_MACRO`] macros.
    pub fn processing(
        section: &ChannelSection,
        source: &FrameSource,
        submit: SubmitConfig,
        root_dir: &Path,
    ) -> Result<Job, JobError> {
        let mut job = Job::excesspower(JobKind::Processing, section, submit, root_dir)?;

        job.add_opt("data-source", "frames");
        job.add_opt("frame-cache", absolute(&source.cache)?.display().to_string());
        job.add_opt("gps-start-time", format!("$({GPS_START_MACRO})"));
        job.add_opt("gps-end-time", format!("$({GPS_END_MACRO})"));
        if let Some(segments_file) = &source.segments_file {
            job.add_opt(
                "frame-segments-file",
                absolute(segments_file)?.display().to_string(),
            );
        }
        if let Some(segments_name) = &source.segments_name {
            job.add_opt("frame-segments-name", segments_name.as_str());
        }
        job.set_dq_channel(section.dq.as_ref());

        Ok(job)
    }

    /// A never-ending job reading from a shared-memory partition (check with
    /// `smlist`; usually something like `LHO_Data`).
    pub fn online(
        section: &ChannelSection,
        shm_partition: Option<&str>,
        submit: SubmitConfig,
        root_dir: &Path,
    ) -> Result<Job, JobError> {
        let mut job = Job::excesspower(JobKind::Online, section, submit, root_dir)?;

        job.add_opt("data-source", "lvshm");
        if let Some(partition) = shm_partition {
            job.add_opt(
                "shared-memory-partition",
                format!("{}={partition}", job.channel.instrument),
            );
        }
        job.add_opt("enable-channel-monitoring", "");
        job.set_dq_channel(section.dq.as_ref());

        for (k, v) in ONLINE_INCANTATION {
            job.commands.insert(k.to_string(), v.to_string());
        }
        job.commands
            .insert("want_graceful_removal".to_string(), "True".to_string());
        job.commands.insert("kill_sig".to_string(), "15".to_string());

        Ok(job)
    }

    /// A job clustering the triggers listed in the cache given by the
    /// [`INPUT_CACHE_MACRO`] macro.
    pub fn clustering(
        channel: &ChannelName,
        submit: SubmitConfig,
        root_dir: &Path,
    ) -> Result<Job, JobError> {
        let executable = find_executable(BUCLUSTER_EXE, &submit);
        let mut job = Job {
            kind: JobKind::Clustering,
            channel: channel.clone(),
            root_dir: absolute(root_dir)?,
            executable,
            submit,
            options: IndexMap::new(),
            commands: IndexMap::new(),
            program_config: None,
            finalized: None,
        };

        job.commands
            .insert("request_memory".to_string(), HIGH_MEMORY_MB.to_string());
        job.add_opt("verbose", "");
        job.add_opt("cluster-algorithm", "excesspower");
        job.add_opt("program", EXCESSPOWER_EXE);
        job.add_opt("input-cache", format!("$({INPUT_CACHE_MACRO})"));

        Ok(job)
    }

    /// Everything common to `gstlal_excesspower` jobs.
    fn excesspower(
        kind: JobKind,
        section: &ChannelSection,
        submit: SubmitConfig,
        root_dir: &Path,
    ) -> Result<Job, JobError> {
        let program_config = ProgramConfig::read(&section.configuration_file)?;
        let executable = find_executable(EXCESSPOWER_EXE, &submit);
        let mut job = Job {
            kind,
            channel: section.name.clone(),
            root_dir: absolute(root_dir)?,
            executable,
            submit,
            options: IndexMap::new(),
            commands: IndexMap::new(),
            program_config: Some(program_config),
            finalized: None,
        };

        // gstreamer doesn't always say what's wrong; ask for basic error
        // reporting.
        job.commands
            .insert("environment".to_string(), "GST_DEBUG=2".to_string());
        let (cpus, memory) = resources_for_rate(section.sample_rate);
        job.commands
            .insert("request_cpus".to_string(), cpus.to_string());
        job.commands
            .insert("request_memory".to_string(), memory.to_string());

        job.add_opt("channel-name", job.channel.as_instrument_assignment());
        job.add_opt("verbose", "");
        job.add_opt(
            "initialization-file",
            section.configuration_file.display().to_string(),
        );
        job.add_opt(
            "sample-rate",
            section
                .downsample_rate
                .unwrap_or(section.sample_rate)
                .to_string(),
        );

        Ok(job)
    }

    fn add_opt<V: Into<String>>(&mut self, opt: &str, value: V) {
        self.options.insert(opt.to_string(), value.into());
    }

    fn set_dq_channel(&mut self, dq: Option<&DqChannel>) {
        let dq = match dq {
            Some(dq) => dq,
            None => return,
        };
        self.add_opt(
            "dq-channel",
            format!("{}={}", self.channel.instrument, dq.channel),
        );
        if let Some(on_bits) = dq.on_bits {
            self.add_opt("state-vector-on-bits", format!("0x{on_bits:x}"));
        }
        if let Some(off_bits) = dq.off_bits {
            self.add_opt("state-vector-off-bits", format!("0x{off_bits:x}"));
        }
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn channel(&self) -> &ChannelName {
        &self.channel
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn submit_config(&self) -> &SubmitConfig {
        &self.submit
    }

    pub fn options(&self) -> &IndexMap<String, String> {
        &self.options
    }

    pub fn commands(&self) -> &IndexMap<String, String> {
        &self.commands
    }

    pub fn program_config(&self) -> Option<&ProgramConfig> {
        self.program_config.as_ref()
    }

    pub fn finalized(&self) -> Option<&FinalizedPaths> {
        self.finalized.as_ref()
    }

    /// Look up an attribute of this job's program configuration, which must
    /// exist.
    pub fn require_config_attr(&self, attr: &str) -> Result<&str, JobError> {
        let config = self
            .program_config
            .as_ref()
            .ok_or_else(|| JobError::NoProgramConfig(self.name()))?;
        Ok(config.require_attr(attr)?)
    }

    /// A name for this job, unique per channel and kind.
    pub fn name(&self) -> String {
        match self.kind {
            JobKind::Processing => format!("excesspower_{}", self.channel.sanitized()),
            JobKind::Clustering => format!("bucluster_{}", self.channel.sanitized()),
            JobKind::Online => format!("excesspower_online_{}", self.channel.sanitized()),
        }
    }

    /// The base directory for this job:
    /// `<root>/<instrument>/<subsystem>/<channel>`.
    pub fn wd(&self) -> PathBuf {
        working_dir(&self.root_dir, &self.channel)
    }

    /// The prefix of every file this job writes.
    fn file_prefix(&self) -> String {
        let prefix = format!("{}_{}", self.channel.instrument, self.channel.channel);
        match self.kind {
            JobKind::Clustering => format!("{prefix}_bucluster"),
            JobKind::Processing | JobKind::Online => prefix,
        }
    }

    /// The (cpus, memory [MB]) this job requests.
    pub fn resources(&self) -> (Option<u32>, Option<u32>) {
        let get = |k: &str| self.commands.get(k).and_then(|v| v.parse().ok());
        (get("request_cpus"), get("request_memory"))
    }

    /// The job's command-line arguments, e.g. ` --verbose --sample-rate 256`.
    pub fn arguments(&self) -> String {
        let mut s = String::new();
        for (opt, value) in &self.options {
            if value.is_empty() {
                s.push_str(&format!(" --{opt}"));
            } else {
                s.push_str(&format!(" --{opt} {}", quote_arg(value)));
            }
        }
        s
    }

    /// Create the directory structure for this job and write out its files.
    /// This can only be done once.
    pub fn finalize(&mut self) -> Result<(), JobError> {
        if self.finalized.is_some() {
            return Err(JobError::AlreadyFinalized(self.name()));
        }
        debug!("Finalizing {} job {}", self.kind, self.name());

        let wd = self.wd();
        let log_dir = wd.join("logs");
        fs::create_dir_all(&log_dir).map_err(|e| JobError::CreateDir {
            path: log_dir.clone(),
            source: e,
        })?;

        let prefix = self.file_prefix();
        let stdout = log_dir.join(format!("{prefix}_output-$(Cluster).out"));
        let stderr = log_dir.join(format!("{prefix}_error-$(Cluster).err"));
        let log = log_dir.join(format!("{prefix}_log-$(Cluster).log"));

        // Jobs with a program configuration get their own copy of it, so that
        // later edits of the original don't change what's run.
        let config_file = match self.program_config.as_mut() {
            Some(config) => {
                let config_file = wd.join(format!("{prefix}_config.ini"));
                config.write(&config_file)?;
                Some(config_file)
            }
            None => None,
        };
        if let Some(config_file) = &config_file {
            self.add_opt("initialization-file", config_file.display().to_string());
        }

        let sub_file = wd.join(format!("{prefix}_submit.sub"));
        self.finalized = Some(FinalizedPaths {
            wd,
            stdout,
            stderr,
            log,
            sub_file: sub_file.clone(),
            config_file,
        });

        trace!("Writing {}", sub_file.display());
        fs::write(&sub_file, self.describe()).map_err(|e| JobError::Write {
            path: sub_file,
            source: e,
        })?;
        Ok(())
    }

    /// The HTCondor submit description of this job. Paths that are only
    /// known after finalizing are omitted until then.
    pub fn describe(&self) -> String {
        let mut lines = vec![
            format!("universe = {}", self.submit.universe()),
            format!("executable = {}", self.executable.display()),
            format!("arguments = \"{}\"", self.arguments().replace('"', "\"\"")),
        ];
        lines.extend(self.commands.iter().map(|(k, v)| format!("{k} = {v}")));
        lines.extend(
            self.submit
                .commands()
                .into_iter()
                .filter(|(k, _)| !self.commands.contains_key(k))
                .map(|(k, v)| format!("{k} = {v}")),
        );
        if let Some(paths) = &self.finalized {
            lines.push(format!("iwd = {}", paths.wd.display()));
            lines.push(format!("log = {}", paths.log.display()));
            lines.push(format!("error = {}", paths.stderr.display()));
            lines.push(format!("output = {}", paths.stdout.display()));
        }
        lines.push("notification = never".to_string());
        lines.push("queue 1".to_string());

        let mut s = lines.join("\n");
        s.push('\n');
        s
    }
}

/// Where the jobs of a channel live: `<root>/<instrument>/<subsystem>/<channel>`.
pub fn working_dir(root_dir: &Path, channel: &ChannelName) -> PathBuf {
    root_dir
        .join(&channel.instrument)
        .join(&channel.subsystem)
        .join(&channel.channel)
}

/// High-rate channels need more resources. Returns (cpus, memory [MB]).
pub(crate) fn resources_for_rate(sample_rate: u32) -> (u32, u32) {
    if sample_rate > HIGH_SAMPLE_RATE_THRESHOLD {
        (2, HIGH_MEMORY_MB)
    } else {
        (1, DEFAULT_MEMORY_MB)
    }
}

fn find_executable(name: &str, submit: &SubmitConfig) -> PathBuf {
    if let Some(dir) = submit.bin_dir() {
        return dir.join(name);
    }
    match which(name) {
        Some(p) => p,
        None => {
            format!("Couldn't find '{name}' in PATH; submit files will refer to it by name only")
                .warn();
            PathBuf::from(name)
        }
    }
}

/// HTCondor's "new" argument syntax: arguments containing whitespace are
/// wrapped in single quotes, and single quotes are doubled.
fn quote_arg(arg: &str) -> String {
    if arg.chars().any(char::is_whitespace) || arg.contains('\'') {
        format!("'{}'", arg.replace('\'', "''"))
    } else {
        arg.to_string()
    }
}
