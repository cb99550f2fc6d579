// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Talking to HTCondor through its command-line tools.
//!
//! A tool exiting with a non-zero code isn't treated as an error here; the
//! code and whatever the tool wrote to stderr are handed back to the caller
//! (and logged as a warning). Only failing to run a tool at all is an error.

mod error;

pub use error::CondorError;

use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use log::{debug, info, warn};
use regex::Regex;
use serde::Deserialize;
use strum_macros::Display;

use crate::{
    constants::{CONDOR_PID_FILE, DEFAULT_CONDOR_BIN_DIR},
    job::{Job, JobError},
};

lazy_static::lazy_static! {
    static ref CLUSTER_RE: Regex = Regex::new(r"submitted to cluster (\d+)").unwrap();
}

/// What happened when something was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// The exit code of `condor_submit` (-1 if it was killed by a signal).
    pub code: i32,

    /// The cluster ID, if the submission worked.
    pub cluster: Option<u64>,

    pub stderr: String,
}

impl SubmitOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// What happened when a job was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveOutcome {
    pub code: i32,
    pub stderr: String,
}

impl RemoveOutcome {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// HTCondor's job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum JobState {
    Idle,
    Running,
    Removed,
    Completed,
    Held,
    #[strum(serialize = "Transferring output")]
    TransferringOutput,
    Suspended,
    Unknown,
}

impl From<i32> for JobState {
    fn from(code: i32) -> Self {
        match code {
            1 => JobState::Idle,
            2 => JobState::Running,
            3 => JobState::Removed,
            4 => JobState::Completed,
            5 => JobState::Held,
            6 => JobState::TransferringOutput,
            7 => JobState::Suspended,
            _ => JobState::Unknown,
        }
    }
}

/// The parts of a `condor_q` job ClassAd that we care about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JobAd {
    pub cluster_id: u64,
    pub proc_id: u64,
    pub owner: String,
    pub job_status: i32,
    pub cmd: String,
    #[serde(default)]
    pub args: Option<String>,
    #[serde(default)]
    pub iwd: Option<PathBuf>,
}

impl JobAd {
    pub fn state(&self) -> JobState {
        JobState::from(self.job_status)
    }
}

/// The HTCondor command-line tools in a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condor {
    bin_dir: PathBuf,
}

impl Default for Condor {
    fn default() -> Self {
        Condor::new(DEFAULT_CONDOR_BIN_DIR)
    }
}

impl Condor {
    pub fn new<P: Into<PathBuf>>(bin_dir: P) -> Condor {
        Condor {
            bin_dir: bin_dir.into(),
        }
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    fn run<I, S>(&self, tool: &str, args: I) -> Result<Output, CondorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = self.bin_dir.join(tool);
        let mut cmd = Command::new(&program);
        cmd.args(args);
        debug!("Running {cmd:?}");
        let output = cmd.output().map_err(|e| CondorError::Spawn {
            program: program.clone(),
            source: e,
        })?;
        if !output.status.success() {
            warn!(
                "{tool} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output)
    }

    /// Submit a finalized job. If this works, the cluster ID is written to
    /// `condor.pid` in the job's working directory.
    pub fn submit(&self, job: &Job) -> Result<SubmitOutcome, CondorError> {
        let paths = job
            .finalized()
            .ok_or_else(|| JobError::NotFinalized(job.name()))?;
        let outcome = self.submit_file("condor_submit", &paths.sub_file)?;
        if let (true, Some(cluster)) = (outcome.success(), outcome.cluster) {
            let pid_file = paths.wd.join(CONDOR_PID_FILE);
            fs::write(&pid_file, format!("{cluster}\n"))?;
            info!("Submitted {} as cluster {cluster}", job.name());
        }
        Ok(outcome)
    }

    /// Submit a DAG file.
    pub fn submit_dag(&self, dag_file: &Path) -> Result<SubmitOutcome, CondorError> {
        let outcome = self.submit_file("condor_submit_dag", dag_file)?;
        if let Some(cluster) = outcome.cluster {
            info!("Submitted {} as cluster {cluster}", dag_file.display());
        }
        Ok(outcome)
    }

    fn submit_file(&self, tool: &str, file: &Path) -> Result<SubmitOutcome, CondorError> {
        let output = self.run(tool, [file])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let cluster = CLUSTER_RE
            .captures(&stdout)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok());
        Ok(SubmitOutcome {
            code: output.status.code().unwrap_or(-1),
            cluster,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Remove the job submitted from the working directory `wd`. If
    /// `cluster` isn't given, it's read from the `condor.pid` file in `wd`,
    /// which is deleted if the removal works.
    pub fn remove(&self, wd: &Path, cluster: Option<u64>) -> Result<RemoveOutcome, CondorError> {
        let pid_file = wd.join(CONDOR_PID_FILE);
        let cluster = match cluster {
            Some(c) => c,
            None => read_pid_file(&pid_file)?,
        };

        let output = self.run("condor_rm", [cluster.to_string()])?;
        let outcome = RemoveOutcome {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if outcome.success() {
            info!("Removed cluster {cluster}");
            if pid_file.exists() {
                fs::remove_file(&pid_file)?;
            }
        }
        Ok(outcome)
    }

    /// Get the jobs in the queue, optionally only those of `user`.
    pub fn query(&self, user: Option<&str>) -> Result<Vec<JobAd>, CondorError> {
        let mut args = vec!["-json"];
        args.extend(user);
        let output = self.run("condor_q", args)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        // condor_q prints nothing at all when there are no jobs.
        if stdout.trim().is_empty() {
            return Ok(vec![]);
        }
        Ok(serde_json::from_str(&stdout)?)
    }
}

fn read_pid_file(path: &Path) -> Result<u64, CondorError> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CondorError::NoPidFile {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    contents
        .trim()
        .parse()
        .map_err(|_| CondorError::BadPidFile {
            path: path.to_path_buf(),
            contents: contents.trim().to_string(),
        })
}
